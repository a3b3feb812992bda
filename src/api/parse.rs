// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::episode::Episode;
use crate::error::ApiError;

/// Episode record as served by the API
#[derive(Debug, Deserialize)]
struct EpisodeRecord {
    id: String,
    title: String,
    #[serde(default)]
    members: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    description: String,
    published_at: String,
    file: FileRecord,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    url: String,
    duration: RawDuration,
}

/// Durations show up as integers, floats, or numeric strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Fractional(f64),
    Text(String),
}

/// Parse a single episode record
pub fn parse_episode(json: &[u8]) -> Result<Episode, ApiError> {
    let record: EpisodeRecord =
        serde_json::from_slice(json).map_err(|e| ApiError::ParseFailed { source: e })?;
    into_episode(record)
}

/// Parse an episode listing
///
/// Records that cannot be turned into a valid episode are skipped; only a
/// body that is not a JSON array fails the whole listing.
pub fn parse_episode_list(json: &[u8]) -> Result<Vec<Episode>, ApiError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_slice(json).map_err(|e| ApiError::ParseFailed { source: e })?;

    let episodes = values
        .into_iter()
        .filter_map(|value| {
            let parsed = serde_json::from_value::<EpisodeRecord>(value)
                .map_err(|e| ApiError::ParseFailed { source: e })
                .and_then(into_episode);

            match parsed {
                Ok(episode) => Some(episode),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed episode record");
                    None
                }
            }
        })
        .collect();

    Ok(episodes)
}

fn into_episode(record: EpisodeRecord) -> Result<Episode, ApiError> {
    let url = Url::parse(&record.file.url).map_err(|_| ApiError::InvalidMediaUrl {
        title: record.title.clone(),
        url: record.file.url.clone(),
    })?;

    let duration = parse_duration(record.file.duration)?;
    let published_at = parse_published_at(&record.published_at)?;

    let thumbnail = record
        .thumbnail
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| match Url::parse(&s) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(thumbnail = %s, error = %e, "Ignoring invalid thumbnail URL");
                None
            }
        });

    Ok(Episode {
        id: record.id,
        title: record.title,
        members: record.members,
        thumbnail,
        description: record.description,
        duration,
        url,
        published_at,
    })
}

fn parse_duration(raw: RawDuration) -> Result<u64, ApiError> {
    let seconds = match raw {
        RawDuration::Seconds(seconds) => return Ok(seconds),
        RawDuration::Fractional(seconds) => Some(seconds),
        RawDuration::Text(ref text) => text.trim().parse::<f64>().ok(),
    };

    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => Ok(s.floor() as u64),
        _ => Err(ApiError::InvalidDuration {
            value: match raw {
                RawDuration::Text(text) => text,
                RawDuration::Fractional(f) => f.to_string(),
                RawDuration::Seconds(s) => s.to_string(),
            },
        }),
    }
}

/// Parse a publication timestamp
///
/// Accepts RFC 3339 and the zone-less `YYYY-MM-DD HH:MM:SS` form, which is
/// taken as UTC.
pub fn parse_published_at(date_str: &str) -> Result<DateTime<FixedOffset>, ApiError> {
    let trimmed = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    let formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    let mut last_error = None;

    for format in formats {
        match NaiveDateTime::parse_from_str(trimmed, format) {
            Ok(naive) => return Ok(naive.and_utc().fixed_offset()),
            Err(e) => last_error = Some(e),
        }
    }

    Err(ApiError::InvalidDate {
        date_str: date_str.to_string(),
        reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}
