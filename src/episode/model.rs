// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use url::Url;

use super::format::{format_duration, html_to_text};

/// A single playable podcast episode
///
/// Built by the API layer from a fetched record and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub id: String,
    pub title: String,
    /// Hosts and guests, as a single display string
    pub members: String,
    pub thumbnail: Option<Url>,
    /// Rich text description (HTML)
    pub description: String,
    /// Duration in seconds
    pub duration: u64,
    /// Playable media URL
    pub url: Url,
    pub published_at: DateTime<FixedOffset>,
}

impl Episode {
    /// Duration formatted as `HH:MM:SS`
    pub fn duration_label(&self) -> String {
        format_duration(self.duration)
    }

    /// Publication date formatted as `d Mon yy`, e.g. `8 Jan 21`
    pub fn published_label(&self) -> String {
        self.published_at.format("%-d %b %y").to_string()
    }

    /// Description with markup stripped, suitable for a terminal
    pub fn description_text(&self) -> String {
        html_to_text(&self.description)
    }
}
