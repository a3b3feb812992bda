// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixtures shared by unit tests across modules

use chrono::DateTime;
use url::Url;

use crate::episode::Episode;

pub fn make_episode(id: &str) -> Episode {
    make_episode_with_duration(id, 600)
}

pub fn make_episode_with_duration(id: &str, duration: u64) -> Episode {
    Episode {
        id: id.to_string(),
        title: format!("Episode {id}"),
        members: "Diego Fernandes".to_string(),
        thumbnail: None,
        description: "<p>Description</p>".to_string(),
        duration,
        url: Url::parse(&format!("https://example.com/{id}.m4a")).unwrap(),
        published_at: DateTime::parse_from_rfc3339("2021-01-22T18:00:00+00:00").unwrap(),
    }
}

pub fn make_episodes(ids: &[&str]) -> Vec<Episode> {
    ids.iter().map(|id| make_episode(id)).collect()
}
