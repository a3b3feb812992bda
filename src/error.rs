// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors that can occur when fetching or parsing episodes from the API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Episode '{id}' not found")]
    NotFound { id: String },

    #[error("Failed to parse episode JSON: {source}")]
    ParseFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse date '{date_str}': {reason}")]
    InvalidDate { date_str: String, reason: String },

    #[error("Invalid episode duration '{value}'")]
    InvalidDuration { value: String },

    #[error("Episode '{title}' has an invalid media URL '{url}'")]
    InvalidMediaUrl { title: String, url: String },
}

/// Errors returned by queue operations that take caller-supplied indices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("Cannot play an empty episode list")]
    EmptyQueue,

    #[error("Episode index {index} is out of bounds for a queue of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}
