// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::{debug, info};
use url::Url;

use crate::episode::Episode;
use crate::error::ApiError;
use crate::http::{HttpClient, HttpResponse};

use super::parse::{parse_episode, parse_episode_list};

/// Sort direction for episode listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Pagination and sorting for episode listings
#[derive(Debug, Clone)]
pub struct EpisodeQuery {
    /// Maximum number of episodes to return (None = server default)
    pub limit: Option<usize>,
    /// Field to sort by
    pub sort: String,
    pub order: SortOrder,
}

impl Default for EpisodeQuery {
    fn default() -> Self {
        Self {
            limit: None,
            sort: "published_at".to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// Build the listing URL, e.g. `{base}/episodes?_limit=12&_sort=published_at&_order=desc`
pub fn episodes_url(base_url: &Url, query: &EpisodeQuery) -> Result<Url, ApiError> {
    let mut url = with_path(base_url, &["episodes"])?;

    {
        let mut pairs = url.query_pairs_mut();
        if let Some(limit) = query.limit {
            pairs.append_pair("_limit", &limit.to_string());
        }
        pairs.append_pair("_sort", &query.sort);
        pairs.append_pair("_order", query.order.as_str());
    }

    Ok(url)
}

/// Build the detail URL `{base}/episodes/{id}`
pub fn episode_url(base_url: &Url, id: &str) -> Result<Url, ApiError> {
    with_path(base_url, &["episodes", id])
}

fn with_path(base_url: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base_url.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn get<C: HttpClient>(client: &C, url: &Url) -> Result<HttpResponse, ApiError> {
    debug!(%url, "GET");
    client
        .get(url.as_str())
        .await
        .map_err(|e| ApiError::FetchFailed {
            url: url.to_string(),
            source: e,
        })
}

/// Fetch an episode listing
pub async fn fetch_episodes<C: HttpClient>(
    client: &C,
    base_url: &Url,
    query: &EpisodeQuery,
) -> Result<Vec<Episode>, ApiError> {
    let url = episodes_url(base_url, query)?;
    let response = get(client, &url).await?;

    if !response.is_success() {
        return Err(ApiError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let episodes = parse_episode_list(&response.body)?;
    info!(count = episodes.len(), "Fetched episodes");
    Ok(episodes)
}

/// Fetch a single episode by id
pub async fn fetch_episode<C: HttpClient>(
    client: &C,
    base_url: &Url,
    id: &str,
) -> Result<Episode, ApiError> {
    let url = episode_url(base_url, id)?;
    let response = get(client, &url).await?;

    match response.status {
        404 => Err(ApiError::NotFound { id: id.to_string() }),
        _ if !response.is_success() => Err(ApiError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        }),
        _ => parse_episode(&response.body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    struct MockHttpClient {
        status: u16,
        body: String,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from(self.body.clone()),
            })
        }
    }

    const EPISODE_JSON: &str = r#"{
      "id": "ep-1",
      "title": "Episode 1",
      "members": "Host",
      "published_at": "2021-01-22 18:00:00",
      "thumbnail": "https://example.com/ep1.jpg",
      "description": "<p>First</p>",
      "file": { "url": "https://example.com/ep1.m4a", "duration": 120 }
    }"#;

    fn base() -> Url {
        Url::parse("http://localhost:3333").unwrap()
    }

    #[test]
    fn episodes_url_includes_query_parameters() {
        let query = EpisodeQuery {
            limit: Some(12),
            ..Default::default()
        };

        let url = episodes_url(&base(), &query).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:3333/episodes?_limit=12&_sort=published_at&_order=desc"
        );
    }

    #[test]
    fn episodes_url_omits_missing_limit() {
        let query = EpisodeQuery {
            order: SortOrder::Asc,
            ..Default::default()
        };

        let url = episodes_url(&base(), &query).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:3333/episodes?_sort=published_at&_order=asc"
        );
    }

    #[test]
    fn urls_keep_base_path() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();

        let url = episode_url(&base, "ep-1").unwrap();

        assert_eq!(url.as_str(), "https://api.example.com/v1/episodes/ep-1");
    }

    #[test]
    fn episode_url_escapes_id() {
        let url = episode_url(&base(), "a/b c").unwrap();

        assert_eq!(url.as_str(), "http://localhost:3333/episodes/a%2Fb%20c");
    }

    #[test]
    fn cannot_be_a_base_url_is_rejected() {
        let base = Url::parse("mailto:someone@example.com").unwrap();

        assert!(matches!(
            episode_url(&base, "x"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn fetch_episodes_parses_listing() {
        let client = MockHttpClient::new(200, &format!("[{EPISODE_JSON}]"));
        let query = EpisodeQuery {
            limit: Some(2),
            ..Default::default()
        };

        let episodes = fetch_episodes(&client, &base(), &query).await.unwrap();

        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].id, "ep-1");
        assert_eq!(
            client.requested(),
            vec!["http://localhost:3333/episodes?_limit=2&_sort=published_at&_order=desc"]
        );
    }

    #[tokio::test]
    async fn fetch_episodes_fails_on_http_error() {
        let client = MockHttpClient::new(500, "oops");

        let result = fetch_episodes(&client, &base(), &EpisodeQuery::default()).await;

        match result {
            Err(ApiError::HttpStatus { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_episode_parses_detail() {
        let client = MockHttpClient::new(200, EPISODE_JSON);

        let episode = fetch_episode(&client, &base(), "ep-1").await.unwrap();

        assert_eq!(episode.title, "Episode 1");
        assert_eq!(episode.duration, 120);
        assert_eq!(client.requested(), vec!["http://localhost:3333/episodes/ep-1"]);
    }

    #[tokio::test]
    async fn fetch_episode_maps_404_to_not_found() {
        let client = MockHttpClient::new(404, "{}");

        let result = fetch_episode(&client, &base(), "missing").await;

        match result {
            Err(ApiError::NotFound { id }) => assert_eq!(id, "missing"),
            other => panic!("Expected NotFound error, got {other:?}"),
        }
    }
}
