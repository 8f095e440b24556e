//! Transport to the search endpoint.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{NewsdeskError, NewsdeskResult};
use crate::hit::SearchHit;
use crate::index::query::{SearchIndexResponse, SearchQuery};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Something that can run a search query against an index endpoint.
pub trait IndexClient {
    fn search(
        &self,
        endpoint: &Url,
        access_token: &str,
        query: &SearchQuery,
    ) -> impl Future<Output = NewsdeskResult<SearchIndexResponse>> + Send;
}

/// Posts queries as JSON with the session's bearer token.
#[derive(Clone)]
pub struct HttpIndexClient {
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

impl HttpIndexClient {
    pub fn new() -> NewsdeskResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpIndexClient { http })
    }
}

impl IndexClient for HttpIndexClient {
    async fn search(
        &self,
        endpoint: &Url,
        access_token: &str,
        query: &SearchQuery,
    ) -> NewsdeskResult<SearchIndexResponse> {
        let resp = self
            .http
            .post(endpoint.clone())
            .bearer_auth(access_token)
            .json(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, endpoint = %endpoint, "search index answered with failure status");
            return Ok(SearchIndexResponse::failed());
        }

        let body: SearchBody = resp.json().await.map_err(|e| {
            NewsdeskError::Index(format!("Failed to decode search response: {}", e))
        })?;

        Ok(SearchIndexResponse {
            ok: true,
            hits: body.hits,
        })
    }
}
