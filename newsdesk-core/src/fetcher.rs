//! Window-bounded event search with caching.
//!
//! The query URL (index endpoint plus `start`/`end` parameters) is both the
//! cache key and the single source of the boundaries sent to the index.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use url::Url;

use crate::aggregate::{BucketedResult, aggregate};
use crate::cache::{CachePolicy, Cached, Load, SwrCache};
use crate::error::{NewsdeskError, NewsdeskResult};
use crate::hit::parse_timestamp;
use crate::index::{IndexClient, SearchQuery};
use crate::session::SessionState;
use crate::window::Window;

/// Bucketed events, or `None` when there is nothing to render.
pub type EventsByDate = Option<BucketedResult>;

pub struct EventsFetcher<C> {
    client: C,
    index_url: Url,
    cache: SwrCache<EventsByDate>,
}

impl<C: IndexClient> EventsFetcher<C> {
    pub fn new(client: C, index_url: Url, policy: CachePolicy) -> Self {
        EventsFetcher {
            client,
            index_url,
            cache: SwrCache::new(policy),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &SwrCache<EventsByDate> {
        &self.cache
    }

    /// Cache key for a window: the endpoint with UTC `start` and `end`
    /// replacing any query string it had.
    pub fn search_url(&self, window: &Window) -> Url {
        let mut url = self.index_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("start", &iso_utc(window.start_time))
            .append_pair("end", &iso_utc(window.end_time));
        url
    }

    /// Load the events of `window`, bucketed by day in `tz`.
    pub async fn load(
        &self,
        session: &SessionState,
        window: &Window,
        tz: Tz,
    ) -> Load<Cached<EventsByDate>> {
        self.load_url(session, self.search_url(window), tz).await
    }

    /// Load by an already derived query URL.
    pub async fn load_url(
        &self,
        session: &SessionState,
        url: Url,
        tz: Tz,
    ) -> Load<Cached<EventsByDate>> {
        self.cache
            .load(url.as_str(), || self.fetch(session, &url, tz))
            .await
    }

    async fn fetch(&self, session: &SessionState, url: &Url, tz: Tz) -> NewsdeskResult<EventsByDate> {
        let Some(access_token) = session.access_token() else {
            tracing::debug!("not authenticated, skipping search");
            return Ok(None);
        };

        let window = window_from_url(url)?;
        let query = SearchQuery::events_between(
            iso_utc(window.start_time),
            iso_utc(window.end_time),
        );

        tracing::info!(start = %query.filter.start, end = %query.filter.end, "searching events");
        let response = self
            .client
            .search(&self.index_url, access_token, &query)
            .await?;

        if !response.ok {
            tracing::warn!(url = %url, "search was not ok, nothing to show");
            return Ok(None);
        }
        if response.hits.is_empty() {
            return Ok(None);
        }

        Ok(Some(aggregate(
            &response.hits,
            window.start_time,
            window.end_time,
            tz,
        )))
    }
}

/// Read the boundaries back out of a query URL. A missing or unparseable
/// boundary is an error, so no malformed query is ever sent.
pub fn window_from_url(url: &Url) -> NewsdeskResult<Window> {
    let param = |name: &str| -> NewsdeskResult<DateTime<Utc>> {
        let raw = url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| NewsdeskError::InvalidWindow(format!("{} can't be null", name)))?;

        parse_timestamp(&raw).ok_or_else(|| {
            NewsdeskError::InvalidWindow(format!("{} '{}' is not a timestamp", name, raw))
        })
    };

    Window::new(param("start")?, param("end")?)
}

/// `2024-03-01T00:00:00.000Z`
fn iso_utc(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::{EventSource, SearchHit};
    use crate::index::SearchIndexResponse;
    use crate::session::Session;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockIndex {
        response: SearchIndexResponse,
        calls: AtomicUsize,
        last_query: Mutex<Option<(String, SearchQuery)>>,
    }

    impl MockIndex {
        fn answering(response: SearchIndexResponse) -> Self {
            MockIndex {
                response,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl IndexClient for MockIndex {
        async fn search(
            &self,
            _endpoint: &Url,
            access_token: &str,
            query: &SearchQuery,
        ) -> NewsdeskResult<SearchIndexResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock() = Some((access_token.to_string(), query.clone()));
            Ok(self.response.clone())
        }
    }

    fn hit(id: &str, starts: &[&str]) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            source: EventSource {
                starts: starts.iter().map(|s| parse_timestamp(s).unwrap()).collect(),
                ..EventSource::default()
            },
            related_plannings: None,
        }
    }

    fn fetcher(response: SearchIndexResponse) -> EventsFetcher<MockIndex> {
        EventsFetcher::new(
            MockIndex::answering(response),
            Url::parse("https://index.example.com/events?stale=1").unwrap(),
            CachePolicy {
                max_age: Duration::from_secs(60),
                ..CachePolicy::default()
            },
        )
    }

    fn window() -> Window {
        Window::new(
            parse_timestamp("2024-03-01T00:00Z").unwrap(),
            parse_timestamp("2024-03-03T00:00Z").unwrap(),
        )
        .unwrap()
    }

    fn signed_in() -> SessionState {
        SessionState::authenticated(Session::new("secret", None))
    }

    fn data(load: Load<Cached<EventsByDate>>) -> EventsByDate {
        match load {
            Load::Ready(Ok(data)) => data,
            Load::Ready(Err(e)) => panic!("unexpected error: {e}"),
            Load::Superseded => panic!("unexpected supersede"),
        }
    }

    #[test]
    fn search_url_replaces_query_with_boundaries() {
        let fetcher = fetcher(SearchIndexResponse::failed());

        assert_eq!(
            fetcher.search_url(&window()).as_str(),
            "https://index.example.com/events?start=2024-03-01T00%3A00%3A00.000Z&end=2024-03-03T00%3A00%3A00.000Z"
        );
    }

    #[test]
    fn window_round_trips_through_url() {
        let fetcher = fetcher(SearchIndexResponse::failed());
        let url = fetcher.search_url(&window());

        assert_eq!(window_from_url(&url).unwrap(), window());
    }

    #[tokio::test]
    async fn fetches_and_buckets_events() {
        let fetcher = fetcher(SearchIndexResponse {
            ok: true,
            hits: vec![
                hit("hit1", &["2024-03-01T10:00Z"]),
                hit("hit2", &["2024-03-02T23:30Z", "2024-02-28T00:00Z"]),
                hit("outside", &["2024-01-01T00:00Z"]),
            ],
        });

        let result = data(fetcher.load(&signed_in(), &window(), Tz::UTC).await).unwrap();

        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["2024-03-01", "2024-03-02"]);
        assert_eq!(result.get("2024-03-01").unwrap()[0].id, "hit1");
        assert_eq!(result.get("2024-03-02").unwrap()[0].id, "hit2");
        assert_eq!(result.hit_count(), 2);

        let (token, query) = fetcher.client().last_query.lock().clone().unwrap();
        assert_eq!(token, "secret");
        assert_eq!(query, SearchQuery::events_between("2024-03-01T00:00:00.000Z", "2024-03-03T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn same_window_is_served_from_cache() {
        let fetcher = fetcher(SearchIndexResponse {
            ok: true,
            hits: vec![hit("hit1", &["2024-03-01T10:00Z"])],
        });

        data(fetcher.load(&signed_in(), &window(), Tz::UTC).await);
        data(fetcher.load(&signed_in(), &window(), Tz::UTC).await);
        assert_eq!(fetcher.client().calls(), 1);

        let next = Window::from_days(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 2, Tz::UTC).unwrap();
        data(fetcher.load(&signed_in(), &next, Tz::UTC).await);
        assert_eq!(fetcher.client().calls(), 2);
    }

    #[tokio::test]
    async fn unauthenticated_is_no_data_without_request() {
        let fetcher = fetcher(SearchIndexResponse {
            ok: true,
            hits: vec![hit("hit1", &["2024-03-01T10:00Z"])],
        });

        let result = data(
            fetcher
                .load(&SessionState::unauthenticated(), &window(), Tz::UTC)
                .await,
        );

        assert_eq!(result, None);
        assert_eq!(fetcher.client().calls(), 0);
    }

    #[tokio::test]
    async fn expired_session_is_no_data_without_request() {
        let fetcher = fetcher(SearchIndexResponse {
            ok: true,
            hits: vec![hit("hit1", &["2024-03-01T10:00Z"])],
        });
        let expired = SessionState::authenticated(Session::new(
            "secret",
            Some(Utc::now() - chrono::Duration::minutes(1)),
        ));

        let result = data(fetcher.load(&expired, &window(), Tz::UTC).await);

        assert_eq!(result, None);
        assert_eq!(fetcher.client().calls(), 0);
    }

    #[tokio::test]
    async fn failed_response_is_no_data() {
        let fetcher = fetcher(SearchIndexResponse::failed());

        let result = data(fetcher.load(&signed_in(), &window(), Tz::UTC).await);

        assert_eq!(result, None);
        assert_eq!(fetcher.client().calls(), 1);
    }

    #[tokio::test]
    async fn zero_hits_is_no_data() {
        let fetcher = fetcher(SearchIndexResponse {
            ok: true,
            hits: vec![],
        });

        assert_eq!(data(fetcher.load(&signed_in(), &window(), Tz::UTC).await), None);
    }

    #[tokio::test]
    async fn missing_boundary_fails_before_request() {
        let fetcher = fetcher(SearchIndexResponse::failed());
        let url = Url::parse("https://index.example.com/events?start=2024-03-01T00%3A00%3A00.000Z").unwrap();

        let load = fetcher.load_url(&signed_in(), url, Tz::UTC).await;

        let Load::Ready(Err(err)) = load else {
            panic!("expected error");
        };
        assert!(matches!(err.as_ref(), NewsdeskError::InvalidWindow(msg) if msg.contains("end")));
        assert_eq!(fetcher.client().calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_boundary_fails_before_request() {
        let fetcher = fetcher(SearchIndexResponse::failed());
        let url = Url::parse("https://index.example.com/events?start=yesterday&end=today").unwrap();

        let load = fetcher.load_url(&signed_in(), url, Tz::UTC).await;

        assert!(matches!(load, Load::Ready(Err(_))));
        assert_eq!(fetcher.client().calls(), 0);
    }
}
