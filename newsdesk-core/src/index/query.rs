//! Query and response bodies exchanged with the search endpoint.

use serde::{Deserialize, Serialize};

use crate::hit::SearchHit;

/// Most hits a single window query asks for.
pub const PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub size: usize,
    #[serde(rename = "where")]
    pub filter: WhereClause,
    pub sort: SortClause,
}

/// Occurrence bounds as UTC ISO strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClause {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub start: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SearchQuery {
    /// Events with an occurrence between `start` and `end`, earliest first.
    pub fn events_between(start: impl Into<String>, end: impl Into<String>) -> Self {
        SearchQuery {
            size: PAGE_SIZE,
            filter: WhereClause {
                start: start.into(),
                end: end.into(),
            },
            sort: SortClause {
                start: SortOrder::Asc,
            },
        }
    }
}

/// Outcome of a search call. `ok` is false when the endpoint answered with a
/// failure status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexResponse {
    pub ok: bool,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

impl SearchIndexResponse {
    pub fn failed() -> Self {
        SearchIndexResponse {
            ok: false,
            hits: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_serializes_to_wire_shape() {
        let query = SearchQuery::events_between("2024-03-01T00:00:00.000Z", "2024-03-03T00:00:00.000Z");

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({
                "size": 500,
                "where": {
                    "start": "2024-03-01T00:00:00.000Z",
                    "end": "2024-03-03T00:00:00.000Z"
                },
                "sort": { "start": "asc" }
            })
        );
    }

    #[test]
    fn response_without_hits_decodes_empty() {
        let response: SearchIndexResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(response.ok);
        assert!(response.hits.is_empty());
    }
}
