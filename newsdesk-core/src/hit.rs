//! Typed search-index records.
//!
//! The index flattens every document into dotted field paths holding lists of
//! values. Known paths are mapped onto named fields here so callers never look
//! fields up by string, and timestamps are parsed once when a hit is
//! deserialized. An occurrence whose timestamps do not parse is dropped from
//! its hit; the rest of the hit and every other hit are kept.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record returned by the search index.
///
/// Several hits may describe the same logical event when the source document
/// has more than one occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSearchHit")]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_source", default)]
    pub source: EventSource,

    /// Planning items referencing this event, attached by the index.
    #[serde(
        rename = "_relatedPlannings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub related_plannings: Option<Vec<RelatedPlanning>>,
}

/// Indexed fields of an event document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventSource {
    #[serde(rename = "document.title")]
    pub title: Vec<String>,

    /// Start of every occurrence, paired by position with `ends`.
    #[serde(rename = "document.meta.core_event.data.start")]
    pub starts: Vec<DateTime<Utc>>,

    #[serde(rename = "document.meta.core_event.data.end")]
    pub ends: Vec<DateTime<Utc>>,

    #[serde(rename = "document.rel.section.title")]
    pub section_title: Vec<String>,

    #[serde(rename = "document.meta.core_newsvalue.value")]
    pub newsvalue: Vec<String>,

    // core_event.data.public is not indexed, the description role stands in for it
    #[serde(rename = "document.meta.core_description.role")]
    pub description_role: Vec<String>,

    #[serde(rename = "document.meta.tt_slugline.value")]
    pub slugline: Vec<String>,
}

/// A planning item related to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedPlanning {
    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One scheduled instance of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl SearchHit {
    pub fn title(&self) -> Option<&str> {
        self.source.title.first().map(String::as_str)
    }

    pub fn slugline(&self) -> Option<&str> {
        self.source.slugline.first().map(String::as_str)
    }

    pub fn section_title(&self) -> Option<&str> {
        self.source.section_title.first().map(String::as_str)
    }

    pub fn newsvalue(&self) -> Option<&str> {
        self.source.newsvalue.first().map(String::as_str)
    }

    pub fn visibility(&self) -> Option<&str> {
        self.source.description_role.first().map(String::as_str)
    }

    /// Start/end pairs in index order. An occurrence without a matching end
    /// entry keeps its start.
    pub fn occurrences(&self) -> Vec<Occurrence> {
        self.source
            .starts
            .iter()
            .enumerate()
            .map(|(i, start)| Occurrence {
                start: *start,
                end: self.source.ends.get(i).copied(),
            })
            .collect()
    }

    /// True when the index attached at least one related planning item.
    pub fn is_planned(&self) -> bool {
        self.related_plannings
            .as_ref()
            .is_some_and(|plannings| !plannings.is_empty())
    }

    pub fn first_planning(&self) -> Option<&RelatedPlanning> {
        self.related_plannings.as_ref()?.first()
    }
}

/// Parse an index timestamp.
///
/// Accepts RFC 3339 as well as the minute-precision UTC form
/// (`2024-03-01T10:00Z`) some documents carry.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = s.strip_suffix('Z') {
        for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
                return Some(dt.and_utc());
            }
        }
        return None;
    }

    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A hit as it comes off the wire, timestamps still unparsed.
#[derive(Deserialize)]
struct RawSearchHit {
    #[serde(rename = "_id")]
    id: String,

    #[serde(rename = "_source", default)]
    source: RawEventSource,

    #[serde(rename = "_relatedPlannings", default)]
    related_plannings: Option<Vec<RelatedPlanning>>,
}

#[derive(Default, Deserialize)]
struct RawEventSource {
    #[serde(rename = "document.title", default)]
    title: Vec<String>,
    #[serde(rename = "document.meta.core_event.data.start", default)]
    starts: Vec<String>,
    #[serde(rename = "document.meta.core_event.data.end", default)]
    ends: Vec<String>,
    #[serde(rename = "document.rel.section.title", default)]
    section_title: Vec<String>,
    #[serde(rename = "document.meta.core_newsvalue.value", default)]
    newsvalue: Vec<String>,
    #[serde(rename = "document.meta.core_description.role", default)]
    description_role: Vec<String>,
    #[serde(rename = "document.meta.tt_slugline.value", default)]
    slugline: Vec<String>,
}

impl From<RawSearchHit> for SearchHit {
    fn from(raw: RawSearchHit) -> Self {
        let (starts, ends) = parse_occurrences(&raw.id, &raw.source.starts, &raw.source.ends);
        let source = raw.source;

        SearchHit {
            id: raw.id,
            source: EventSource {
                title: source.title,
                starts,
                ends,
                section_title: source.section_title,
                newsvalue: source.newsvalue,
                description_role: source.description_role,
                slugline: source.slugline,
            },
            related_plannings: raw.related_plannings,
        }
    }
}

/// Parse start/end pairs, dropping any occurrence with an unparseable start
/// or end. Ends stay a prefix of starts so positions keep pairing up.
fn parse_occurrences(
    id: &str,
    raw_starts: &[String],
    raw_ends: &[String],
) -> (Vec<DateTime<Utc>>, Vec<DateTime<Utc>>) {
    let mut starts = Vec::with_capacity(raw_starts.len());
    let mut ends = Vec::with_capacity(raw_ends.len());

    for (i, raw_start) in raw_starts.iter().enumerate() {
        let raw_end = raw_ends.get(i);

        match (parse_timestamp(raw_start), raw_end.map(|e| parse_timestamp(e))) {
            (Some(start), None) => starts.push(start),
            (Some(start), Some(Some(end))) => {
                starts.push(start);
                ends.push(end);
            }
            _ => {
                tracing::debug!(
                    hit = %id,
                    start = %raw_start,
                    end = ?raw_end,
                    "unparseable occurrence, dropping"
                );
            }
        }
    }

    (starts, ends)
}
