//! Groups search hits into calendar-day buckets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::hit::SearchHit;

/// Hits grouped by the `YYYY-MM-DD` date of their first in-window occurrence.
///
/// Keys iterate in ascending order, which for this format is chronological.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketedResult {
    buckets: BTreeMap<String, Vec<SearchHit>>,
}

impl BucketedResult {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[SearchHit]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SearchHit])> {
        self.buckets
            .iter()
            .map(|(key, hits)| (key.as_str(), hits.as_slice()))
    }

    /// Total number of hits across all buckets.
    pub fn hit_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    fn push(&mut self, key: String, hit: SearchHit) {
        self.buckets.entry(key).or_default().push(hit);
    }
}

/// Bucket each hit by the earliest of its occurrence starts inside
/// `[start_time, end_time]`, both ends included, as a calendar date in `tz`.
///
/// A hit whose occurrences all fall outside the window is left out. Within a
/// bucket hits keep their input order.
pub fn aggregate(
    hits: &[SearchHit],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    tz: Tz,
) -> BucketedResult {
    let mut result = BucketedResult::default();

    for hit in hits {
        // Recurring events carry occurrences outside the window too
        let earliest = hit
            .source
            .starts
            .iter()
            .filter(|t| start_time <= **t && **t <= end_time)
            .min();

        let Some(earliest) = earliest else {
            tracing::debug!(hit = %hit.id, "no occurrence inside window, skipping");
            continue;
        };

        let key = bucket_key(*earliest, tz);
        result.push(key, hit.clone());
    }

    result
}

/// Calendar date of `t` in `tz`, formatted `YYYY-MM-DD`.
pub fn bucket_key(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format("%Y-%m-%d").to_string()
}
