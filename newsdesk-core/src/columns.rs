//! Column model of the events table.
//!
//! Each column derives its value from a single hit; nothing here looks across
//! rows. Categorical columns can be filtered by a set of allowed values.
//! Turning values into terminal cells is left to the presentation layer, which
//! matches on [`ColumnKind`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{NewsdeskError, NewsdeskResult};
use crate::hit::SearchHit;
use crate::newsvalue::{FilterOption, Newsvalue, PlanningStatus, Visibility};
use crate::registry::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Visibility,
    Newsvalue,
    Title,
    Section,
    PlanningStatus,
    Time,
    Action,
}

/// Value a column extracts from a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    TimeSpan {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    /// The hit lacks the field.
    Missing,
    /// The column has no data of its own (actions).
    None,
}

impl ColumnValue {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) => ColumnValue::Text(v.to_string()),
            None => ColumnValue::Missing,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 7] = [
        ColumnKind::Visibility,
        ColumnKind::Newsvalue,
        ColumnKind::Title,
        ColumnKind::Section,
        ColumnKind::PlanningStatus,
        ColumnKind::Time,
        ColumnKind::Action,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ColumnKind::Visibility => "visibilityStatus",
            ColumnKind::Newsvalue => "newsvalue",
            ColumnKind::Title => "title",
            ColumnKind::Section => "section",
            ColumnKind::PlanningStatus => "planning_status",
            ColumnKind::Time => "event_time",
            ColumnKind::Action => "action",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Visibility => "Synlighet",
            ColumnKind::Newsvalue => "Nyhetsvärde",
            ColumnKind::Title => "Slugg",
            ColumnKind::Section => "Sektion",
            ColumnKind::PlanningStatus => "Planeringsstatus",
            ColumnKind::Time => "Tid",
            ColumnKind::Action => "Action",
        }
    }

    /// Look a column up by id, case-insensitively. A few shorter aliases are
    /// accepted for typing on the command line.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        match id.as_str() {
            "visibilitystatus" | "visibility" => Some(ColumnKind::Visibility),
            "newsvalue" => Some(ColumnKind::Newsvalue),
            "title" => Some(ColumnKind::Title),
            "section" => Some(ColumnKind::Section),
            "planning_status" | "planning" => Some(ColumnKind::PlanningStatus),
            "event_time" | "time" => Some(ColumnKind::Time),
            "action" => Some(ColumnKind::Action),
            _ => None,
        }
    }

    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            ColumnKind::Visibility
                | ColumnKind::Newsvalue
                | ColumnKind::Section
                | ColumnKind::PlanningStatus
        )
    }

    pub fn value(self, hit: &SearchHit) -> ColumnValue {
        match self {
            ColumnKind::Visibility => ColumnValue::text(hit.visibility()),
            ColumnKind::Newsvalue => ColumnValue::text(hit.newsvalue()),
            ColumnKind::Title => ColumnValue::text(hit.title()),
            ColumnKind::Section => ColumnValue::text(hit.section_title()),
            ColumnKind::PlanningStatus => {
                let status = if hit.is_planned() {
                    PlanningStatus::Planned
                } else {
                    PlanningStatus::Unplanned
                };
                ColumnValue::Text(status.value().to_string())
            }
            ColumnKind::Time => ColumnValue::TimeSpan {
                start: hit.source.starts.first().copied(),
                end: hit.source.ends.first().copied(),
            },
            ColumnKind::Action => ColumnValue::None,
        }
    }

    /// Set membership of the column's value. Non-categorical columns accept
    /// every hit; a missing value never matches.
    pub fn matches(self, hit: &SearchHit, allowed: &HashSet<String>) -> bool {
        if !self.is_categorical() {
            return true;
        }

        self.value(hit)
            .as_text()
            .is_some_and(|value| allowed.contains(value))
    }
}

/// A column together with the options its filter offers.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub kind: ColumnKind,
    pub options: Vec<FilterOption>,
}

/// Columns of the events table, in display order.
///
/// Section options come from the known sections and use the title as value,
/// matching how events reference their section.
pub fn event_table_columns(sections: &[Section]) -> Vec<Column> {
    ColumnKind::ALL
        .iter()
        .map(|&kind| {
            let options = match kind {
                ColumnKind::Visibility => Visibility::options(),
                ColumnKind::Newsvalue => Newsvalue::options(),
                ColumnKind::Section => sections
                    .iter()
                    .map(|s| FilterOption::new(s.title.clone(), s.title.clone()))
                    .collect(),
                ColumnKind::PlanningStatus => PlanningStatus::options(),
                ColumnKind::Title | ColumnKind::Time | ColumnKind::Action => Vec::new(),
            };
            Column { kind, options }
        })
        .collect()
}

/// Allowed values per categorical column. A hit passes when it matches every
/// filtered column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFilter {
    filters: HashMap<ColumnKind, HashSet<String>>,
}

impl TableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn allow<I, S>(&mut self, kind: ColumnKind, values: I) -> NewsdeskResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !kind.is_categorical() {
            return Err(NewsdeskError::Filter(format!(
                "column '{}' cannot be filtered",
                kind.id()
            )));
        }

        self.filters
            .entry(kind)
            .or_default()
            .extend(values.into_iter().map(Into::into));

        Ok(())
    }

    /// Add a filter written as `column=value1,value2`.
    pub fn add_arg(&mut self, arg: &str) -> NewsdeskResult<()> {
        let (column, values) = arg.split_once('=').ok_or_else(|| {
            NewsdeskError::Filter(format!("expected column=value[,value], got '{}'", arg))
        })?;

        let kind = ColumnKind::from_id(column)
            .ok_or_else(|| NewsdeskError::Filter(format!("unknown column '{}'", column)))?;

        let values: Vec<&str> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            return Err(NewsdeskError::Filter(format!(
                "no values given for column '{}'",
                kind.id()
            )));
        }

        self.allow(kind, values)
    }

    pub fn matches(&self, hit: &SearchHit) -> bool {
        self.filters
            .iter()
            .all(|(kind, allowed)| kind.matches(hit, allowed))
    }

    pub fn apply<'a>(&self, hits: &'a [SearchHit]) -> Vec<&'a SearchHit> {
        hits.iter().filter(|hit| self.matches(hit)).collect()
    }
}
