//! Terminal rendering of the events grid and the events table.
//!
//! Core types only derive values; this module decides how each column kind
//! and each day column looks. Text is padded to its width before it is
//! colored so ANSI codes never break the alignment.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use newsdesk_core::aggregate::{BucketedResult, bucket_key};
use newsdesk_core::columns::{Column, ColumnKind, ColumnValue};
use newsdesk_core::grid::GridSize;
use newsdesk_core::hit::SearchHit;
use newsdesk_core::newsvalue::{Newsvalue, PlanningStatus, Visibility};
use owo_colors::OwoColorize;

/// Width of one day column in the grid.
const GRID_COLUMN_WIDTH: usize = 30;
const GRID_GUTTER: &str = "  ";

/// Entries of the row action menu. Editing happens in the web client.
const ACTION_MENU: [&str; 2] = ["Redigera", "Ta bort"];

/// Render bucketed events as `size` side-by-side day columns.
pub fn render_grid(buckets: &BucketedResult, size: GridSize, tz: Tz) -> String {
    let mut columns: Vec<Vec<String>> = buckets
        .iter()
        .map(|(key, hits)| render_grid_column(key, hits, tz))
        .collect();

    // An empty result still reserves its one column
    while columns.len() < size.get() {
        columns.push(vec![fit("", GRID_COLUMN_WIDTH)]);
    }

    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    let blank = fit("", GRID_COLUMN_WIDTH);

    (0..height)
        .map(|row| {
            columns
                .iter()
                .map(|column| column.get(row).unwrap_or(&blank).as_str())
                .collect::<Vec<_>>()
                .join(GRID_GUTTER)
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_grid_column(key: &str, hits: &[SearchHit], tz: Tz) -> Vec<String> {
    let mut lines = vec![
        fit(&date_label(key), GRID_COLUMN_WIDTH).bold().to_string(),
        "─".repeat(GRID_COLUMN_WIDTH).dimmed().to_string(),
    ];

    for hit in hits {
        let time = start_on_day(hit, key, tz)
            .map(|t| t.with_timezone(&tz).format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let title = hit.title().unwrap_or("(utan titel)");
        let line = fit(&format!("{} {}", time, title), GRID_COLUMN_WIDTH);

        let important = hit
            .newsvalue()
            .and_then(Newsvalue::parse)
            .is_some_and(|nv| nv >= Newsvalue::Five);

        lines.push(if important {
            line.bold().to_string()
        } else {
            line
        });
    }

    lines
}

/// Earliest start of `hit` that falls on the bucket day `key`.
fn start_on_day(hit: &SearchHit, key: &str, tz: Tz) -> Option<DateTime<Utc>> {
    hit.source
        .starts
        .iter()
        .filter(|t| bucket_key(**t, tz) == key)
        .min()
        .copied()
}

/// "Fri 1 Mar" for a `YYYY-MM-DD` key.
fn date_label(key: &str) -> String {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map(|date| date.format("%a %-d %b").to_string())
        .unwrap_or_else(|_| key.to_string())
}

/// Render hits as rows of the given columns.
pub fn render_table(columns: &[Column], hits: &[&SearchHit], tz: Tz) -> String {
    let header = columns
        .iter()
        .map(|column| fit(header_label(column.kind), column_width(column.kind)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = vec![header.trim_end().bold().to_string()];

    for hit in hits {
        let row = columns
            .iter()
            .map(|column| render_cell(column.kind, hit, tz))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(row.trim_end().to_string());
    }

    lines.push(String::new());
    lines.push(
        format!("{} {}", "⋯".dimmed(), ACTION_MENU.join(" · "))
            .dimmed()
            .to_string(),
    );

    lines.join("\n")
}

fn column_width(kind: ColumnKind) -> usize {
    match kind {
        ColumnKind::Visibility => 2,
        ColumnKind::Newsvalue => 3,
        ColumnKind::Title => 44,
        ColumnKind::Section => 14,
        ColumnKind::PlanningStatus => 18,
        ColumnKind::Time => 11,
        ColumnKind::Action => 1,
    }
}

fn header_label(kind: ColumnKind) -> &'static str {
    match kind {
        // too narrow for their names
        ColumnKind::Visibility => "",
        ColumnKind::Newsvalue => "NV",
        ColumnKind::Action => "",
        _ => kind.name(),
    }
}

/// Render one cell, padded to the column width.
pub fn render_cell(kind: ColumnKind, hit: &SearchHit, tz: Tz) -> String {
    let width = column_width(kind);
    let value = kind.value(hit);

    match kind {
        ColumnKind::Visibility => match value.as_text().and_then(Visibility::parse) {
            Some(Visibility::Public) => fit("●", width).green().to_string(),
            Some(Visibility::Internal) => fit("●", width).yellow().to_string(),
            None => fit("", width),
        },
        ColumnKind::Newsvalue => match value.as_text().and_then(Newsvalue::parse) {
            Some(nv) if nv >= Newsvalue::Five => fit(&nv.value(), width).red().to_string(),
            Some(nv) if nv >= Newsvalue::Three => fit(&nv.value(), width).yellow().to_string(),
            Some(nv) => fit(&nv.value(), width),
            None => fit("", width),
        },
        ColumnKind::Title => {
            let title = value.as_text().unwrap_or("");
            match hit.slugline() {
                Some(slugline) => {
                    let slug_width = slugline.chars().count() + 1;
                    let title_width = width.saturating_sub(slug_width);
                    if title_width >= 8 {
                        format!("{} {}", fit(title, title_width), slugline.dimmed())
                    } else {
                        fit(title, width)
                    }
                }
                None => fit(title, width),
            }
        }
        ColumnKind::Section => match value.as_text() {
            Some(section) => fit(&format!("[{}]", section), width).cyan().to_string(),
            None => fit("", width),
        },
        ColumnKind::PlanningStatus => {
            let label = match hit.first_planning() {
                Some(planning) => match planning.status.as_deref() {
                    Some(status) => format!("{} ({})", PlanningStatus::Planned.label(), status),
                    None => PlanningStatus::Planned.label().to_string(),
                },
                None => PlanningStatus::Unplanned.label().to_string(),
            };
            if hit.is_planned() {
                fit(&label, width)
            } else {
                fit(&label, width).dimmed().to_string()
            }
        }
        ColumnKind::Time => match value {
            ColumnValue::TimeSpan { start, end } => {
                let fmt = |t: Option<DateTime<Utc>>| {
                    t.map(|t| t.with_timezone(&tz).format("%H:%M").to_string())
                        .unwrap_or_default()
                };
                match (start, end) {
                    (None, None) => fit("", width),
                    _ => fit(&format!("{}–{}", fmt(start), fmt(end)), width),
                }
            }
            _ => fit("", width),
        },
        ColumnKind::Action => fit("⋯", width).dimmed().to_string(),
    }
}

/// Pad or truncate `s` to exactly `width` characters.
fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();

    if count <= width {
        format!("{}{}", s, " ".repeat(width - count))
    } else if width == 0 {
        String::new()
    } else {
        let truncated: String = s.chars().take(width - 1).collect();
        format!("{}…", truncated)
    }
}
