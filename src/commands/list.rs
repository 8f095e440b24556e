use anyhow::Result;
use newsdesk_core::cache::Load;
use newsdesk_core::columns::{TableFilter, event_table_columns};
use newsdesk_core::config::NewsdeskConfig;
use newsdesk_core::hit::SearchHit;
use newsdesk_core::registry::Registry;
use newsdesk_core::window::Window;
use owo_colors::OwoColorize;

use crate::commands::Context;
use crate::render::render_table;
use crate::utils::tui::create_spinner;

pub async fn run(ctx: &Context, window: Window, filters: &[String]) -> Result<()> {
    let filter = parse_filters(filters)?;
    let tz = ctx.registry.time_zone;

    let spinner = create_spinner("Loading events".to_string());
    let load = ctx.fetcher.load(&ctx.session, &window, tz).await;
    spinner.finish_and_clear();

    let buckets = match load {
        Load::Superseded | Load::Ready(Ok(None)) => {
            println!("{}", "No events".dimmed());
            return Ok(());
        }
        Load::Ready(Err(e)) => anyhow::bail!("{e}"),
        Load::Ready(Ok(Some(buckets))) => buckets,
    };

    // Day order, then index order within a day
    let hits: Vec<SearchHit> = buckets
        .iter()
        .flat_map(|(_, hits)| hits.iter().cloned())
        .collect();
    let rows = filter.apply(&hits);

    if rows.is_empty() {
        println!("{}", "No events match the filters".dimmed());
        return Ok(());
    }

    let columns = event_table_columns(&ctx.registry.sections);
    println!("{}", render_table(&columns, &rows, tz));

    Ok(())
}

/// Print each column with the values its filter accepts.
pub fn columns(config: &NewsdeskConfig) -> Result<()> {
    let registry = Registry::from_config(config)?;

    for column in event_table_columns(&registry.sections) {
        let kind = column.kind;
        println!("{} {}", kind.id().bold(), format!("({})", kind.name()).dimmed());

        if !kind.is_categorical() {
            continue;
        }
        if column.options.is_empty() {
            println!("   {}", "no options configured".dimmed());
        }
        for option in &column.options {
            if option.label == option.value {
                println!("   {}", option.value);
            } else {
                println!("   {} {}", option.value, option.label.dimmed());
            }
        }
    }

    Ok(())
}

fn parse_filters(filters: &[String]) -> Result<TableFilter> {
    let mut filter = TableFilter::new();
    for arg in filters {
        filter.add_arg(arg)?;
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_filters() {
        let filter = parse_filters(&[
            "section=Sport".to_string(),
            "planning=unplanned".to_string(),
        ])
        .unwrap();

        assert!(!filter.is_empty());
    }

    #[test]
    fn rejects_unknown_column() {
        let err = parse_filters(&["colour=red".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown column"));
    }
}
