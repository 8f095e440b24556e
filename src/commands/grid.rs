use anyhow::Result;
use newsdesk_core::cache::Load;
use newsdesk_core::grid::column_count;
use newsdesk_core::window::Window;
use owo_colors::OwoColorize;

use crate::commands::Context;
use crate::render::render_grid;
use crate::utils::tui::create_spinner;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub async fn run(ctx: &Context, window: Window, watch: bool) -> Result<()> {
    let tz = ctx.registry.time_zone;

    loop {
        let spinner = create_spinner("Loading events".to_string());
        let load = ctx.fetcher.load(&ctx.session, &window, tz).await;
        spinner.finish_and_clear();

        if watch {
            print!("{CLEAR_SCREEN}");
        }

        match load {
            // Only one window is ever focused here
            Load::Superseded => {}
            Load::Ready(Err(e)) if watch => eprintln!("{}", e.red()),
            Load::Ready(Err(e)) => anyhow::bail!("{e}"),
            Load::Ready(Ok(None)) => println!("{}", "No events".dimmed()),
            Load::Ready(Ok(Some(buckets))) => {
                let size = column_count(buckets.len())?;
                println!("{}", render_grid(&buckets, size, tz));
            }
        }

        if !watch {
            return Ok(());
        }

        tokio::time::sleep(ctx.fetcher.cache().policy().refresh_interval).await;
    }
}
