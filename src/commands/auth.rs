use anyhow::{Context, Result};
use chrono::Utc;
use newsdesk_core::config::NewsdeskConfig;
use newsdesk_core::session::Session;
use owo_colors::OwoColorize;

pub fn login(config: &NewsdeskConfig, token: &str, expires_in: Option<&str>) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Access token is empty");
    }

    let expires_at = match expires_in {
        Some(raw) => {
            let lifetime = humantime::parse_duration(raw)
                .with_context(|| format!("Invalid duration '{}'. Example: 8h", raw))?;
            let lifetime = chrono::Duration::from_std(lifetime)
                .with_context(|| format!("Duration '{}' is too long", raw))?;
            Some(Utc::now() + lifetime)
        }
        None => None,
    };

    let path = config.session_path();
    Session::new(token, expires_at)
        .save(&path)
        .with_context(|| format!("Failed to write session to {}", path.display()))?;

    println!("{} {}", "Signed in.".green(), format!("Session stored in {}", path.display()).dimmed());
    Ok(())
}

pub fn logout(config: &NewsdeskConfig) -> Result<()> {
    let path = config.session_path();

    if Session::remove(&path)? {
        println!("Signed out.");
    } else {
        println!("{}", "No stored session.".dimmed());
    }

    Ok(())
}
