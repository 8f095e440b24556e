//! Display settings shared by every view: time zone and known sections.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::NewsdeskConfig;
use crate::error::{NewsdeskError, NewsdeskResult};

/// A newsroom section. Only the title is known; events reference sections
/// by title since the section uuid is not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Registry {
    pub time_zone: Tz,
    pub sections: Vec<Section>,
}

impl Registry {
    pub fn from_config(config: &NewsdeskConfig) -> NewsdeskResult<Self> {
        let time_zone = resolve_time_zone(config.time_zone.as_deref())?;

        let sections = config
            .sections
            .iter()
            .map(|title| Section {
                title: title.clone(),
            })
            .collect();

        Ok(Registry {
            time_zone,
            sections,
        })
    }
}

/// Resolve the display time zone.
///
/// An explicitly configured zone must be a valid IANA name. Without one the
/// system zone is used, falling back to UTC when it cannot be determined.
pub fn resolve_time_zone(configured: Option<&str>) -> NewsdeskResult<Tz> {
    if let Some(name) = configured {
        return name
            .parse::<Tz>()
            .map_err(|_| NewsdeskError::UnknownTimeZone(name.to_string()));
    }

    let system = iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok());

    Ok(system.unwrap_or(Tz::UTC))
}
