use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:1337";
const DEFAULT_GEOIP_URL: &str = "http://ip-api.com/json";
const DEFAULT_LOG_FILE: &str = "travel_log.log";

/// World-map backdrop behind the markers. Stands in for the map-provider
/// token: when it is not configured the map stays blank, nothing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    High,
    Low,
    Off,
}

impl FromStr for Backdrop {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Backdrop::High),
            "low" => Ok(Backdrop::Low),
            "off" => Ok(Backdrop::Off),
            other => Err(format!("expected high, low or off, got {other:?}")),
        }
    }
}

pub struct Config {
    pub api_url: Url,
    pub backdrop: Backdrop,
    pub geoip_url: Url,
    pub log_file: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            api_url: try_load("TRAVEL_LOG_API_URL", DEFAULT_API_URL),
            backdrop: try_load("TRAVEL_LOG_BACKDROP", "off"),
            geoip_url: try_load("TRAVEL_LOG_GEOIP_URL", DEFAULT_GEOIP_URL),
            log_file: try_load("TRAVEL_LOG_LOG_FILE", DEFAULT_LOG_FILE),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("{key} not set, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .or_else(|e| {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default.parse()
        })
        .map_err(|e| warn!("Invalid default for {key}: {e}"))
        .expect("Defaults misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_parses_known_values() {
        assert_eq!("high".parse::<Backdrop>().unwrap(), Backdrop::High);
        assert_eq!("LOW".parse::<Backdrop>().unwrap(), Backdrop::Low);
        assert_eq!("off".parse::<Backdrop>().unwrap(), Backdrop::Off);
        assert!("dark-v11".parse::<Backdrop>().is_err());
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        let url: Url = try_load("TRAVEL_LOG_TEST_UNSET_URL", DEFAULT_API_URL);
        assert_eq!(url.as_str(), "http://localhost:1337/");
    }

    #[test]
    fn invalid_value_falls_back_to_default() {
        env::set_var("TRAVEL_LOG_TEST_BAD_BACKDROP", "satellite");
        let backdrop: Backdrop = try_load("TRAVEL_LOG_TEST_BAD_BACKDROP", "off");
        assert_eq!(backdrop, Backdrop::Off);
        env::remove_var("TRAVEL_LOG_TEST_BAD_BACKDROP");
    }
}
