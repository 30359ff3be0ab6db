//! Application configuration loaded from environment variables.
//!
//! Every variable is optional:
//! - `HANDICAP_API_URL` - base URL of the market-data HTTP service
//! - `HANDICAP_WS_URL` - push endpoint used in live mode
//! - `HANDICAP_EXPORT_DIR` - directory CSV exports are written to
//! - `HANDICAP_LATEST_DEPTH` - row limit requested from the latest endpoint
//! - `HANDICAP_LOG_FILE` - file receiving `tracing` output

use std::path::PathBuf;

use crate::HandicapError;

/// Default base URL of the market-data HTTP service.
const DEFAULT_API_URL: &str = "http://127.0.0.1:5003";

/// Default push endpoint.
const DEFAULT_WS_URL: &str = "ws://127.0.0.1:5003/socket.io/?EIO=3&transport=websocket";

/// Default number of rows requested from the latest endpoint.
const DEFAULT_LATEST_DEPTH: u32 = 100;

const DEFAULT_LOG_FILE: &str = "handicap.log";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    /// Directory that receives `<data kind>.csv` exports.
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
}

/// Endpoints of the remote market-data service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_url: String,
    pub websocket_url: String,
    pub latest_depth: u32,
}

/// Loads the application configuration from environment variables.
///
/// Unset or empty variables fall back to their defaults.
///
/// # Errors
///
/// Returns [`HandicapError::Config`] if a URL has the wrong scheme or the
/// latest depth is not a positive integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let api_url = non_empty_var("HANDICAP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(HandicapError::Config(format!(
            "HANDICAP_API_URL must be an http(s) URL, got {api_url}"
        )));
    }

    let websocket_url =
        non_empty_var("HANDICAP_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.to_string());
    if !(websocket_url.starts_with("ws://") || websocket_url.starts_with("wss://")) {
        return Err(HandicapError::Config(format!(
            "HANDICAP_WS_URL must be a ws(s) URL, got {websocket_url}"
        )));
    }

    let latest_depth = match non_empty_var("HANDICAP_LATEST_DEPTH") {
        Some(raw) => match raw.parse::<u32>() {
            Ok(depth) if depth > 0 => depth,
            _ => {
                return Err(HandicapError::Config(format!(
                    "HANDICAP_LATEST_DEPTH must be a positive integer, got {raw}"
                )));
            }
        },
        None => DEFAULT_LATEST_DEPTH,
    };

    let export_dir = non_empty_var("HANDICAP_EXPORT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let log_file = non_empty_var("HANDICAP_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

    Ok(AppConfig {
        service: ServiceConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            websocket_url,
            latest_depth,
        },
        export_dir,
        log_file,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serializes the tests below; they all touch the same variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "HANDICAP_API_URL",
        "HANDICAP_WS_URL",
        "HANDICAP_EXPORT_DIR",
        "HANDICAP_LATEST_DEPTH",
        "HANDICAP_LOG_FILE",
    ];

    /// Sets the given variables (clearing every other `HANDICAP_*` one),
    /// runs `f`, then restores the originals.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> =
            VARS.iter().map(|k| (*k, std::env::var(k).ok())).collect();

        for k in VARS {
            let value = vars.iter().find(|(name, _)| *name == k).map(|(_, v)| *v);
            // SAFETY: every test touching these variables holds ENV_LOCK.
            unsafe {
                match value {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values under the same lock.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&[], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.service.api_url, DEFAULT_API_URL);
            assert_eq!(config.service.websocket_url, DEFAULT_WS_URL);
            assert_eq!(config.service.latest_depth, 100);
            assert_eq!(config.export_dir, PathBuf::from("."));
            assert_eq!(config.log_file, PathBuf::from("handicap.log"));
        });
    }

    #[test]
    fn custom_endpoints_and_trailing_slash() {
        with_env(
            &[
                ("HANDICAP_API_URL", "https://data.example.com/"),
                ("HANDICAP_WS_URL", "wss://data.example.com/feed"),
                ("HANDICAP_EXPORT_DIR", "/tmp/exports"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.service.api_url, "https://data.example.com");
                assert_eq!(config.service.websocket_url, "wss://data.example.com/feed");
                assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
            },
        );
    }

    #[test]
    fn rejects_non_http_api_url() {
        with_env(&[("HANDICAP_API_URL", "ftp://data.example.com")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("HANDICAP_API_URL"));
        });
    }

    #[test]
    fn rejects_non_ws_push_url() {
        with_env(&[("HANDICAP_WS_URL", "http://data.example.com")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("HANDICAP_WS_URL"));
        });
    }

    #[test]
    fn rejects_zero_depth() {
        with_env(&[("HANDICAP_LATEST_DEPTH", "0")], || {
            assert!(fetch_config().is_err());
        });
        with_env(&[("HANDICAP_LATEST_DEPTH", "many")], || {
            assert!(fetch_config().is_err());
        });
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[
                ("HANDICAP_API_URL", ""),
                ("HANDICAP_WS_URL", ""),
                ("HANDICAP_LATEST_DEPTH", ""),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.service.api_url, DEFAULT_API_URL);
                assert_eq!(config.service.websocket_url, DEFAULT_WS_URL);
                assert_eq!(config.service.latest_depth, DEFAULT_LATEST_DEPTH);
            },
        );
    }
}
