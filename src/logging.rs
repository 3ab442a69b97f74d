// src/logging.rs
//! Tracing setup and log-safe identifiers.

use sha2::{Digest, Sha256};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Set to `1` to turn on log output (otherwise `init_tracing` is a no-op).
pub const ENV_LOG: &str = "PULSE_LOG";
/// Set to `json` for one JSON object per event.
pub const ENV_LOG_FORMAT: &str = "PULSE_LOG_FORMAT";

/// Install a global subscriber when `PULSE_LOG=1`. `RUST_LOG` refines the
/// filter (default `pipeline=info,config=info,warn`). Returns whether a
/// subscriber was installed; a second call, or one after another crate
/// installed a subscriber, returns `false`.
pub fn init_tracing() -> bool {
    let enabled = std::env::var(ENV_LOG).ok().is_some_and(|v| v == "1");
    if !enabled {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pipeline=info,config=info,warn"));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    res.is_ok()
}

/// Short stable hash so author names never reach the logs in clear text.
pub fn anon_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Full hex SHA-256 of the given parts, each followed by a NUL separator.
pub fn fingerprint<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
