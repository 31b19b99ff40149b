//! Logger setup shared by the desktop shell and headless runs.
//!
//! Reads `RUST_LOG` like any `env_logger` app; `OMNIA_PANEL_DEBUG=1` (or
//! `true`) lowers the floor to debug so stale timer firings and event
//! payloads show up.

pub const DEBUG_ENV: &str = "OMNIA_PANEL_DEBUG";

pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub fn init() {
    let level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Tests may initialise more than once.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("true"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn init_is_repeatable() {
        init();
        init();
    }
}
