//! Subscriber setup for the `tracing` events the crate emits.
//!
//! `LOG_LEVEL` takes `EnvFilter` directives and falls back to [`DEFAULT_DIRECTIVES`]
//! when unset or unparsable. `LOG_FORMAT=json` switches to one JSON object per event.
//!
//! Targets in use: `nvr_backend` (startup, config), `generator` (attempts and
//! rejections), `attempt` (scored answers). The HTTP TraceLayer adds per-request spans.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "info,generator=debug,nvr_backend=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (any case) is pretty.
    pub fn from_setting(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Filter directives to install for a raw `LOG_LEVEL` value.
pub fn filter_directives(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if EnvFilter::try_new(v).is_ok() => v.to_string(),
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}

/// Install the global subscriber. Errors if one is already set.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = std::env::var("LOG_LEVEL").ok();
    let format = LogFormat::from_setting(std::env::var("LOG_FORMAT").ok().as_deref());
    let directives = filter_directives(level.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&directives))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().try_init()?,
        LogFormat::Pretty => builder.try_init()?,
    }

    if level.is_some() && directives == DEFAULT_DIRECTIVES {
        tracing::warn!(target: "nvr_backend", ?level, "LOG_LEVEL not usable, using defaults");
    }
    tracing::debug!(target: "nvr_backend", ?format, %directives, "Tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_pretty() {
        assert_eq!(LogFormat::from_setting(None), LogFormat::Pretty);
        assert_eq!(LogFormat::from_setting(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_setting(Some("yaml")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_setting(Some(" JSON ")), LogFormat::Json);
    }

    #[test]
    fn valid_level_is_kept() {
        assert_eq!(filter_directives(Some("debug")), "debug");
        assert_eq!(filter_directives(Some("warn,generator=trace")), "warn,generator=trace");
    }

    #[test]
    fn missing_or_bad_level_falls_back() {
        assert_eq!(filter_directives(None), DEFAULT_DIRECTIVES);
        assert_eq!(filter_directives(Some("   ")), DEFAULT_DIRECTIVES);
        assert_eq!(filter_directives(Some("generator=loud")), DEFAULT_DIRECTIVES);
    }
}
