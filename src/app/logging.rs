//! Tracing subscriber setup, custom formatters, dynamic log level reload.

use tracing_subscriber::{reload, EnvFilter};

// Global reload handle for dynamic log level changes
pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;
pub static RELOAD_HANDLE: std::sync::OnceLock<ReloadHandle> = std::sync::OnceLock::new();

/// Map a user-facing level name to an `EnvFilter` directive. CRITICAL is
/// treated as ERROR.
pub fn level_filter(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "critical" | "error" => Some("error"),
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        _ => None,
    }
}

/// Pick the effective level: CLI flag, then `LOG_LEVEL`, then config.
pub fn resolve_level(cli: Option<&str>, env: Option<&str>, config: &str) -> &'static str {
    for candidate in [cli, env, Some(config)].into_iter().flatten() {
        match level_filter(candidate) {
            Some(filter) => return filter,
            None => eprintln!(
                "Invalid log level '{}'. Valid levels: TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL",
                candidate
            ),
        }
    }
    "info"
}

// Custom time formatter for logs: "YYYY-MM-DD HH:MM:SS" (local time)
pub struct LocalTimeFormatter;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

// Custom event formatter for logs: "YYYY-MM-DD HH:MM:SS [LEVEL] message"
pub struct CustomEventFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for CustomEventFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        use tracing_subscriber::fmt::time::FormatTime;

        LocalTimeFormatter.format_time(&mut writer)?;
        write!(writer, " ")?;

        let level = event.metadata().level();
        if writer.has_ansi_escapes() {
            let level_color = match *level {
                tracing::Level::TRACE => "\x1b[2m",
                tracing::Level::DEBUG => "\x1b[34m",
                tracing::Level::INFO => "\x1b[32m",
                tracing::Level::WARN => "\x1b[33m",
                tracing::Level::ERROR => "\x1b[31m",
            };
            write!(writer, "{}[{}]\x1b[0m ", level_color, level)?;
        } else {
            write!(writer, "[{}] ", level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Initialize the tracing subscriber with reload capability.
pub fn init_tracing(filter: &str) {
    use tracing_subscriber::prelude::*;

    let env_filter = EnvFilter::new(filter);
    let (filter_layer, reload_handle) = reload::Layer::new(env_filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_level(true)
                .fmt_fields(tracing_subscriber::fmt::format::DefaultFields::new())
                .event_format(CustomEventFormat),
        )
        .init();

    // Store reload handle for the SIGHUP handler
    let _ = RELOAD_HANDLE.set(reload_handle);
}

/// Swap the active filter. No-op before `init_tracing`.
pub fn reload_level(filter: &str) -> anyhow::Result<()> {
    if let Some(handle) = RELOAD_HANDLE.get() {
        handle.reload(EnvFilter::new(filter))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter("CRITICAL"), Some("error"));
        assert_eq!(level_filter("Debug"), Some("debug"));
        assert_eq!(level_filter("verbose"), None);
    }

    #[test]
    fn test_resolve_level_precedence() {
        assert_eq!(resolve_level(Some("trace"), Some("warn"), "INFO"), "trace");
        assert_eq!(resolve_level(None, Some("warn"), "INFO"), "warn");
        assert_eq!(resolve_level(None, None, "DEBUG"), "debug");
        assert_eq!(resolve_level(Some("bogus"), None, "ERROR"), "error");
        assert_eq!(resolve_level(None, None, "bogus"), "info");
    }
}
