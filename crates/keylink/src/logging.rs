use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Crates whose events follow `--log-level` directly.
const LINK_TARGETS: [&str; 4] = ["keylink", "keylink_transport", "keylink_frame", "keylink_session"];

/// Log line encoding on stderr.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Per-target filter: link crates at `level`, everything else capped at warn.
///
/// `--log-level trace` dumps every discarded handshake byte and frame
/// without drowning it in dependency chatter.
pub fn link_filter(level: LogLevel) -> Targets {
    let level = level.as_filter();
    LINK_TARGETS
        .iter()
        .fold(Targets::new().with_default(level.min(LevelFilter::WARN)), |targets, target| {
            targets.with_target(*target, level)
        })
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = link_filter(level);
    let layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .with_filter(filter)
            .boxed(),
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn link_crates_follow_requested_level() {
        let filter = link_filter(LogLevel::Trace);
        assert!(filter.would_enable("keylink_session::handshake", &Level::TRACE));
        assert!(filter.would_enable("keylink_frame::reader", &Level::TRACE));
        assert!(filter.would_enable("keylink::cmd::listen", &Level::DEBUG));
    }

    #[test]
    fn other_crates_capped_at_warn() {
        let filter = link_filter(LogLevel::Debug);
        assert!(filter.would_enable("serialport::posix", &Level::WARN));
        assert!(!filter.would_enable("serialport::posix", &Level::INFO));
    }

    #[test]
    fn quiet_levels_apply_everywhere() {
        let filter = link_filter(LogLevel::Error);
        assert!(!filter.would_enable("keylink_session::session", &Level::WARN));
        assert!(!filter.would_enable("ctrlc", &Level::WARN));

        let off = link_filter(LogLevel::Off);
        assert!(!off.would_enable("keylink_transport::serial", &Level::ERROR));
    }
}
