use crate::config::LoggingConfig;
use crate::error::{PostsError, Result};
use chrono::{SecondsFormat, Utc};
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Formats every event as `<timestamp> [<LEVEL>]: <message>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        write!(writer, "{} [{}]: ", timestamp, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initializes the logging system with both console and file output.
///
/// Events go to stdout and to `<directory>/<log_name>.log`. The returned guard
/// owns the background file writer; keep it alive until the process exits so
/// buffered lines are flushed.
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig, log_name: &str) -> Result<WorkerGuard> {
    // Creates the log directory if needed
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(format!("{log_name}.log"))
        .build(&config.directory)
        .map_err(|e| PostsError::Logging {
            path: config.directory.clone(),
            message: e.to_string(),
        })?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(level_filter(&config.level))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| PostsError::Logging {
            path: config.directory.clone(),
            message: e.to_string(),
        })?;

    Ok(guard)
}

/// Builds the filter for a configured level such as `info` or `posts_pipeline=debug`.
/// Unparseable values fall back to `info`.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
}
