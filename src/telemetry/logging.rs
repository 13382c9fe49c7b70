use std::{env::current_dir, fmt::Write, path::Path};

use ansi_term::Colour::{Blue, Cyan, Purple, Red, Yellow};
use eyre::Result;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

/// File name prefix of the daily rolling log file.
pub const LOG_FILE_NAME_PREFIX: &str = "tiller.log";

/// Configure logging telemetry
///
/// Logs go to the terminal, and additionally to a daily rolling file in `log_dir`
/// when one is given. The returned guard must be held for the file writer to keep
/// flushing.
pub fn init(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = match verbose {
        true => get_env_filter("tiller=debug"),
        false => get_env_filter("tiller=info"),
    };
    let subscriber = Registry::default().with(env_filter).with(AnsiTermLayer);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            init_subscriber(subscriber.with(file_layer))?;
            Ok(Some(guard))
        }
        None => {
            init_subscriber(subscriber)?;
            Ok(None)
        }
    }
}

/// Uses `RUST_LOG` if set, otherwise the given directive.
pub fn get_env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Globally registers a subscriber.
/// This will error if a subscriber has already been registered.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync + 'static) -> Result<()> {
    subscriber
        .try_init()
        .map_err(|_| eyre::eyre!("Failed to set subscriber"))
}

/// Collects an event's fields into a single line.
#[derive(Debug, Default)]
pub struct AnsiVisitor {
    message: String,
    fields: String,
}

impl AnsiVisitor {
    fn finish(self) -> String {
        match self.fields.is_empty() {
            true => self.message,
            false => format!("{}{}", self.message, self.fields),
        }
    }
}

impl tracing::field::Visit for AnsiVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message.push_str(value),
            name => {
                let _ = write!(self.fields, " {}={}", Cyan.paint(name), value);
            }
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => {
                let _ = write!(self.message, "{:?}", value);
            }
            name => {
                let _ = write!(self.fields, " {}={:?}", Cyan.paint(name), value);
            }
        }
    }
}

/// An Ansi Term layer for tracing
#[derive(Debug)]
pub struct AnsiTermLayer;

impl<S> Layer<S> for AnsiTermLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let utc: chrono::DateTime<chrono::Utc> = chrono::Utc::now();
        let level = match *event.metadata().level() {
            Level::ERROR => Red.paint("ERROR").to_string(),
            Level::WARN => Yellow.paint("WARN").to_string(),
            Level::INFO => Blue.paint("INFO").to_string(),
            Level::DEBUG => "DEBUG".to_string(),
            Level::TRACE => Purple.paint("TRACE").to_string(),
        };

        let location = event.metadata().file().unwrap_or_default();
        let cwd = current_dir().unwrap_or_default().to_string_lossy().to_string();
        let location = location
            .strip_prefix(&cwd)
            .map(|l| format!("./{}", l.trim_start_matches('/')))
            .unwrap_or_else(|| location.to_string());

        let mut visitor = AnsiVisitor::default();
        event.record(&mut visitor);

        let line = format!(
            "[{}] {}: {} at {} {}",
            Cyan.paint(utc.to_rfc2822()),
            level,
            Purple.paint(event.metadata().target()),
            Cyan.paint(location),
            visitor.finish()
        );
        match *event.metadata().level() {
            Level::ERROR => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}
