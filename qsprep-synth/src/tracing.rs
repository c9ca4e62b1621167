//! Setup routines for tracing and logging of the synthesis process.
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use qsprep::cnry::log::{LOG_TARGET, METRICS_TARGET, PROGRESS_TARGET};

use tracing::{Metadata, Subscriber};
use tracing_appender::non_blocking;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

fn log_filter(metadata: &Metadata<'_>) -> bool {
    metadata.target().starts_with(LOG_TARGET)
}

fn verbose_filter(metadata: &Metadata<'_>) -> bool {
    [LOG_TARGET, PROGRESS_TARGET, METRICS_TARGET]
        .iter()
        .any(|t| metadata.target().starts_with(t))
}

#[derive(Debug, Default)]
pub struct Tracer {
    pub logfile: Option<non_blocking::WorkerGuard>,
}

impl Tracer {
    /// Setup tracing subscribers for stdout and file logging.
    pub fn setup_tracing(logfile: Option<PathBuf>) -> io::Result<Self> {
        let mut tracer = Self::default();
        let file_layer = logfile.map(|f| tracer.logfile_layer(f)).transpose()?;
        tracing_subscriber::registry()
            .with(tracer.stdout_layer())
            .with(file_layer)
            .init();
        Ok(tracer)
    }

    /// Clean log with the most important events.
    fn stdout_layer<S>(&mut self) -> impl Layer<S>
    where
        S: Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
    {
        tracing_subscriber::fmt::layer()
            .without_time()
            .with_target(false)
            .with_level(false)
            .with_filter(filter_fn(log_filter))
    }

    /// Full log, including search progress and span timings, written by a
    /// non-blocking worker.
    fn logfile_layer<S>(&mut self, logfile: PathBuf) -> io::Result<impl Layer<S>>
    where
        S: Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
    {
        let (writer, guard) = non_blocking(BufWriter::new(File::create(logfile)?));
        self.logfile = Some(guard);
        Ok(tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
            .with_writer(writer)
            .with_filter(filter_fn(verbose_filter)))
    }
}
