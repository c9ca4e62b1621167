//! Diagnostic sink for the CnRy search.

use std::io;
use std::time::{Duration, Instant};

use super::state::CnRyState;

/// The logging target for general events.
pub const LOG_TARGET: &str = "qsprep::log";
/// The logging target for progress events. More verbose than the general log.
pub const PROGRESS_TARGET: &str = "qsprep::progress";
/// The logging target for function spans.
pub const METRICS_TARGET: &str = "qsprep::metrics";

/// Logging configuration for one run of the CnRy solver.
///
/// Every finalised node can be recorded to a CSV writer. The writer is
/// flushed when the logger is dropped, whether the search succeeded or not.
pub struct SearchLogger<'w> {
    nodes_csv: Option<csv::Writer<Box<dyn io::Write + Send + Sync + 'w>>>,
    last_nodes_processed: usize,
    last_progress_time: Instant,
    branching_factor: UsizeAverage,
}

impl Default for SearchLogger<'_> {
    fn default() -> Self {
        Self {
            nodes_csv: None,
            last_nodes_processed: 0,
            // Ensure the first progress message is printed.
            last_progress_time: Instant::now() - Duration::from_secs(60),
            branching_factor: UsizeAverage::new(),
        }
    }
}

impl<'w> SearchLogger<'w> {
    /// Create a logger recording the search nodes to `nodes_csv_writer`.
    ///
    /// Regular events are logged with [`tracing`], with targets [`LOG_TARGET`]
    /// or [`PROGRESS_TARGET`].
    pub fn new(nodes_csv_writer: impl io::Write + Send + Sync + 'w) -> Self {
        let boxed: Box<dyn io::Write + Send + Sync + 'w> = Box::new(nodes_csv_writer);
        let mut logger = Self::default();
        logger.nodes_csv = Some(csv::Writer::from_writer(boxed));
        logger
    }

    /// Record a node taken off the queue.
    #[inline]
    pub fn log_node(&mut self, state: &CnRyState, queue_size: usize) {
        tracing::trace!(target: PROGRESS_TARGET, "visit {state} at cost {}", state.cost());
        let Some(writer) = self.nodes_csv.as_mut() else {
            return;
        };
        if let Err(e) = writer.serialize(NodeSer::new(state, queue_size)) {
            tracing::warn!(target: LOG_TARGET, "could not record search node: {e}");
            self.nodes_csv = None;
        }
    }

    /// Log the outcome of the search.
    #[inline]
    pub fn log_processing_end(
        &self,
        nodes_processed: usize,
        nodes_seen: usize,
        best_cost: Option<usize>,
        elapsed_time: Duration,
    ) {
        let elapsed_secs = elapsed_time.as_secs_f32();
        self.log(format!("Search finished in {elapsed_secs:.2}s."));
        self.log(format!(
            "Processed {nodes_processed} nodes (out of {nodes_seen} seen)."
        ));
        self.log_avg_branching_factor();
        match best_cost {
            Some(cost) => self.log(format!("---- END RESULT: {cost} CNOTs ----")),
            None => self.warn("---- END RESULT: no solution ----"),
        }
    }

    /// Log the progress of the search, at most once per second.
    #[inline(always)]
    pub fn log_progress(&mut self, nodes_processed: usize, queue_len: usize, seen: usize) {
        if nodes_processed > self.last_nodes_processed
            && Instant::now() - self.last_progress_time > Duration::from_secs(1)
        {
            self.last_nodes_processed = nodes_processed;
            self.last_progress_time = Instant::now();

            self.progress(format!("Processed {nodes_processed} nodes..."));
            self.progress(format!("Queue size: {queue_len} nodes."));
            self.progress(format!("Total seen: {seen} nodes."));
        }
    }

    /// Log general events, normally printed to stdout.
    #[inline]
    pub fn log(&self, msg: impl AsRef<str>) {
        tracing::info!(target: LOG_TARGET, "{}", msg.as_ref());
    }

    /// Log a warning message.
    #[inline]
    pub fn warn(&self, msg: impl AsRef<str>) {
        tracing::warn!(target: LOG_TARGET, "{}", msg.as_ref());
    }

    /// Log verbose information on the progress of the search.
    #[inline]
    pub fn progress(&self, msg: impl AsRef<str>) {
        tracing::info!(target: PROGRESS_TARGET, "{}", msg.as_ref());
    }

    /// Append a new branching factor to the average.
    pub fn register_branching_factor(&mut self, branching_factor: usize) {
        self.branching_factor.append(branching_factor);
    }

    /// Log the average branching factor so far.
    pub fn log_avg_branching_factor(&self) {
        if let Some(avg) = self.branching_factor.average() {
            self.log(format!("Average branching factor: {avg:.2}"));
        }
    }
}

impl Drop for SearchLogger<'_> {
    fn drop(&mut self) {
        if let Some(writer) = self.nodes_csv.as_mut() {
            if let Err(e) = writer.flush() {
                tracing::warn!(target: LOG_TARGET, "could not flush the search log: {e}");
            }
        }
    }
}

/// One CSV row per finalised node.
#[derive(serde::Serialize, Clone, Debug)]
struct NodeSer {
    labels: String,
    cost: usize,
    queue_size: usize,
    time: String,
}

impl NodeSer {
    fn new(state: &CnRyState, queue_size: usize) -> Self {
        Self {
            labels: state.to_string(),
            cost: state.cost(),
            queue_size,
            time: chrono::Local::now().to_rfc3339(),
        }
    }
}

struct UsizeAverage {
    sum: usize,
    count: usize,
}

impl UsizeAverage {
    pub fn new() -> Self {
        Self { sum: 0, count: 0 }
    }

    pub fn append(&mut self, value: usize) {
        self.sum += value;
        self.count += 1;
    }

    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_are_flushed_on_drop() {
        let mut buf = Vec::new();
        {
            let mut logger = SearchLogger::new(&mut buf);
            logger.log_node(&CnRyState::from_labels([0, 4]), 3);
            logger.log_node(&CnRyState::new(0b11, 2), 1);
        }
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "labels,cost,queue_size,time");
        assert!(lines[1].starts_with("\"{0, 4}\",0,3,"));
        assert!(lines[2].starts_with("\"{0, 1}\",2,1,"));
    }

    #[test]
    fn branching_average() {
        let mut logger = SearchLogger::default();
        assert_eq!(logger.branching_factor.average(), None);
        logger.register_branching_factor(2);
        logger.register_branching_factor(5);
        assert_eq!(logger.branching_factor.average(), Some(3.5));
    }
}
