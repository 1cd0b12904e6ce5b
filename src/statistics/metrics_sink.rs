use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use log::debug;
use thiserror::Error;

/// The error returned when a [`MetricsSink`] cannot be constructed.
///
/// A sink which cannot open its log file is a fatal construction error; there is no recovery
/// path which silently drops metrics the embedder asked for.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to open the metrics log file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An append-only stream of structured search events.
///
/// Each record is a comma-separated tuple beginning with a category tag (`core` for the search
/// driver; theories use their own tags) and an event tag; the shape of each record is fixed and
/// part of the external contract.
///
/// The default sink discards all records. The file-backed sink serializes writes through an
/// internal mutex so that embedding the (single-threaded) solver inside a multi-threaded host
/// remains safe. The sink is opened once at construction and closed on destruction or through
/// [`MetricsSink::close`]; failed writes are reported through [`log::debug!`] and otherwise
/// ignored.
pub struct MetricsSink {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl Default for MetricsSink {
    fn default() -> Self {
        MetricsSink::no_op()
    }
}

impl std::fmt::Debug for MetricsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSink")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl MetricsSink {
    /// Create a sink which discards all records.
    pub fn no_op() -> MetricsSink {
        MetricsSink { writer: None }
    }

    /// Create a sink which appends records to the file at `path`, creating it if necessary.
    pub fn to_file(path: impl AsRef<Path>) -> Result<MetricsSink, MetricsError> {
        let path = path.as_ref();
        let file = File::options()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| MetricsError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(MetricsSink {
            writer: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Check whether this sink writes records anywhere.
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Flush and close the underlying file. Records logged afterwards are discarded.
    pub fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            match writer.into_inner() {
                Ok(mut writer) => {
                    if let Err(error) = writer.flush() {
                        debug!("could not flush the metrics log file: {error}");
                    }
                }
                Err(_) => debug!("the metrics log mutex was poisoned"),
            }
        }
    }

    fn write_record(&self, record: std::fmt::Arguments<'_>) {
        let Some(writer) = &self.writer else {
            return;
        };
        let Ok(mut writer) = writer.lock() else {
            return;
        };
        if let Err(error) = writeln!(writer, "{record}") {
            debug!("could not write a metrics record: {error}");
        }
    }
}

// Records emitted by the search driver. The field lists and their order are fixed.
impl MetricsSink {
    pub(crate) fn log_core_before_propagation(
        &self,
        decision_level: usize,
        trail_size: usize,
        total_decisions: u64,
        total_conflicts: u64,
    ) {
        self.write_record(format_args!(
            "core,before_propagation,{decision_level},{trail_size},{total_decisions},{total_conflicts}"
        ));
    }

    pub(crate) fn log_core_after_propagation(
        &self,
        decision_level: usize,
        trail_size: usize,
        num_conflicts: usize,
    ) {
        self.write_record(format_args!(
            "core,after_propagation,{decision_level},{trail_size},{num_conflicts}"
        ));
    }

    pub(crate) fn log_core_decision(
        &self,
        variable_ordinal: usize,
        decision_level: usize,
        trail_size: usize,
        total_decisions: u64,
        total_backtracks: u64,
    ) {
        self.write_record(format_args!(
            "core,decision,{variable_ordinal},{decision_level},{trail_size},{total_decisions},{total_backtracks}"
        ));
    }

    pub(crate) fn log_core_learned_clause(
        &self,
        clause_len: usize,
        decision_level: usize,
        trail_size: usize,
        total_learned: u64,
        is_semantic_split: bool,
    ) {
        let mode = if is_semantic_split { "semantic" } else { "UIP" };
        self.write_record(format_args!(
            "core,learned_clause,{clause_len},{decision_level},{trail_size},{total_learned},{mode}"
        ));
    }

    pub(crate) fn log_core_before_backtrack(
        &self,
        decision_level: usize,
        trail_size: usize,
        total_decisions: u64,
    ) {
        self.write_record(format_args!(
            "core,before_backtrack,{decision_level},{trail_size},{total_decisions}"
        ));
    }

    pub(crate) fn log_core_after_backtrack(
        &self,
        decision_level: usize,
        trail_size: usize,
        is_semantic_split: bool,
    ) {
        let mode = if is_semantic_split { "semantic" } else { "UIP" };
        self.write_record(format_args!(
            "core,after_backtrack,{decision_level},{trail_size},{mode}"
        ));
    }

    pub(crate) fn log_core_before_restart(
        &self,
        restart_count: u64,
        decision_level: usize,
        trail_size: usize,
        total_conflicts: u64,
    ) {
        self.write_record(format_args!(
            "core,before_restart,{restart_count},{decision_level},{trail_size},{total_conflicts}"
        ));
    }

    pub(crate) fn log_core_conflict_analysis_start(
        &self,
        trail_size: usize,
        decision_level: usize,
        num_conflicts: usize,
    ) {
        self.write_record(format_args!(
            "core,conflict_analysis_start,{trail_size},{decision_level},{num_conflicts}"
        ));
    }

    pub(crate) fn log_core_conflict_analysis_end(
        &self,
        learned_count: usize,
        backtrack_level: usize,
        decision_level: usize,
    ) {
        self.write_record(format_args!(
            "core,conflict_analysis_end,{learned_count},{backtrack_level},{decision_level}"
        ));
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn log_core_search_end(
        &self,
        decision_level: usize,
        trail_size: usize,
        total_conflicts: u64,
        total_conflict_clauses: u64,
        total_learned_clauses: u64,
        total_decisions: u64,
        total_backtracks: u64,
    ) {
        self.write_record(format_args!(
            "core,search_end,{decision_level},{trail_size},{total_conflicts},{total_conflict_clauses},{total_learned_clauses},{total_decisions},{total_backtracks}"
        ));
    }
}
