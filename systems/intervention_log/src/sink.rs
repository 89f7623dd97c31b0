use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use cooking_trial_core::TrialSummary;
use thiserror::Error;
use tracing::info;

/// Column names of the trial summary table, in row order.
pub const CSV_HEADER: [&str; 22] = [
    "timestamp_iso",
    "participant_id",
    "session_type",
    "end_reason",
    "success",
    "trial_duration_s",
    "water_episodes",
    "salt_episodes",
    "water_blocked_s",
    "salt_blocked_s",
    "any_blocked_s",
    "on_stove_s",
    "stirring_s",
    "cooking_active_s",
    "pan_grab_count",
    "pan_disengage_count",
    "pan_held_s",
    "peak_burnt",
    "peak_salt",
    "final_burnt",
    "final_salt",
    "final_progress",
];

/// Failures surfaced by summary sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the backing file failed.
    #[error("failed to write trial summary to {path}: {source}")]
    Io {
        /// File the sink was writing to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The sink refused the record for a non-I/O reason.
    #[error("summary sink rejected the record: {0}")]
    Rejected(String),
}

/// Destination for completed trial summaries.
pub trait SummarySink {
    /// Appends one summary record.
    fn append(&mut self, summary: &TrialSummary) -> Result<(), SinkError>;
}

impl<S: SummarySink + ?Sized> SummarySink for Box<S> {
    fn append(&mut self, summary: &TrialSummary) -> Result<(), SinkError> {
        (**self).append(summary)
    }
}

/// Header line of the summary table.
#[must_use]
pub fn header_line() -> String {
    CSV_HEADER.join(",")
}

/// Formats one summary as a comma separated row without a line terminator.
#[must_use]
pub fn format_row(summary: &TrialSummary) -> String {
    let columns = [
        quote(&summary.recorded_at),
        quote(&summary.participant_id),
        quote(&summary.session_type.to_string()),
        quote(summary.end_reason.as_str()),
        u8::from(summary.success).to_string(),
        seconds(summary.duration),
        summary.water_episodes.to_string(),
        summary.salt_episodes.to_string(),
        seconds(summary.water_blocked),
        seconds(summary.salt_blocked),
        seconds(summary.any_blocked),
        seconds(summary.on_heat),
        seconds(summary.stirred),
        seconds(summary.active_cooking),
        summary.grab_count.to_string(),
        summary.disengage_count.to_string(),
        seconds(summary.held),
        level(summary.peak_burnt),
        level(summary.peak_salt),
        level(summary.final_state.burnt()),
        level(summary.final_state.salt()),
        level(summary.final_state.progress()),
    ];
    columns.join(",")
}

/// Wraps free text in double quotes, doubling any embedded quote.
#[must_use]
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn level(value: f32) -> String {
    format!("{value:.3}")
}

/// Appends summaries to a CSV file, writing the header when the file is new or empty.
#[derive(Clone, Debug)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    /// Creates a sink that appends to the provided path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SummarySink for CsvFileSink {
    fn append(&mut self, summary: &TrialSummary) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }

        let needs_header = fs::metadata(&self.path)
            .map(|metadata| metadata.len() == 0)
            .unwrap_or(true);

        let mut text = String::with_capacity(512);
        if needs_header {
            text.push_str(&header_line());
            text.push('\n');
        }
        text.push_str(&format_row(summary));
        text.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        file.write_all(text.as_bytes())
            .map_err(|source| self.io_error(source))?;

        info!(
            path = %self.path.display(),
            trial = summary.trial.get(),
            "trial summary appended"
        );
        Ok(())
    }
}

/// Keeps formatted lines in memory, mirroring the file layout.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    lines: Vec<String>,
    summaries: Vec<TrialSummary>,
}

impl MemorySink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written so far, header first.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Summaries received so far.
    #[must_use]
    pub fn summaries(&self) -> &[TrialSummary] {
        &self.summaries
    }
}

impl SummarySink for MemorySink {
    fn append(&mut self, summary: &TrialSummary) -> Result<(), SinkError> {
        if self.lines.is_empty() {
            self.lines.push(header_line());
        }
        self.lines.push(format_row(summary));
        self.summaries.push(summary.clone());
        Ok(())
    }
}
