#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-trial intervention statistics and summary persistence.
//!
//! The logger observes world events, debounces effect notifications into
//! episodes, accumulates per-trial durations and peaks, and hands a
//! [`TrialSummary`] to a [`SummarySink`] exactly once per trial.

mod episodes;
mod metrics;
mod sink;

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use cooking_trial_core::{
    EndReason, EnvironmentFlags, Event, ResourceKind, ResourceState, SessionType, TrialId,
    TrialSummary,
};
use tracing::{debug, error};

pub use episodes::EpisodeCounter;
pub use sink::{
    format_row, header_line, quote, CsvFileSink, MemorySink, SinkError, SummarySink, CSV_HEADER,
};

use metrics::TrialMetrics;

/// Default inactivity gap that closes an intervention episode.
pub const DEFAULT_EPISODE_GAP: Duration = Duration::from_millis(750);

/// Configuration for the intervention logger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    episode_gap: Duration,
    participant_id: String,
    session_type: SessionType,
}

impl Config {
    /// Creates a configuration for the provided participant and session type.
    #[must_use]
    pub fn new(participant_id: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            episode_gap: DEFAULT_EPISODE_GAP,
            participant_id: participant_id.into(),
            session_type,
        }
    }

    /// Overrides the inactivity gap used for episode debouncing.
    #[must_use]
    pub fn with_episode_gap(mut self, gap: Duration) -> Self {
        self.episode_gap = gap;
        self
    }

    /// Inactivity gap used for episode debouncing.
    #[must_use]
    pub const fn episode_gap(&self) -> Duration {
        self.episode_gap
    }

    /// Participant identifier written to every row.
    #[must_use]
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Session type written to every row.
    #[must_use]
    pub const fn session_type(&self) -> SessionType {
        self.session_type
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(String::new(), SessionType::default())
    }
}

#[derive(Clone, Debug)]
struct ActiveTrial {
    trial: TrialId,
    started_at: Duration,
    metrics: TrialMetrics,
    episodes: [EpisodeCounter; 2],
}

/// Accumulates statistics for the running trial and persists its summary.
#[derive(Debug)]
pub struct InterventionLogger<S> {
    config: Config,
    sink: S,
    active: Option<ActiveTrial>,
    last_summary: Option<TrialSummary>,
}

impl<S: SummarySink> InterventionLogger<S> {
    /// Creates a logger that writes summaries to the provided sink.
    #[must_use]
    pub fn new(config: Config, sink: S) -> Self {
        Self {
            config,
            sink,
            active: None,
            last_summary: None,
        }
    }

    /// Reports whether a trial is being tracked.
    #[must_use]
    pub fn is_trial_active(&self) -> bool {
        self.active.is_some()
    }

    /// Episodes counted so far in the active trial.
    #[must_use]
    pub fn episodes(&self, kind: ResourceKind) -> Option<u32> {
        self.active
            .as_ref()
            .map(|active| active.episodes[kind.index()].episodes())
    }

    /// Summary produced by the most recently ended trial.
    #[must_use]
    pub fn last_summary(&self) -> Option<&TrialSummary> {
        self.last_summary.as_ref()
    }

    /// Sink receiving the summaries.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Resets every counter and begins tracking a new trial.
    pub fn start_trial(&mut self, trial: TrialId, now: Duration, initial_held: bool) {
        let gap = self.config.episode_gap;
        if let Some(previous) = self.active.replace(ActiveTrial {
            trial,
            started_at: now,
            metrics: TrialMetrics::begin(initial_held),
            episodes: [EpisodeCounter::new(gap); 2],
        }) {
            debug!(
                trial = previous.trial.get(),
                "discarding unfinished trial statistics"
            );
        }
    }

    /// Accumulates one frame of statistics. Ignored while no trial is active.
    pub fn track(
        &mut self,
        now: Duration,
        dt: Duration,
        state: &ResourceState,
        progress_held: bool,
        flags: EnvironmentFlags,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        for counter in &mut active.episodes {
            counter.close_if_idle(now);
        }
        active.metrics.track(dt, state, progress_held, flags);
    }

    /// Records an effect notification. Ignored while no trial is active.
    pub fn notify_effect(&mut self, kind: ResourceKind, now: Duration) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.episodes[kind.index()].notify(now) {
            debug!(?kind, at = ?now, "intervention episode opened");
        }
    }

    /// Finalises the active trial and hands its summary to the sink.
    ///
    /// Returns `None` when no trial is active, so repeated calls write a
    /// single record. Sink failures are reported and swallowed.
    pub fn end_trial(
        &mut self,
        now: Duration,
        success: bool,
        reason: EndReason,
        final_state: ResourceState,
    ) -> Option<&TrialSummary> {
        let active = self.active.take()?;
        let metrics = active.metrics;
        let summary = TrialSummary {
            trial: active.trial,
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            participant_id: self.config.participant_id.clone(),
            session_type: self.config.session_type,
            end_reason: reason,
            success,
            duration: now.saturating_sub(active.started_at),
            water_episodes: active.episodes[ResourceKind::Water.index()].episodes(),
            salt_episodes: active.episodes[ResourceKind::Salt.index()].episodes(),
            water_blocked: metrics.water_blocked,
            salt_blocked: metrics.salt_blocked,
            any_blocked: metrics.any_blocked,
            on_heat: metrics.on_heat,
            stirred: metrics.stirred,
            active_cooking: metrics.active_cooking,
            grab_count: metrics.grab_count,
            disengage_count: metrics.disengage_count,
            held: metrics.held,
            peak_burnt: metrics.peak_burnt,
            peak_salt: metrics.peak_salt,
            final_state,
        };

        if let Err(err) = self.sink.append(&summary) {
            error!(
                trial = summary.trial.get(),
                error = %err,
                "failed to persist trial summary"
            );
        }
        self.last_summary = Some(summary);
        self.last_summary.as_ref()
    }

    /// Consumes world events relevant to trial statistics.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TrialStarted {
                    trial,
                    at,
                    initial_held,
                } => self.start_trial(*trial, *at, *initial_held),
                Event::ResourcesUpdated {
                    dt,
                    at,
                    state,
                    flags,
                    progress_held,
                } => self.track(*at, *dt, state, *progress_held, *flags),
                Event::EffectApplied { kind, at } => self.notify_effect(*kind, *at),
                Event::TrialEnded {
                    at,
                    success,
                    reason,
                    final_state,
                    ..
                } => {
                    let _ = self.end_trial(*at, *success, reason.clone(), *final_state);
                }
                _ => {}
            }
        }
    }
}
