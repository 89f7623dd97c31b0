#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative trial state for the cooking experiment.
//!
//! The world owns the trial lifecycle, the resource levels of the running
//! trial, the mug's water and the one-shot automation deadlines. Adapters
//! mutate it exclusively through [`apply`] and observe it through [`query`].

mod automation;

use std::time::Duration;

use cooking_trial_core::{
    Command, EndReason, Event, FrameSignals, ResourceKind, ResourceState, TrialId, TrialPhase,
};
use cooking_trial_system_resources::{
    Config as SimulationConfig, Contacts, ResourceSimulator, WaterVessel,
};
use tracing::{debug, info};

use automation::OneShots;

/// Shortest automation window accepted for a one-shot clip.
pub const MIN_CLIP_DURATION: Duration = Duration::from_millis(10);

const DEFAULT_WATER_CLIP: Duration = Duration::from_secs(6);
const DEFAULT_SALT_CLIP: Duration = Duration::from_secs(4);

/// Configuration parameters required to construct the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    simulation: SimulationConfig,
    clips: [Duration; 2],
    vessel: WaterVessel,
    auto_start: bool,
}

impl Config {
    /// Creates a configuration around the provided simulation tuning.
    #[must_use]
    pub fn new(simulation: SimulationConfig) -> Self {
        Self {
            simulation,
            clips: [DEFAULT_WATER_CLIP, DEFAULT_SALT_CLIP],
            vessel: WaterVessel::default(),
            auto_start: false,
        }
    }

    /// Overrides the automation clip duration for the provided resource.
    #[must_use]
    pub fn with_clip(mut self, kind: ResourceKind, clip: Duration) -> Self {
        self.clips[kind.index()] = clip;
        self
    }

    /// Overrides the durations the mug needs to fill and to empty.
    #[must_use]
    pub fn with_vessel(mut self, fill: Duration, pour: Duration) -> Self {
        self.vessel = WaterVessel::new(fill, pour);
        self
    }

    /// Starts a trial on the first tick after construction or restart.
    #[must_use]
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Simulation tuning forwarded to the resource simulator.
    #[must_use]
    pub const fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// Automation window for the provided resource, before clamping.
    #[must_use]
    pub const fn clip(&self, kind: ResourceKind) -> Duration {
        self.clips[kind.index()]
    }

    /// Whether a trial starts without waiting for the start sphere.
    #[must_use]
    pub const fn auto_start(&self) -> bool {
        self.auto_start
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

/// Represents the authoritative trial world.
#[derive(Debug)]
pub struct World {
    config: Config,
    simulator: ResourceSimulator,
    vessel: WaterVessel,
    now: Duration,
    phase: TrialPhase,
    trial: Option<Trial>,
    next_trial: u32,
    resources: ResourceState,
    cooked: Duration,
    progress_held: bool,
    one_shots: OneShots,
    signals: FrameSignals,
    faucet_dispensing: bool,
    start_sphere_latched: bool,
    start_sphere_visible: bool,
    auto_start_pending: bool,
    interactables_enabled: bool,
    completion_visible: bool,
}

impl World {
    /// Creates a new world using default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new world using the supplied configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            simulator: ResourceSimulator::new(config.simulation),
            vessel: config.vessel.clone(),
            auto_start_pending: config.auto_start,
            config,
            now: Duration::ZERO,
            phase: TrialPhase::Idle,
            trial: None,
            next_trial: 0,
            resources: ResourceState::default(),
            cooked: Duration::ZERO,
            progress_held: false,
            one_shots: OneShots::default(),
            signals: FrameSignals::default(),
            faucet_dispensing: false,
            start_sphere_latched: false,
            start_sphere_visible: true,
            interactables_enabled: true,
            completion_visible: false,
        }
    }

    fn tick(&mut self, dt: Duration, signals: FrameSignals, out_events: &mut Vec<Event>) {
        self.now = self.now.saturating_add(dt);
        self.signals = signals;
        out_events.push(Event::TimeAdvanced { dt, at: self.now });

        if self.auto_start_pending {
            self.auto_start_pending = false;
            self.start_trial(out_events);
        }
        self.observe_start_sphere(signals.start_sphere_grabbed, out_events);

        self.update_faucet(dt, out_events);
        let water_pouring = signals.water_source_over_pan && self.vessel.pour(dt);

        if self.phase == TrialPhase::Running {
            self.simulate(dt, water_pouring, out_events);
        }

        self.release_due_one_shots(out_events);
    }

    fn observe_start_sphere(&mut self, grabbed: bool, out_events: &mut Vec<Event>) {
        if !self.start_sphere_visible {
            return;
        }
        if grabbed {
            self.start_sphere_latched = true;
            return;
        }
        if self.start_sphere_latched {
            self.start_sphere_latched = false;
            self.start_sphere_visible = false;
            self.start_trial(out_events);
        }
    }

    fn update_faucet(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let dispensing =
            self.signals.faucet_button_pressed || self.one_shots.is_pending(ResourceKind::Water);
        if dispensing != self.faucet_dispensing {
            self.faucet_dispensing = dispensing;
            out_events.push(Event::FaucetChanged { dispensing });
        }
        if dispensing && self.signals.vessel_under_faucet {
            self.vessel.fill(dt);
        }
    }

    fn simulate(&mut self, dt: Duration, water_pouring: bool, out_events: &mut Vec<Event>) {
        let gate = self.resources.progress_held();
        let contacts = Contacts {
            flags: self.signals.environment,
            water_pouring,
            salt_over_pan: self.signals.salt_source_over_pan,
        };
        let step = self.simulator.step(self.resources, contacts, dt, gate);
        if step.progress_accrued {
            self.cooked = self.cooked.saturating_add(dt);
        }
        let progress = self.simulator.progress_for(self.cooked);
        debug_assert!(progress >= self.resources.progress());
        self.resources = step.state.with_progress(progress);

        for kind in step.effects() {
            out_events.push(Event::EffectApplied { kind, at: self.now });
        }
        out_events.push(Event::ResourcesUpdated {
            dt,
            at: self.now,
            state: self.resources,
            flags: self.signals.environment,
            progress_held: gate,
        });
        self.refresh_progress_hold(out_events);

        if self.resources.is_complete() {
            self.end_trial(true, EndReason::Completed, out_events);
        }
    }

    fn refresh_progress_hold(&mut self, out_events: &mut Vec<Event>) {
        let held = self.resources.progress_held();
        if held != self.progress_held {
            self.progress_held = held;
            out_events.push(Event::ProgressHoldChanged { held });
        }
    }

    fn start_trial(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == TrialPhase::Running {
            debug!("start ignored: a trial is already running");
            return;
        }

        self.release_all_one_shots(out_events);
        self.resources = ResourceState::default();
        self.cooked = Duration::ZERO;
        self.refresh_progress_hold(out_events);

        let id = TrialId::new(self.next_trial);
        self.next_trial = self.next_trial.saturating_add(1);
        self.trial = Some(Trial::begin(id, self.now));
        self.phase = TrialPhase::Running;
        self.start_sphere_visible = false;
        self.start_sphere_latched = false;
        self.interactables_enabled = true;
        self.completion_visible = false;

        info!(trial = id.get(), at = ?self.now, "trial started");
        out_events.push(Event::TrialStarted {
            trial: id,
            at: self.now,
            initial_held: self.signals.environment.is_held,
        });
    }

    fn end_trial(&mut self, success: bool, reason: EndReason, out_events: &mut Vec<Event>) {
        if self.phase != TrialPhase::Running {
            debug!(%reason, "end ignored: no trial is running");
            return;
        }
        let Some(trial) = self.trial.as_mut() else {
            debug!(%reason, "end ignored: running phase without a trial record");
            return;
        };

        trial.finish(self.now, success, reason.clone(), self.resources);
        let id = trial.id;
        self.phase = TrialPhase::Ended;
        self.interactables_enabled = false;
        self.completion_visible = success;
        self.release_all_one_shots(out_events);

        info!(trial = id.get(), success, %reason, at = ?self.now, "trial ended");
        out_events.push(Event::TrialEnded {
            trial: id,
            at: self.now,
            success,
            reason,
            final_state: self.resources,
        });
    }

    fn reset_trial(&mut self, out_events: &mut Vec<Event>) {
        match self.phase {
            TrialPhase::Running => {
                debug!("reset ignored: end the running trial first");
            }
            TrialPhase::Idle => {
                debug!("reset ignored: world is already idle");
            }
            TrialPhase::Ended => {
                self.phase = TrialPhase::Idle;
                self.trial = None;
                self.resources = ResourceState::default();
                self.cooked = Duration::ZERO;
                self.refresh_progress_hold(out_events);
                self.interactables_enabled = true;
                self.completion_visible = false;
                self.start_sphere_visible = true;
                out_events.push(Event::TrialReset);
            }
        }
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        self.end_trial(false, EndReason::Restart, out_events);
        self.release_all_one_shots(out_events);

        let now = self.now;
        let next_trial = self.next_trial;
        let held = self.progress_held;
        *self = Self::with_config(self.config.clone());
        self.now = now;
        self.next_trial = next_trial;
        self.progress_held = held;
        self.refresh_progress_hold(out_events);

        info!(at = ?self.now, "world restarted");
        out_events.push(Event::TrialReset);
    }

    fn trigger_one_shot(&mut self, kind: ResourceKind, out_events: &mut Vec<Event>) {
        let ends_at = self
            .now
            .saturating_add(self.config.clip(kind).max(MIN_CLIP_DURATION));
        if !self.one_shots.schedule(kind, ends_at) {
            debug!(?kind, "one-shot ignored: automation already pending");
            return;
        }

        let arm = kind.arm();
        info!(?kind, ?arm, ends_at = ?ends_at, "one-shot automation engaged");
        out_events.push(Event::AutomationEngaged {
            kind,
            arm,
            target: kind.target(),
            ends_at,
        });
    }

    fn release_due_one_shots(&mut self, out_events: &mut Vec<Event>) {
        for kind in ResourceKind::ALL {
            if self.one_shots.is_due(kind, self.now) {
                self.release_one_shot(kind, out_events);
            }
        }
    }

    fn release_all_one_shots(&mut self, out_events: &mut Vec<Event>) {
        for kind in ResourceKind::ALL {
            self.release_one_shot(kind, out_events);
        }
    }

    fn release_one_shot(&mut self, kind: ResourceKind, out_events: &mut Vec<Event>) {
        if !self.one_shots.release(kind) {
            return;
        }
        let arm = kind.arm();
        info!(?kind, ?arm, at = ?self.now, "one-shot automation released");
        out_events.push(Event::AutomationReleased { kind, arm });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartTrial => world.start_trial(out_events),
        Command::EndTrial { success, reason } => world.end_trial(success, reason, out_events),
        Command::ResetTrial => world.reset_trial(out_events),
        Command::Restart => world.restart(out_events),
        Command::TriggerOneShot { kind } => world.trigger_one_shot(kind, out_events),
        Command::Tick { dt, signals } => world.tick(dt, signals, out_events),
    }
}

#[derive(Clone, Debug)]
struct Trial {
    id: TrialId,
    started_at: Duration,
    outcome: Option<TrialOutcome>,
}

#[derive(Clone, Debug)]
struct TrialOutcome {
    ended_at: Duration,
    success: bool,
    reason: EndReason,
    final_state: ResourceState,
}

impl Trial {
    fn begin(id: TrialId, started_at: Duration) -> Self {
        Self {
            id,
            started_at,
            outcome: None,
        }
    }

    fn finish(
        &mut self,
        ended_at: Duration,
        success: bool,
        reason: EndReason,
        final_state: ResourceState,
    ) {
        self.outcome = Some(TrialOutcome {
            ended_at,
            success,
            reason,
            final_state,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use cooking_trial_core::{
        AutomatedObject, EndReason, FrameSignals, ResourceKind, ResourceState, TrialId, TrialPhase,
    };

    use super::World;

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> TrialPhase {
        world.phase
    }

    /// Simulation time accumulated from ticks.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Resource levels of the current or last trial.
    #[must_use]
    pub fn resources(world: &World) -> ResourceState {
        world.resources
    }

    /// Whether progress is currently held by a saturated resource.
    #[must_use]
    pub fn progress_held(world: &World) -> bool {
        world.progress_held
    }

    /// Whether the provided collaborator object is under automated control.
    #[must_use]
    pub fn is_automated(world: &World, object: AutomatedObject) -> bool {
        world.one_shots.is_pending(object.kind())
    }

    /// Simulation time at which the pending one-shot for `kind` hands back control.
    #[must_use]
    pub fn one_shot_deadline(world: &World, kind: ResourceKind) -> Option<Duration> {
        world.one_shots.deadline(kind)
    }

    /// Whether the faucet is dispensing, which also drives its progress indicator.
    #[must_use]
    pub fn faucet_dispensing(world: &World) -> bool {
        world.faucet_dispensing
    }

    /// Water level inside the mug.
    #[must_use]
    pub fn vessel_level(world: &World) -> f32 {
        world.vessel.level()
    }

    /// Whether the faucet, mug, pan and spatula accept interaction.
    #[must_use]
    pub fn interactables_enabled(world: &World) -> bool {
        world.interactables_enabled
    }

    /// Whether the completion message should be shown.
    #[must_use]
    pub fn completion_visible(world: &World) -> bool {
        world.completion_visible
    }

    /// Whether the start sphere and tutorial panels should be shown.
    #[must_use]
    pub fn start_sphere_visible(world: &World) -> bool {
        world.start_sphere_visible
    }

    /// Signals sampled by the most recent tick.
    #[must_use]
    pub fn signals(world: &World) -> FrameSignals {
        world.signals
    }

    /// Captures a read-only snapshot of the current or last trial.
    #[must_use]
    pub fn trial(world: &World) -> Option<TrialSnapshot> {
        world.trial.as_ref().map(|trial| {
            let outcome = trial.outcome.as_ref();
            TrialSnapshot {
                id: trial.id,
                phase: world.phase,
                started_at: trial.started_at,
                ended_at: outcome.map(|outcome| outcome.ended_at),
                success: outcome.map(|outcome| outcome.success),
                end_reason: outcome.map(|outcome| outcome.reason.clone()),
                final_state: outcome.map(|outcome| outcome.final_state),
            }
        })
    }

    /// Immutable representation of a trial used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct TrialSnapshot {
        /// Identifier allocated to the trial.
        pub id: TrialId,
        /// Lifecycle phase of the world when captured.
        pub phase: TrialPhase,
        /// Simulation time at which the trial started.
        pub started_at: Duration,
        /// Simulation time at which the trial ended, once ended.
        pub ended_at: Option<Duration>,
        /// Whether the trial succeeded, once ended.
        pub success: Option<bool>,
        /// Reason the trial ended, once ended.
        pub end_reason: Option<EndReason>,
        /// Resource levels when the trial ended, once ended.
        pub final_state: Option<ResourceState>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_world() -> (World, Vec<Event>) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartTrial, &mut events);
        (world, events)
    }

    #[test]
    fn start_is_ignored_while_running() {
        let (mut world, mut events) = started_world();
        apply(&mut world, Command::StartTrial, &mut events);

        let starts = events
            .iter()
            .filter(|event| matches!(event, Event::TrialStarted { .. }))
            .count();
        assert_eq!(starts, 1);
        assert_eq!(query::trial(&world).map(|trial| trial.id), Some(TrialId::new(0)));
    }

    #[test]
    fn end_is_ignored_while_idle() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::EndTrial {
                success: false,
                reason: EndReason::Ended,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::phase(&world), TrialPhase::Idle);
    }

    #[test]
    fn reset_returns_ended_trial_to_idle() {
        let (mut world, mut events) = started_world();
        apply(&mut world, Command::ResetTrial, &mut events);
        assert_eq!(query::phase(&world), TrialPhase::Running, "reset needs an ended trial");

        apply(
            &mut world,
            Command::EndTrial {
                success: false,
                reason: EndReason::Other("aborted".to_owned()),
            },
            &mut events,
        );
        assert!(!query::interactables_enabled(&world));
        assert!(!query::completion_visible(&world));

        events.clear();
        apply(&mut world, Command::ResetTrial, &mut events);
        assert_eq!(events, vec![Event::TrialReset]);
        assert_eq!(query::phase(&world), TrialPhase::Idle);
        assert!(query::trial(&world).is_none());
        assert!(query::start_sphere_visible(&world));
    }

    #[test]
    fn start_sphere_release_starts_trial() {
        let mut world = World::new();
        let mut events = Vec::new();
        let grabbed = FrameSignals {
            start_sphere_grabbed: true,
            ..FrameSignals::default()
        };

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
                signals: grabbed,
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), TrialPhase::Idle, "grab alone does not start");

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
                signals: FrameSignals::default(),
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), TrialPhase::Running);
        assert!(!query::start_sphere_visible(&world));
    }

    #[test]
    fn auto_start_begins_on_first_tick() {
        let mut world = World::with_config(Config::default().with_auto_start(true));
        let mut events = Vec::new();
        assert_eq!(query::phase(&world), TrialPhase::Idle);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
                signals: FrameSignals::default(),
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), TrialPhase::Running);
    }
}
