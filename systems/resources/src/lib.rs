#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Continuous resource model for the pan.
//!
//! The simulator is a pure function of the current [`ResourceState`], the
//! contacts sampled for the frame, the frame delta and the progress hold gate.
//! It knows nothing about trials or logging; the trial world feeds the gate
//! back in and decides what the produced levels mean.

mod vessel;

use std::time::Duration;

use cooking_trial_core::{AccrualPolicy, EnvironmentFlags, ResourceKind, ResourceState};

pub use vessel::WaterVessel;

/// Shortest fill duration accepted when converting durations into rates.
pub const MIN_FILL_DURATION: Duration = Duration::from_millis(10);

const DEFAULT_BURN_FILL: Duration = Duration::from_secs(20);
const DEFAULT_SALT_FILL: Duration = Duration::from_secs(14);
const DEFAULT_PROGRESS_FILL: Duration = Duration::from_secs(90);
const DEFAULT_DEPLETION: Duration = Duration::from_millis(400);

/// Tuning parameters for the resource model, expressed as time to fill `0 → 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    burn_fill: Duration,
    salt_fill: Duration,
    progress_fill: Duration,
    depletion: Duration,
    policy: AccrualPolicy,
}

impl Config {
    /// Creates a configuration with the provided fill durations.
    ///
    /// Depletion defaults to 0.4 s per full level and accrual requires the pan
    /// to be held.
    #[must_use]
    pub const fn new(burn_fill: Duration, salt_fill: Duration, progress_fill: Duration) -> Self {
        Self {
            burn_fill,
            salt_fill,
            progress_fill,
            depletion: DEFAULT_DEPLETION,
            policy: AccrualPolicy::RequireHeld,
        }
    }

    /// Overrides the time an intervention needs to drain a full level.
    #[must_use]
    pub const fn with_depletion(mut self, depletion: Duration) -> Self {
        self.depletion = depletion;
        self
    }

    /// Overrides the accrual policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: AccrualPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Time for the burnt level to fill while cooking.
    #[must_use]
    pub const fn burn_fill(&self) -> Duration {
        self.burn_fill
    }

    /// Time for the salt level to fill while cooking.
    #[must_use]
    pub const fn salt_fill(&self) -> Duration {
        self.salt_fill
    }

    /// Time for progress to fill while cooking without a hold.
    #[must_use]
    pub const fn progress_fill(&self) -> Duration {
        self.progress_fill
    }

    /// Time an intervention needs to drain a full level.
    #[must_use]
    pub const fn depletion(&self) -> Duration {
        self.depletion
    }

    /// Policy deciding whether holding the pan is required for accrual.
    #[must_use]
    pub const fn policy(&self) -> AccrualPolicy {
        self.policy
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BURN_FILL, DEFAULT_SALT_FILL, DEFAULT_PROGRESS_FILL)
    }
}

/// Contacts sampled for a single simulation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Contacts {
    /// Heat, stir and grab flags for the pan.
    pub flags: EnvironmentFlags,
    /// Water is pouring from the mug into the pan this step.
    pub water_pouring: bool,
    /// The salt shaker overlaps the pan this step.
    pub salt_over_pan: bool,
}

/// Result of a single simulation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Resource levels after the step.
    pub state: ResourceState,
    /// Progress was allowed to advance this step.
    pub progress_accrued: bool,
    water_effect: bool,
    salt_effect: bool,
}

impl Step {
    /// Reports whether an intervention of `kind` lowered its level this step.
    #[must_use]
    pub const fn effect(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Water => self.water_effect,
            ResourceKind::Salt => self.salt_effect,
        }
    }

    /// Interventions that lowered a level this step, in deterministic order.
    pub fn effects(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        ResourceKind::ALL
            .into_iter()
            .filter(move |kind| self.effect(*kind))
    }
}

/// Pure per-frame model of burnt, salt and progress levels.
#[derive(Clone, Debug, Default)]
pub struct ResourceSimulator {
    config: Config,
}

impl ResourceSimulator {
    /// Creates a simulator using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration driving the simulator.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Produces the next resource state.
    ///
    /// Burnt and salt accrue whenever the accrual policy allows it, even while
    /// `progress_held` is set; only progress is frozen by the gate. Depletion
    /// runs after accrual and reports an effect only when the level was above
    /// zero.
    #[must_use]
    pub fn step(
        &self,
        state: ResourceState,
        contacts: Contacts,
        dt: Duration,
        progress_held: bool,
    ) -> Step {
        let seconds = dt.as_secs_f32();
        let mut next = state;
        let accruing = self.config.policy.allows(contacts.flags);

        if accruing {
            next = next
                .with_level(
                    ResourceKind::Water,
                    next.burnt() + rate(seconds, self.config.burn_fill),
                )
                .with_level(
                    ResourceKind::Salt,
                    next.salt() + rate(seconds, self.config.salt_fill),
                );
            if !progress_held {
                next = next.with_progress(next.progress() + rate(seconds, self.config.progress_fill));
            }
        }

        let water_effect =
            contacts.water_pouring && self.deplete(&mut next, ResourceKind::Water, seconds);
        let salt_effect =
            contacts.salt_over_pan && self.deplete(&mut next, ResourceKind::Salt, seconds);

        Step {
            state: next,
            progress_accrued: accruing && !progress_held,
            water_effect,
            salt_effect,
        }
    }

    /// Progress level after `cooked` of eligible cooking time.
    ///
    /// Deriving the level from the accumulated duration reaches exactly `1.0`
    /// once `cooked` equals the progress fill time, whatever the frame length.
    #[must_use]
    pub fn progress_for(&self, cooked: Duration) -> f32 {
        let fill = self.config.progress_fill.max(MIN_FILL_DURATION);
        (cooked.as_secs_f64() / fill.as_secs_f64()).min(1.0) as f32
    }

    fn deplete(&self, state: &mut ResourceState, kind: ResourceKind, seconds: f32) -> bool {
        let level = state.level(kind);
        if level <= 0.0 {
            return false;
        }
        *state = state.with_level(kind, level - rate(seconds, self.config.depletion));
        true
    }
}

fn rate(seconds: f32, fill: Duration) -> f32 {
    seconds / fill.max(MIN_FILL_DURATION).as_secs_f32()
}
