#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the cooking-trial engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative trial world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams and respond with
//! new command batches or adapter-facing outputs.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Level at which a resource is considered saturated and blocks progress.
pub const SATURATION_LEVEL: f32 = 1.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that a new trial begin. Ignored while a trial is running.
    StartTrial,
    /// Requests that the running trial end. Ignored unless a trial is running.
    EndTrial {
        /// Whether the trial should be recorded as successful.
        success: bool,
        /// Reason recorded alongside the trial summary.
        reason: EndReason,
    },
    /// Returns an ended trial to the idle phase.
    ResetTrial,
    /// Aborts any running trial with [`EndReason::Restart`] and resets the world.
    Restart,
    /// Requests a time-boxed delegation of the provided resource's sub-task.
    TriggerOneShot {
        /// Resource whose intervention should be automated.
        kind: ResourceKind,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
        /// Collaborator signals sampled for this frame.
        signals: FrameSignals,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Simulation time after the tick.
        at: Duration,
    },
    /// Confirms that a trial entered the running phase.
    TrialStarted {
        /// Identifier allocated to the trial.
        trial: TrialId,
        /// Simulation time at which the trial started.
        at: Duration,
        /// Whether the pan was already held when the trial started.
        initial_held: bool,
    },
    /// Reports the resource levels produced by a running tick.
    ResourcesUpdated {
        /// Duration of simulated time covered by the update.
        dt: Duration,
        /// Simulation time after the update.
        at: Duration,
        /// Resource levels after the update.
        state: ResourceState,
        /// Environment flags observed during the update.
        flags: EnvironmentFlags,
        /// Whether progress was held while the update was computed.
        progress_held: bool,
    },
    /// Reports that an intervention lowered a resource level during a tick.
    EffectApplied {
        /// Resource lowered by the intervention.
        kind: ResourceKind,
        /// Simulation time of the effect.
        at: Duration,
    },
    /// Announces that the progress hold gate changed.
    ProgressHoldChanged {
        /// Whether progress is now held.
        held: bool,
    },
    /// Announces that the faucet started or stopped dispensing.
    FaucetChanged {
        /// Whether the faucet is now dispensing.
        dispensing: bool,
    },
    /// Confirms that an automation took over a resource's sub-task.
    AutomationEngaged {
        /// Resource whose sub-task is automated.
        kind: ResourceKind,
        /// Arm delegated to the sub-task.
        arm: Arm,
        /// Object the arm should track.
        target: AutomationTarget,
        /// Simulation time at which the automation hands control back.
        ends_at: Duration,
    },
    /// Confirms that an automation handed control back.
    AutomationReleased {
        /// Resource whose sub-task is no longer automated.
        kind: ResourceKind,
        /// Arm released from the sub-task.
        arm: Arm,
    },
    /// Confirms that the running trial ended.
    TrialEnded {
        /// Identifier of the trial that ended.
        trial: TrialId,
        /// Simulation time at which the trial ended.
        at: Duration,
        /// Whether the trial was successful.
        success: bool,
        /// Reason the trial ended.
        reason: EndReason,
        /// Resource levels at the moment the trial ended.
        final_state: ResourceState,
    },
    /// Confirms that the world returned to the idle phase.
    TrialReset,
}

/// Resources the participant keeps in balance, each paired with an intervention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Pouring water lowers the burnt level.
    Water,
    /// Adding salt lowers the salt level.
    Salt,
}

impl ResourceKind {
    /// Every resource kind in deterministic order.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Water, ResourceKind::Salt];

    /// Arm delegated to this resource's sub-task during automation.
    #[must_use]
    pub const fn arm(self) -> Arm {
        match self {
            Self::Water => Arm::Left,
            Self::Salt => Arm::Right,
        }
    }

    /// Object the delegated arm tracks during automation.
    #[must_use]
    pub const fn target(self) -> AutomationTarget {
        match self {
            Self::Water => AutomationTarget::Mug,
            Self::Salt => AutomationTarget::SaltShaker,
        }
    }

    /// Zero-based index used for per-kind storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Water => 0,
            Self::Salt => 1,
        }
    }
}

/// Robot arms available to automation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arm {
    /// Arm mounted on the participant's left.
    Left,
    /// Arm mounted on the participant's right.
    Right,
}

impl Arm {
    /// Both arms in deterministic order.
    pub const ALL: [Arm; 2] = [Arm::Left, Arm::Right];

    /// Sign applied to lateral offsets so the arms mirror each other.
    #[must_use]
    pub const fn lateral_sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Objects an automated arm can reach for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomationTarget {
    /// Water mug carried between faucet and pan.
    Mug,
    /// Salt shaker emptied over the pan.
    SaltShaker,
}

/// Collaborator objects that expose an automated flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AutomatedObject {
    /// Faucet that fills the mug.
    Faucet,
    /// Mug that carries water to the pan.
    Mug,
    /// Salt shaker.
    SaltShaker,
}

impl AutomatedObject {
    /// Every automatable object in deterministic order.
    pub const ALL: [AutomatedObject; 3] = [
        AutomatedObject::Faucet,
        AutomatedObject::Mug,
        AutomatedObject::SaltShaker,
    ];

    /// Resource whose one-shot automation drives this object.
    #[must_use]
    pub const fn kind(self) -> ResourceKind {
        match self {
            Self::Faucet | Self::Mug => ResourceKind::Water,
            Self::SaltShaker => ResourceKind::Salt,
        }
    }
}

/// Continuous resource levels tracked on the pan.
///
/// Every level is clamped into `[0, 1]` on construction, on every update and
/// when deserialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawResourceState")]
pub struct ResourceState {
    burnt: f32,
    salt: f32,
    progress: f32,
}

impl ResourceState {
    /// Creates a new state, clamping every level into `[0, 1]`.
    #[must_use]
    pub fn new(burnt: f32, salt: f32, progress: f32) -> Self {
        Self {
            burnt: clamp_level(burnt),
            salt: clamp_level(salt),
            progress: clamp_level(progress),
        }
    }

    /// How burnt the meal is.
    #[must_use]
    pub const fn burnt(&self) -> f32 {
        self.burnt
    }

    /// How much salt the meal still needs.
    #[must_use]
    pub const fn salt(&self) -> f32 {
        self.salt
    }

    /// Cooking progress towards completion.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Level lowered by interventions of the provided kind.
    #[must_use]
    pub const fn level(&self, kind: ResourceKind) -> f32 {
        match kind {
            ResourceKind::Water => self.burnt,
            ResourceKind::Salt => self.salt,
        }
    }

    /// Returns a copy with the level for `kind` replaced (clamped).
    #[must_use]
    pub fn with_level(self, kind: ResourceKind, value: f32) -> Self {
        match kind {
            ResourceKind::Water => Self {
                burnt: clamp_level(value),
                ..self
            },
            ResourceKind::Salt => Self {
                salt: clamp_level(value),
                ..self
            },
        }
    }

    /// Returns a copy with progress replaced (clamped).
    #[must_use]
    pub fn with_progress(self, value: f32) -> Self {
        Self {
            progress: clamp_level(value),
            ..self
        }
    }

    /// Reports whether the level for `kind` reached saturation.
    #[must_use]
    pub fn is_saturated(&self, kind: ResourceKind) -> bool {
        self.level(kind) >= SATURATION_LEVEL
    }

    /// Reports whether any saturated resource holds progress.
    #[must_use]
    pub fn progress_held(&self) -> bool {
        ResourceKind::ALL.iter().any(|kind| self.is_saturated(*kind))
    }

    /// Reports whether the meal finished cooking.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }
}

#[derive(Deserialize)]
struct RawResourceState {
    burnt: f32,
    salt: f32,
    progress: f32,
}

impl From<RawResourceState> for ResourceState {
    fn from(raw: RawResourceState) -> Self {
        Self::new(raw.burnt, raw.salt, raw.progress)
    }
}

fn clamp_level(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Transient environment booleans sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentFlags {
    /// The pan rests over the heat source.
    pub on_heat: bool,
    /// The stirrer overlaps the pan.
    pub is_stirred: bool,
    /// The pan is grasped.
    pub is_held: bool,
}

impl EnvironmentFlags {
    /// Creates a new set of environment flags.
    #[must_use]
    pub const fn new(on_heat: bool, is_stirred: bool, is_held: bool) -> Self {
        Self {
            on_heat,
            is_stirred,
            is_held,
        }
    }
}

/// Every collaborator signal sampled for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSignals {
    /// Pan-related environment flags.
    pub environment: EnvironmentFlags,
    /// The mug overlaps the pan.
    pub water_source_over_pan: bool,
    /// The salt shaker overlaps the pan.
    pub salt_source_over_pan: bool,
    /// The mug sits under the faucet spout.
    pub vessel_under_faucet: bool,
    /// A hand presses the faucet button.
    pub faucet_button_pressed: bool,
    /// The start sphere is grabbed.
    pub start_sphere_grabbed: bool,
}

/// Lifecycle phase of the trial world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialPhase {
    /// No trial has been started since the last reset.
    #[default]
    Idle,
    /// A trial is in progress.
    Running,
    /// The last trial ended and awaits a reset or a new start.
    Ended,
}

/// Unique identifier assigned to a trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialId(u32);

impl TrialId {
    /// Creates a new trial identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reason recorded when a trial ends.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Progress reached completion.
    Completed,
    /// The trial was ended externally.
    Ended,
    /// The session was restarted while the trial was running.
    Restart,
    /// Any other externally supplied reason.
    Other(String),
}

impl EndReason {
    /// Text written to the trial summary.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "completed",
            Self::Ended => "ended",
            Self::Restart => "restart",
            Self::Other(reason) => reason,
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Experimental condition under which a session runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Participant performs every intervention manually.
    #[default]
    Manual,
    /// Automation runs when the participant requests it.
    Request,
    /// Automation runs without being requested.
    Auto,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Manual => "Manual",
            Self::Request => "Request",
            Self::Auto => "Auto",
        };
        f.write_str(label)
    }
}

/// Whether grasping the pan is required for burnt, salt and progress to accrue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualPolicy {
    /// Accrual requires the pan to be on heat, stirred and held.
    #[default]
    RequireHeld,
    /// Accrual requires the pan to be on heat and stirred.
    IgnoreHeld,
}

impl AccrualPolicy {
    /// Reports whether the provided flags allow accrual under this policy.
    #[must_use]
    pub const fn allows(self, flags: EnvironmentFlags) -> bool {
        let cooking = flags.on_heat && flags.is_stirred;
        match self {
            Self::RequireHeld => cooking && flags.is_held,
            Self::IgnoreHeld => cooking,
        }
    }
}

/// Aggregate statistics recorded for one completed trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Identifier of the summarised trial.
    pub trial: TrialId,
    /// ISO-8601 UTC wall-clock time at which the summary was produced.
    pub recorded_at: String,
    /// Participant identifier, possibly empty.
    pub participant_id: String,
    /// Experimental condition of the session.
    pub session_type: SessionType,
    /// Reason the trial ended.
    pub end_reason: EndReason,
    /// Whether the trial was successful.
    pub success: bool,
    /// Elapsed simulation time between start and end.
    pub duration: Duration,
    /// Debounced water interventions.
    pub water_episodes: u32,
    /// Debounced salt interventions.
    pub salt_episodes: u32,
    /// Time spent with the burnt level saturated.
    pub water_blocked: Duration,
    /// Time spent with the salt level saturated.
    pub salt_blocked: Duration,
    /// Time spent with either level saturated.
    pub any_blocked: Duration,
    /// Time spent with the pan over heat.
    pub on_heat: Duration,
    /// Time spent stirring.
    pub stirred: Duration,
    /// Time spent on heat, stirring, with progress not held.
    pub active_cooking: Duration,
    /// Number of times the pan was grasped.
    pub grab_count: u32,
    /// Number of times the pan was released.
    pub disengage_count: u32,
    /// Time spent holding the pan.
    pub held: Duration,
    /// Highest burnt level observed.
    pub peak_burnt: f32,
    /// Highest salt level observed.
    pub peak_salt: f32,
    /// Resource levels at the end of the trial.
    pub final_state: ResourceState,
}

impl TrialSummary {
    /// Number of debounced episodes recorded for the provided kind.
    #[must_use]
    pub const fn episodes(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Water => self.water_episodes,
            ResourceKind::Salt => self.salt_episodes,
        }
    }
}
