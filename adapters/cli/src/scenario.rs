use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use cooking_trial_core::{EnvironmentFlags, FrameSignals};
use cooking_trial_system_arms::{Pose, TargetPoses, TrackingFrame};
use glam::{Quat, Vec3};
use serde::Deserialize;

const DEMO: &str = include_str!("../scenarios/demo.toml");

/// Operator or experimenter action applied when a phase begins.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScenarioAction {
    TriggerWater,
    TriggerSalt,
    Recenter,
    Restart,
    Start,
    End,
    Reset,
}

/// Collaborator signals and tracking held constant for the duration of a phase.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Phase {
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) duration_s: f32,
    #[serde(skip)]
    duration: Duration,
    #[serde(default)]
    pub(crate) actions: Vec<ScenarioAction>,
    #[serde(default)]
    pub(crate) on_heat: bool,
    #[serde(default)]
    pub(crate) stirred: bool,
    #[serde(default)]
    pub(crate) held: bool,
    #[serde(default)]
    pub(crate) water_over_pan: bool,
    #[serde(default)]
    pub(crate) salt_over_pan: bool,
    #[serde(default)]
    pub(crate) vessel_under_faucet: bool,
    #[serde(default)]
    pub(crate) faucet_button: bool,
    #[serde(default)]
    pub(crate) start_sphere_grabbed: bool,
    #[serde(default = "default_head")]
    pub(crate) head: [f32; 3],
    #[serde(default)]
    pub(crate) head_yaw_deg: f32,
    #[serde(default)]
    pub(crate) mug: Option<[f32; 3]>,
    #[serde(default)]
    pub(crate) salt_shaker: Option<[f32; 3]>,
}

fn default_head() -> [f32; 3] {
    [0.0, 1.6, 0.0]
}

impl Phase {
    /// Phase length validated when the scenario was parsed.
    pub(crate) fn duration(&self) -> Duration {
        self.duration
    }

    pub(crate) fn signals(&self) -> FrameSignals {
        FrameSignals {
            environment: EnvironmentFlags::new(self.on_heat, self.stirred, self.held),
            water_source_over_pan: self.water_over_pan,
            salt_source_over_pan: self.salt_over_pan,
            vessel_under_faucet: self.vessel_under_faucet,
            faucet_button_pressed: self.faucet_button,
            start_sphere_grabbed: self.start_sphere_grabbed,
        }
    }

    /// Tracking sampled for the phase, offset by the current rig position.
    pub(crate) fn tracking(&self, rig: Vec3) -> TrackingFrame {
        let rotation = Quat::from_rotation_y(self.head_yaw_deg.to_radians());
        TrackingFrame::from_head(Pose::new(rig + Vec3::from_array(self.head), rotation))
    }

    pub(crate) fn targets(&self, rig: Vec3) -> TargetPoses {
        let place = |position: [f32; 3]| Pose::new(rig + Vec3::from_array(position), Quat::IDENTITY);
        TargetPoses {
            mug: self.mug.map(place),
            salt_shaker: self.salt_shaker.map(place),
        }
    }
}

/// Timed list of phases replayed in place of live input devices.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(rename = "phase", default)]
    pub(crate) phases: Vec<Phase>,
}

impl Scenario {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario at {}", path.display()))
    }

    pub(crate) fn demo() -> Result<Self> {
        Self::parse(DEMO).context("built-in demo scenario is invalid")
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let mut scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if scenario.phases.is_empty() {
            bail!("scenario must contain at least one [[phase]]");
        }
        for (index, phase) in scenario.phases.iter_mut().enumerate() {
            phase.duration = Duration::try_from_secs_f32(phase.duration_s).with_context(|| {
                format!(
                    "phase {index} (`{}`) has invalid duration {}",
                    phase.name, phase.duration_s
                )
            })?;
        }
        Ok(scenario)
    }

    pub(crate) fn total_duration(&self) -> Duration {
        self.phases
            .iter()
            .fold(Duration::ZERO, |total, phase| total.saturating_add(phase.duration()))
    }
}
