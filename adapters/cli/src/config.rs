use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use cooking_trial_core::{AccrualPolicy, ResourceKind, SessionType};
use cooking_trial_system_arms::Config as ArmsConfig;
use cooking_trial_system_intervention_log::Config as LoggerConfig;
use cooking_trial_system_resources::Config as SimulationConfig;
use cooking_trial_world::Config as WorldConfig;
use glam::Vec3;
use serde::Deserialize;

/// Experiment tuning loaded from an optional TOML file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ExperimentConfig {
    pub(crate) simulation: SimulationSection,
    pub(crate) automation: AutomationSection,
    pub(crate) logging: LoggingSection,
    pub(crate) arms: ArmsSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationSection {
    pub(crate) burn_fill_s: f32,
    pub(crate) salt_fill_s: f32,
    pub(crate) progress_fill_s: f32,
    pub(crate) depletion_s: f32,
    pub(crate) accrual_policy: AccrualPolicy,
    pub(crate) vessel_fill_s: f32,
    pub(crate) vessel_pour_s: f32,
    pub(crate) auto_start: bool,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            burn_fill_s: 20.0,
            salt_fill_s: 14.0,
            progress_fill_s: 90.0,
            depletion_s: 0.4,
            accrual_policy: AccrualPolicy::default(),
            vessel_fill_s: 7.5,
            vessel_pour_s: 2.0,
            auto_start: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AutomationSection {
    pub(crate) water_clip_s: f32,
    pub(crate) salt_clip_s: f32,
}

impl Default for AutomationSection {
    fn default() -> Self {
        Self {
            water_clip_s: 6.0,
            salt_clip_s: 4.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LoggingSection {
    pub(crate) enabled: bool,
    pub(crate) output: PathBuf,
    pub(crate) participant_id: String,
    pub(crate) session_type: SessionType,
    pub(crate) episode_gap_s: f32,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            output: PathBuf::from("trial_summaries.csv"),
            participant_id: String::new(),
            session_type: SessionType::default(),
            episode_gap_s: 0.75,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ArmsSection {
    pub(crate) shoulder_offset: [f32; 3],
    pub(crate) elbow_offset: [f32; 3],
    pub(crate) rest_hand_offset: [f32; 3],
    pub(crate) rest_lift: f32,
    pub(crate) inward_nudge: f32,
}

impl Default for ArmsSection {
    fn default() -> Self {
        let defaults = ArmsConfig::default();
        Self {
            shoulder_offset: defaults.shoulder_offset().to_array(),
            elbow_offset: defaults.elbow_offset().to_array(),
            rest_hand_offset: defaults.rest_hand_offset().to_array(),
            rest_lift: defaults.rest_lift(),
            inward_nudge: defaults.inward_nudge(),
        }
    }
}

impl ExperimentConfig {
    /// Reads and parses an experiment file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read experiment config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid experiment config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse experiment config toml contents")
    }

    pub(crate) fn world_config(&self) -> Result<WorldConfig> {
        let simulation = &self.simulation;
        let tuning = SimulationConfig::new(
            seconds(simulation.burn_fill_s, "simulation.burn_fill_s")?,
            seconds(simulation.salt_fill_s, "simulation.salt_fill_s")?,
            seconds(simulation.progress_fill_s, "simulation.progress_fill_s")?,
        )
        .with_depletion(seconds(simulation.depletion_s, "simulation.depletion_s")?)
        .with_policy(simulation.accrual_policy);

        Ok(WorldConfig::new(tuning)
            .with_clip(
                ResourceKind::Water,
                seconds(self.automation.water_clip_s, "automation.water_clip_s")?,
            )
            .with_clip(
                ResourceKind::Salt,
                seconds(self.automation.salt_clip_s, "automation.salt_clip_s")?,
            )
            .with_vessel(
                seconds(simulation.vessel_fill_s, "simulation.vessel_fill_s")?,
                seconds(simulation.vessel_pour_s, "simulation.vessel_pour_s")?,
            )
            .with_auto_start(simulation.auto_start))
    }

    pub(crate) fn logger_config(&self) -> Result<LoggerConfig> {
        let logging = &self.logging;
        Ok(
            LoggerConfig::new(logging.participant_id.clone(), logging.session_type)
                .with_episode_gap(seconds(logging.episode_gap_s, "logging.episode_gap_s")?),
        )
    }

    pub(crate) fn arms_config(&self) -> ArmsConfig {
        let arms = &self.arms;
        ArmsConfig::new(
            Vec3::from_array(arms.shoulder_offset),
            Vec3::from_array(arms.elbow_offset),
            Vec3::from_array(arms.rest_hand_offset),
        )
        .with_rest_adjustment(arms.rest_lift, arms.inward_nudge)
    }
}

fn seconds(value: f32, field: &str) -> Result<Duration> {
    Duration::try_from_secs_f32(value)
        .with_context(|| format!("`{field}` must be a finite, non-negative number of seconds"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ExperimentConfig::parse("").expect("empty config is valid");
        assert_eq!(config, ExperimentConfig::default());

        let world = config.world_config().expect("defaults are valid");
        assert_eq!(world.clip(ResourceKind::Water), Duration::from_secs(6));
        assert_eq!(world.clip(ResourceKind::Salt), Duration::from_secs(4));
        assert_eq!(world.simulation().progress_fill(), Duration::from_secs(90));
        assert_eq!(config.arms_config(), ArmsConfig::default());
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = ExperimentConfig::parse(
            r#"
            [simulation]
            burn_fill_s = 10.0
            accrual_policy = "ignore_held"
            auto_start = true

            [logging]
            participant_id = "p07"
            session_type = "request"
            "#,
        )
        .expect("valid config");

        let world = config.world_config().expect("valid tuning");
        assert_eq!(world.simulation().burn_fill(), Duration::from_secs(10));
        assert_eq!(world.simulation().salt_fill(), Duration::from_secs(14));
        assert_eq!(world.simulation().policy(), AccrualPolicy::IgnoreHeld);
        assert!(world.auto_start());

        let logger = config.logger_config().expect("valid logging");
        assert_eq!(logger.participant_id(), "p07");
        assert_eq!(logger.session_type(), SessionType::Request);
        assert_eq!(logger.episode_gap(), Duration::from_millis(750));
    }

    #[test]
    fn negative_durations_are_rejected() {
        let config = ExperimentConfig::parse("[automation]\nsalt_clip_s = -1.0\n")
            .expect("syntactically valid");
        let error = config.world_config().expect_err("negative clip must fail");
        assert!(error.to_string().contains("automation.salt_clip_s"));
    }

    #[test]
    fn unknown_keys_are_reported() {
        assert!(ExperimentConfig::parse("[simulation]\nburn_fil_s = 3.0\n").is_err());
    }
}
