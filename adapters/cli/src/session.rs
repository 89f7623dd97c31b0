use std::time::Duration;

use anyhow::Result;
use cooking_trial_core::{Command, EndReason, Event, ResourceKind, TrialPhase};
use cooking_trial_presentation::{HudFrame, ManualAction, ManualControls, PresentationBackend};
use cooking_trial_system_arms::{
    recenter_compensation, Config as ArmsConfig, ArmArbitrator, TargetPoses, TrackingFrame,
};
use cooking_trial_system_intervention_log::{InterventionLogger, SummarySink};
use cooking_trial_world::{self as world, query, Config as WorldConfig, World};
use glam::Vec3;
use tracing::{debug, info, trace};

use crate::scenario::{Phase, Scenario, ScenarioAction};

/// Counters describing a replayed session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionReport {
    pub(crate) frames: u64,
    pub(crate) trials_started: u32,
    pub(crate) trials_completed: u32,
    pub(crate) trials_ended: u32,
}

/// Drives the world, logger and arm rig one frame at a time.
pub(crate) struct Session<S> {
    world: World,
    logger: Option<InterventionLogger<S>>,
    arms: ArmArbitrator,
    controls: ManualControls,
    rig: Vec3,
    frame: Duration,
    events: Vec<Event>,
    report: SessionReport,
}

impl<S: SummarySink> Session<S> {
    pub(crate) fn new(
        world_config: WorldConfig,
        logger: Option<InterventionLogger<S>>,
        arms_config: ArmsConfig,
        frame: Duration,
    ) -> Self {
        Self {
            world: World::with_config(world_config),
            logger,
            arms: ArmArbitrator::new(arms_config),
            controls: ManualControls::default(),
            rig: Vec3::ZERO,
            frame,
            events: Vec::new(),
            report: SessionReport::default(),
        }
    }

    /// Replays every phase, then ends a trial that is still running.
    pub(crate) fn run<B>(&mut self, scenario: &Scenario, backend: &mut B) -> Result<SessionReport>
    where
        B: PresentationBackend,
    {
        for phase in &scenario.phases {
            debug!(name = %phase.name, duration = ?phase.duration(), "phase started");
            self.apply_actions(phase);
            for _ in 0..frames_in(phase.duration(), self.frame) {
                self.step(phase, backend)?;
            }
        }

        if query::phase(&self.world) == TrialPhase::Running {
            info!("scenario exhausted while a trial was running");
            self.dispatch(Command::EndTrial {
                success: false,
                reason: EndReason::Ended,
            });
        }
        Ok(self.report)
    }

    fn apply_actions(&mut self, phase: &Phase) {
        for action in &phase.actions {
            match action {
                ScenarioAction::TriggerWater => self.controls.register(ManualAction::TriggerWater),
                ScenarioAction::TriggerSalt => self.controls.register(ManualAction::TriggerSalt),
                ScenarioAction::Recenter => self.controls.register(ManualAction::Recenter),
                ScenarioAction::Restart => self.controls.register(ManualAction::Restart),
                ScenarioAction::Start => self.dispatch(Command::StartTrial),
                ScenarioAction::End => self.dispatch(Command::EndTrial {
                    success: false,
                    reason: EndReason::Ended,
                }),
                ScenarioAction::Reset => self.dispatch(Command::ResetTrial),
            }
        }
    }

    fn step<B>(&mut self, phase: &Phase, backend: &mut B) -> Result<()>
    where
        B: PresentationBackend,
    {
        for kind in ResourceKind::ALL {
            if self.controls.take_trigger(kind) {
                self.dispatch(Command::TriggerOneShot { kind });
            }
        }
        if self.controls.take(ManualAction::Restart) {
            self.dispatch(Command::Restart);
        }
        if self.controls.take(ManualAction::Recenter) {
            let head = phase.tracking(self.rig).head.position;
            self.rig += recenter_compensation(self.rig, head);
            info!(rig = ?self.rig, "play space recentered");
        }

        self.dispatch(Command::Tick {
            dt: self.frame,
            signals: phase.signals(),
        });
        self.report.frames = self.report.frames.saturating_add(1);

        let tracking: TrackingFrame = phase.tracking(self.rig);
        let targets: TargetPoses = phase.targets(self.rig);
        let arms = self.arms.update(&tracking, &targets);
        trace!(
            left = ?arms.left.commanded.position,
            right = ?arms.right.commanded.position,
            "arm targets"
        );

        backend.present(&HudFrame::from_world(&self.world))
    }

    fn dispatch(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
        if let Some(logger) = self.logger.as_mut() {
            logger.handle(&self.events);
        }
        self.arms.handle(&self.events);
        for event in &self.events {
            match event {
                Event::TrialStarted { .. } => {
                    self.report.trials_started = self.report.trials_started.saturating_add(1);
                }
                Event::TrialEnded { success, .. } => {
                    self.report.trials_ended = self.report.trials_ended.saturating_add(1);
                    if *success {
                        self.report.trials_completed =
                            self.report.trials_completed.saturating_add(1);
                    }
                }
                _ => {}
            }
        }
        self.events.clear();
    }
}

fn frames_in(duration: Duration, frame: Duration) -> u128 {
    let frame = frame.as_nanos().max(1);
    duration.as_nanos().div_ceil(frame)
}
