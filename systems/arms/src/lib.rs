#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dual-arm arbitration between rest poses and delegated automation targets.
//!
//! Each arm is independent: while manual it rests relative to a heading-only
//! basis derived from the body (or head) pose, while engaged it tracks the
//! live pose of its automation target. Shoulder and elbow joints follow the
//! basis every update regardless of automation.

mod basis;

use cooking_trial_core::{Arm, AutomationTarget, Event};
use glam::{Quat, Vec3};
use tracing::debug;

pub use basis::YawBasis;

/// Position and orientation of a tracked or commanded object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// World-space position in metres.
    pub position: Vec3,
    /// World-space orientation.
    pub rotation: Quat,
}

impl Pose {
    /// Pose at the origin without rotation.
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quat::IDENTITY);

    /// Creates a pose from a position and rotation.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Local forward axis in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local up axis in world space.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Tracking data sampled from the headset and controllers for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackingFrame {
    /// Head-mounted display pose.
    pub head: Pose,
    /// Optional body heading reference preferred over the head for rest poses.
    pub body_yaw_root: Option<Pose>,
    /// Left controller pose when tracked.
    pub left_controller: Option<Pose>,
    /// Right controller pose when tracked.
    pub right_controller: Option<Pose>,
}

impl TrackingFrame {
    /// Creates a frame with only the head tracked.
    #[must_use]
    pub const fn from_head(head: Pose) -> Self {
        Self {
            head,
            body_yaw_root: None,
            left_controller: None,
            right_controller: None,
        }
    }

    /// Pose used to derive the heading basis.
    #[must_use]
    pub fn yaw_reference(&self) -> &Pose {
        self.body_yaw_root.as_ref().unwrap_or(&self.head)
    }

    /// Controller held in the hand on the same side as `arm`.
    #[must_use]
    pub const fn controller(&self, arm: Arm) -> Option<Pose> {
        match arm {
            Arm::Left => self.left_controller,
            Arm::Right => self.right_controller,
        }
    }
}

/// Supplies the live pose of automation targets.
pub trait PoseSource {
    /// Current pose of `target`, or `None` when it is unavailable.
    fn pose_of(&self, target: AutomationTarget) -> Option<Pose>;
}

impl<F> PoseSource for F
where
    F: Fn(AutomationTarget) -> Option<Pose>,
{
    fn pose_of(&self, target: AutomationTarget) -> Option<Pose> {
        self(target)
    }
}

/// Fixed set of target poses sampled for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TargetPoses {
    /// Water mug pose.
    pub mug: Option<Pose>,
    /// Salt shaker pose.
    pub salt_shaker: Option<Pose>,
}

impl PoseSource for TargetPoses {
    fn pose_of(&self, target: AutomationTarget) -> Option<Pose> {
        match target {
            AutomationTarget::Mug => self.mug,
            AutomationTarget::SaltShaker => self.salt_shaker,
        }
    }
}

/// Offsets used to lay out the arm rig, expressed as `(right, up, forward)`
/// in the heading basis for the right arm and mirrored laterally for the left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    shoulder_offset: Vec3,
    elbow_offset: Vec3,
    rest_hand_offset: Vec3,
    rest_lift: f32,
    inward_nudge: f32,
}

impl Config {
    /// Creates a configuration from joint and rest offsets.
    #[must_use]
    pub const fn new(shoulder_offset: Vec3, elbow_offset: Vec3, rest_hand_offset: Vec3) -> Self {
        Self {
            shoulder_offset,
            elbow_offset,
            rest_hand_offset,
            rest_lift: 0.6,
            inward_nudge: 0.1,
        }
    }

    /// Overrides the vertical lift and inward nudge applied to rest poses.
    #[must_use]
    pub const fn with_rest_adjustment(mut self, lift: f32, inward_nudge: f32) -> Self {
        self.rest_lift = lift;
        self.inward_nudge = inward_nudge;
        self
    }

    /// Shoulder offset from the head.
    #[must_use]
    pub const fn shoulder_offset(&self) -> Vec3 {
        self.shoulder_offset
    }

    /// Elbow offset from the head.
    #[must_use]
    pub const fn elbow_offset(&self) -> Vec3 {
        self.elbow_offset
    }

    /// Resting hand offset from the head.
    #[must_use]
    pub const fn rest_hand_offset(&self) -> Vec3 {
        self.rest_hand_offset
    }

    /// Vertical lift added to the rest pose.
    #[must_use]
    pub const fn rest_lift(&self) -> f32 {
        self.rest_lift
    }

    /// Distance each rest pose is pulled towards the centreline.
    #[must_use]
    pub const fn inward_nudge(&self) -> f32 {
        self.inward_nudge
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.25, -0.30, -0.15),
            Vec3::new(0.45, -0.55, 0.10),
            Vec3::new(0.40, -1.00, 0.35),
        )
    }
}

/// Control state of one arm. Only an engaged arm carries a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArmAutomation {
    /// The arm rests and the participant acts manually.
    #[default]
    Manual,
    /// The arm reaches for the provided target.
    Engaged(AutomationTarget),
}

impl ArmAutomation {
    /// Reports whether the arm is engaged.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Engaged(_))
    }

    /// Target tracked while engaged.
    #[must_use]
    pub const fn target(self) -> Option<AutomationTarget> {
        match self {
            Self::Manual => None,
            Self::Engaged(target) => Some(target),
        }
    }
}

/// Poses computed for one arm during an update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmPose {
    /// Control state that produced the commanded pose.
    pub automation: ArmAutomation,
    /// Pose the arm's end effector is commanded to reach.
    pub commanded: Pose,
    /// Cosmetic shoulder joint.
    pub shoulder: Pose,
    /// Cosmetic elbow joint.
    pub elbow: Pose,
    /// Hand marker mirroring the controller, when tracked.
    pub hand: Option<Vec3>,
}

/// Poses computed for both arms during an update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmFrame {
    /// Left arm poses.
    pub left: ArmPose,
    /// Right arm poses.
    pub right: ArmPose,
}

impl ArmFrame {
    /// Poses for the requested arm.
    #[must_use]
    pub const fn arm(&self, arm: Arm) -> &ArmPose {
        match arm {
            Arm::Left => &self.left,
            Arm::Right => &self.right,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ArmSlot {
    automation: ArmAutomation,
    commanded: Option<Pose>,
}

/// Arbitrates each arm between its rest pose and a delegated target.
#[derive(Clone, Debug, Default)]
pub struct ArmArbitrator {
    config: Config,
    arms: [ArmSlot; 2],
}

impl ArmArbitrator {
    /// Creates an arbitrator with both arms manual.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            arms: [ArmSlot::default(); 2],
        }
    }

    /// Rig layout in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Current control state of `arm`.
    #[must_use]
    pub const fn automation(&self, arm: Arm) -> ArmAutomation {
        self.arms[slot(arm)].automation
    }

    /// Delegates `arm` to track `target`.
    pub fn engage(&mut self, arm: Arm, target: AutomationTarget) {
        debug!(?arm, ?target, "arm engaged");
        self.arms[slot(arm)].automation = ArmAutomation::Engaged(target);
    }

    /// Returns `arm` to its rest pose.
    pub fn disengage(&mut self, arm: Arm) {
        let arm_slot = &mut self.arms[slot(arm)];
        if arm_slot.automation.is_engaged() {
            debug!(?arm, "arm released");
        }
        arm_slot.automation = ArmAutomation::Manual;
    }

    /// Applies automation changes broadcast by the world.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::AutomationEngaged { arm, target, .. } => self.engage(*arm, *target),
                Event::AutomationReleased { arm, .. } => self.disengage(*arm),
                Event::TrialReset => {
                    for arm in Arm::ALL {
                        self.disengage(arm);
                    }
                }
                _ => {}
            }
        }
    }

    /// Recomputes every arm pose for the current frame.
    pub fn update<P>(&mut self, tracking: &TrackingFrame, sources: &P) -> ArmFrame
    where
        P: PoseSource + ?Sized,
    {
        let basis = YawBasis::from_reference(tracking.yaw_reference());
        ArmFrame {
            left: self.update_arm(Arm::Left, &basis, tracking, sources),
            right: self.update_arm(Arm::Right, &basis, tracking, sources),
        }
    }

    fn update_arm<P>(
        &mut self,
        arm: Arm,
        basis: &YawBasis,
        tracking: &TrackingFrame,
        sources: &P,
    ) -> ArmPose
    where
        P: PoseSource + ?Sized,
    {
        let origin = tracking.head.position;
        let rotation = basis.rotation();
        let rest = Pose::new(
            origin + self.rest_offset(arm, basis),
            rotation,
        );

        let arm_slot = &mut self.arms[slot(arm)];
        let commanded = match arm_slot.automation {
            ArmAutomation::Manual => rest,
            ArmAutomation::Engaged(target) => sources
                .pose_of(target)
                .or(arm_slot.commanded)
                .unwrap_or(rest),
        };
        arm_slot.commanded = Some(commanded);

        ArmPose {
            automation: arm_slot.automation,
            commanded,
            shoulder: Pose::new(
                origin + basis.to_world(mirror(self.config.shoulder_offset, arm)),
                rotation,
            ),
            elbow: Pose::new(
                origin + basis.to_world(mirror(self.config.elbow_offset, arm)),
                rotation,
            ),
            hand: tracking.controller(arm).map(|pose| pose.position),
        }
    }

    fn rest_offset(&self, arm: Arm, basis: &YawBasis) -> Vec3 {
        basis.to_world(mirror(self.config.rest_hand_offset, arm))
            + Vec3::Y * self.config.rest_lift
            - basis.right() * (self.config.inward_nudge * arm.lateral_sign())
    }
}

/// Translation that moves the rig so the head sits above the rig origin.
#[must_use]
pub fn recenter_compensation(rig: Vec3, head: Vec3) -> Vec3 {
    Vec3::new(rig.x - head.x, 0.0, rig.z - head.z)
}

const fn slot(arm: Arm) -> usize {
    match arm {
        Arm::Left => 0,
        Arm::Right => 1,
    }
}

fn mirror(offset: Vec3, arm: Arm) -> Vec3 {
    Vec3::new(offset.x * arm.lateral_sign(), offset.y, offset.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_offsets_mirror_laterally_and_pull_inwards() {
        let arbitrator = ArmArbitrator::default();
        let basis = YawBasis::from_reference(&Pose::IDENTITY);

        let left = arbitrator.rest_offset(Arm::Left, &basis);
        let right = arbitrator.rest_offset(Arm::Right, &basis);

        assert!(left.abs_diff_eq(Vec3::new(-0.30, -0.40, 0.35), 1e-5));
        assert!(right.abs_diff_eq(Vec3::new(0.30, -0.40, 0.35), 1e-5));
    }

    #[test]
    fn inward_nudge_turns_with_the_heading() {
        let nudged = ArmArbitrator::default();
        let config = Config::default();
        let plain = ArmArbitrator::new(config.with_rest_adjustment(config.rest_lift(), 0.0));
        let turned = Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let basis = YawBasis::from_reference(&turned);

        for arm in [Arm::Left, Arm::Right] {
            let with = nudged.rest_offset(arm, &basis);
            let without = plain.rest_offset(arm, &basis);
            let lateral_with = with.dot(basis.right());
            let lateral_without = without.dot(basis.right());

            assert!((lateral_without - 0.40 * arm.lateral_sign()).abs() < 1e-5);
            assert!((lateral_with - 0.30 * arm.lateral_sign()).abs() < 1e-5);
            assert!((with - without).x.abs() < 1e-5, "nudge must not use the world x axis");
        }
    }

    #[test]
    fn engaged_arm_without_history_starts_from_rest() {
        let mut arbitrator = ArmArbitrator::default();
        arbitrator.engage(Arm::Right, AutomationTarget::SaltShaker);

        let frame = arbitrator.update(&TrackingFrame::default(), &TargetPoses::default());

        assert!(frame
            .right
            .commanded
            .position
            .abs_diff_eq(Vec3::new(0.30, -0.40, 0.35), 1e-5));
        assert_eq!(
            frame.right.automation,
            ArmAutomation::Engaged(AutomationTarget::SaltShaker)
        );
    }

    #[test]
    fn recenter_ignores_height() {
        let offset = recenter_compensation(Vec3::new(1.0, 0.0, 2.0), Vec3::new(1.5, 1.7, 1.0));
        assert_eq!(offset, Vec3::new(-0.5, 0.0, 1.0));
    }
}
