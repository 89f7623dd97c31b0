use std::{f32::consts::FRAC_PI_2, time::Duration};

use cooking_trial_core::{Arm, AutomationTarget, Event, ResourceKind};
use cooking_trial_system_arms::{
    ArmArbitrator, ArmAutomation, Config, Pose, TargetPoses, TrackingFrame,
};
use glam::{Quat, Vec3};

fn head_at(position: Vec3, yaw: f32) -> TrackingFrame {
    TrackingFrame::from_head(Pose::new(position, Quat::from_rotation_y(yaw)))
}

#[test]
fn arms_are_independent() {
    let mut arbitrator = ArmArbitrator::new(Config::default());
    let mug = Pose::new(Vec3::new(0.2, 0.9, 0.5), Quat::from_rotation_z(0.3));
    let targets = TargetPoses {
        mug: Some(mug),
        salt_shaker: None,
    };

    arbitrator.engage(Arm::Left, AutomationTarget::Mug);
    let frame = arbitrator.update(&head_at(Vec3::new(0.0, 1.6, 0.0), 0.0), &targets);

    assert_eq!(frame.left.commanded, mug);
    assert_eq!(frame.right.automation, ArmAutomation::Manual);
    assert!(frame
        .right
        .commanded
        .position
        .abs_diff_eq(Vec3::new(0.30, 1.20, 0.35), 1e-5));
}

#[test]
fn engaged_arm_tracks_live_target_and_holds_when_it_disappears() {
    let mut arbitrator = ArmArbitrator::default();
    arbitrator.engage(Arm::Right, AutomationTarget::SaltShaker);
    let tracking = head_at(Vec3::new(0.0, 1.6, 0.0), 0.0);

    let first = Pose::new(Vec3::new(0.4, 1.0, 0.3), Quat::IDENTITY);
    let second = Pose::new(Vec3::new(0.5, 1.1, 0.2), Quat::from_rotation_x(0.2));
    for pose in [first, second] {
        let frame = arbitrator.update(&tracking, &|target: AutomationTarget| {
            (target == AutomationTarget::SaltShaker).then_some(pose)
        });
        assert_eq!(frame.right.commanded, pose);
    }

    let frame = arbitrator.update(&tracking, &TargetPoses::default());
    assert_eq!(
        frame.right.commanded, second,
        "a missing target holds the last commanded pose"
    );
}

#[test]
fn disengaging_resumes_rest_immediately() {
    let mut arbitrator = ArmArbitrator::default();
    let tracking = head_at(Vec3::ZERO, 0.0);
    let shaker = Pose::new(Vec3::new(1.0, 1.0, 1.0), Quat::IDENTITY);
    let targets = TargetPoses {
        mug: None,
        salt_shaker: Some(shaker),
    };

    arbitrator.engage(Arm::Right, AutomationTarget::SaltShaker);
    let _ = arbitrator.update(&tracking, &targets);
    arbitrator.disengage(Arm::Right);
    let frame = arbitrator.update(&tracking, &targets);

    assert_eq!(arbitrator.automation(Arm::Right).target(), None);
    assert!(frame
        .right
        .commanded
        .position
        .abs_diff_eq(Vec3::new(0.30, -0.40, 0.35), 1e-5));
}

#[test]
fn rest_pose_follows_body_heading_over_head_heading() {
    let mut arbitrator = ArmArbitrator::default();
    let mut tracking = head_at(Vec3::ZERO, FRAC_PI_2);
    tracking.body_yaw_root = Some(Pose::IDENTITY);

    let frame = arbitrator.update(&tracking, &TargetPoses::default());

    assert!(frame
        .left
        .commanded
        .position
        .abs_diff_eq(Vec3::new(-0.30, -0.40, 0.35), 1e-5));
    assert!(frame.left.commanded.rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
}

#[test]
fn rest_pose_turns_with_heading() {
    let mut arbitrator = ArmArbitrator::default();
    let frame = arbitrator.update(&head_at(Vec3::ZERO, FRAC_PI_2), &TargetPoses::default());

    // Facing +X, the participant's right is -Z.
    assert!(frame
        .right
        .commanded
        .position
        .abs_diff_eq(Vec3::new(0.35, -0.40, -0.30), 1e-5));
    assert!(frame
        .right
        .shoulder
        .position
        .abs_diff_eq(Vec3::new(-0.15, -0.30, -0.25), 1e-5));
}

#[test]
fn joints_follow_basis_while_engaged_and_hands_mirror_controllers() {
    let mut arbitrator = ArmArbitrator::default();
    let controller = Pose::new(Vec3::new(-0.2, 1.1, 0.4), Quat::IDENTITY);
    let mut tracking = head_at(Vec3::new(0.0, 1.6, 0.0), 0.0);
    tracking.left_controller = Some(controller);

    arbitrator.engage(Arm::Left, AutomationTarget::Mug);
    let frame = arbitrator.update(&tracking, &TargetPoses::default());

    assert!(frame
        .left
        .shoulder
        .position
        .abs_diff_eq(Vec3::new(-0.25, 1.30, -0.15), 1e-5));
    assert!(frame
        .left
        .elbow
        .position
        .abs_diff_eq(Vec3::new(-0.45, 1.05, 0.10), 1e-5));
    assert_eq!(frame.left.hand, Some(controller.position));
    assert_eq!(frame.right.hand, None);
}

#[test]
fn world_events_engage_and_release_arms() {
    let mut arbitrator = ArmArbitrator::default();
    arbitrator.handle(&[
        Event::AutomationEngaged {
            kind: ResourceKind::Water,
            arm: Arm::Left,
            target: AutomationTarget::Mug,
            ends_at: Duration::from_secs(6),
        },
        Event::AutomationEngaged {
            kind: ResourceKind::Salt,
            arm: Arm::Right,
            target: AutomationTarget::SaltShaker,
            ends_at: Duration::from_secs(4),
        },
    ]);
    assert!(arbitrator.automation(Arm::Left).is_engaged());
    assert!(arbitrator.automation(Arm::Right).is_engaged());

    arbitrator.handle(&[Event::AutomationReleased {
        kind: ResourceKind::Salt,
        arm: Arm::Right,
    }]);
    assert_eq!(
        arbitrator.automation(Arm::Left),
        ArmAutomation::Engaged(AutomationTarget::Mug)
    );
    assert_eq!(arbitrator.automation(Arm::Right), ArmAutomation::Manual);

    arbitrator.handle(&[Event::TrialReset]);
    assert_eq!(arbitrator.automation(Arm::Left), ArmAutomation::Manual);
}
