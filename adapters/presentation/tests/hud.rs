use std::time::Duration;

use cooking_trial_core::{
    AutomatedObject, Command, EndReason, EnvironmentFlags, FrameSignals, ResourceKind, TrialPhase,
};
use cooking_trial_presentation::{Color, HudFrame};
use cooking_trial_system_resources::Config as SimulationConfig;
use cooking_trial_world::{self as world, Config, World};

fn tick(world: &mut World, signals: FrameSignals) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(250),
            signals,
        },
        &mut events,
    );
}

#[test]
fn idle_world_shows_tutorials_and_plain_sliders() {
    let hud = HudFrame::from_world(&World::new());

    assert_eq!(hud.phase, TrialPhase::Idle);
    assert!(hud.tutorials_visible);
    assert!(hud.interactables_enabled);
    assert!(!hud.completion_message_visible);
    assert!(!hud.faucet_indicator_visible);
    assert!(!hud.any_warning());
    assert!(hud.automated.is_empty());
    assert_eq!(hud.progress.value, 0.0);
}

#[test]
fn saturated_burn_turns_slider_to_warning() {
    let mut world = World::with_config(Config::new(SimulationConfig::new(
        Duration::from_millis(500),
        Duration::from_secs(60),
        Duration::from_secs(60),
    )));
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartTrial, &mut events);
    let cooking = FrameSignals {
        environment: EnvironmentFlags::new(true, true, true),
        ..FrameSignals::default()
    };
    tick(&mut world, cooking);
    tick(&mut world, cooking);

    let hud = HudFrame::from_world(&world);
    assert_eq!(hud.burnt.value, 1.0);
    assert_eq!(hud.burnt.color, Color::WARNING);
    assert_eq!(hud.salt.color, Color::WHITE);
    assert!(!hud.tutorials_visible);
}

#[test]
fn automation_and_faucet_indicator_follow_the_world() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartTrial, &mut events);
    world::apply(
        &mut world,
        Command::TriggerOneShot {
            kind: ResourceKind::Water,
        },
        &mut events,
    );
    tick(&mut world, FrameSignals::default());

    let hud = HudFrame::from_world(&world);
    assert_eq!(
        hud.automated,
        vec![AutomatedObject::Faucet, AutomatedObject::Mug]
    );
    assert!(hud.faucet_indicator_visible);

    world::apply(
        &mut world,
        Command::EndTrial {
            success: false,
            reason: EndReason::Ended,
        },
        &mut events,
    );
    let hud = HudFrame::from_world(&world);
    assert!(hud.automated.is_empty());
    assert!(!hud.interactables_enabled);
    assert!(!hud.completion_message_visible, "only success shows completion");
}
