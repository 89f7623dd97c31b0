use std::time::Duration;

use cooking_trial_core::{AccrualPolicy, EnvironmentFlags, ResourceKind, ResourceState};
use cooking_trial_system_resources::{Config, Contacts, ResourceSimulator};
use proptest::prelude::*;

fn contacts(on_heat: bool, is_stirred: bool, is_held: bool) -> Contacts {
    Contacts {
        flags: EnvironmentFlags::new(on_heat, is_stirred, is_held),
        ..Contacts::default()
    }
}

#[test]
fn saturated_levels_freeze_progress_but_keep_accruing() {
    let simulator = ResourceSimulator::default();
    let saturated = ResourceState::new(1.0, 0.4, 0.3);

    let step = simulator.step(
        saturated,
        contacts(true, true, true),
        Duration::from_millis(500),
        saturated.progress_held(),
    );

    assert_eq!(step.state.progress(), 0.3, "progress must not move while held");
    assert_eq!(step.state.burnt(), 1.0, "burnt stays clamped at saturation");
    assert!(step.state.salt() > 0.4, "salt keeps accruing during the hold");
}

#[test]
fn nothing_accrues_without_the_pan_held() {
    let simulator = ResourceSimulator::default();
    let start = ResourceState::new(0.2, 0.2, 0.2);

    for flags in [
        contacts(true, true, false),
        contacts(true, false, true),
        contacts(false, true, true),
    ] {
        let step = simulator.step(start, flags, Duration::from_secs(1), false);
        assert_eq!(step.state, start);
    }
}

#[test]
fn ignore_held_policy_accrues_on_heat_and_stirring() {
    let simulator =
        ResourceSimulator::new(Config::default().with_policy(AccrualPolicy::IgnoreHeld));
    let step = simulator.step(
        ResourceState::default(),
        contacts(true, true, false),
        Duration::from_secs(1),
        false,
    );

    assert!(step.state.burnt() > 0.0);
    assert!(step.state.salt() > 0.0);
    assert!(step.state.progress() > 0.0);
}

#[test]
fn pouring_water_lowers_burnt_and_reports_one_effect() {
    let simulator = ResourceSimulator::default();
    let pouring = Contacts {
        water_pouring: true,
        ..Contacts::default()
    };

    let step = simulator.step(
        ResourceState::new(0.5, 0.5, 0.0),
        pouring,
        Duration::from_millis(100),
        false,
    );

    assert!((step.state.burnt() - 0.25).abs() < 1e-5);
    assert_eq!(step.state.salt(), 0.5);
    assert_eq!(step.effects().collect::<Vec<_>>(), vec![ResourceKind::Water]);
}

#[test]
fn depletion_clamps_at_zero() {
    let simulator = ResourceSimulator::default();
    let both = Contacts {
        water_pouring: true,
        salt_over_pan: true,
        ..Contacts::default()
    };

    let step = simulator.step(
        ResourceState::new(0.1, 0.05, 0.0),
        both,
        Duration::from_secs(1),
        false,
    );

    assert_eq!(step.state.burnt(), 0.0);
    assert_eq!(step.state.salt(), 0.0);
    assert_eq!(step.effects().count(), 2);
}

fn arb_contacts() -> impl Strategy<Value = Contacts> {
    (any::<[bool; 5]>()).prop_map(|[on_heat, stirred, held, water, salt]| Contacts {
        flags: EnvironmentFlags::new(on_heat, stirred, held),
        water_pouring: water,
        salt_over_pan: salt,
    })
}

proptest! {
    #[test]
    fn levels_stay_clamped_and_progress_is_monotonic(
        frames in proptest::collection::vec((arb_contacts(), 0u64..5_000), 1..200),
    ) {
        let simulator = ResourceSimulator::new(Config::new(
            Duration::from_secs(2),
            Duration::from_secs(3),
            Duration::from_secs(5),
        ));
        let mut state = ResourceState::default();

        for (contacts, millis) in frames {
            let previous = state;
            state = simulator
                .step(state, contacts, Duration::from_millis(millis), state.progress_held())
                .state;

            for level in [state.burnt(), state.salt(), state.progress()] {
                prop_assert!((0.0..=1.0).contains(&level));
            }
            prop_assert!(state.progress() >= previous.progress());
        }
    }
}
