use std::time::Duration;

use cooking_trial_core::{EnvironmentFlags, ResourceKind, ResourceState};

/// Durations, peaks and engagement transitions accumulated over one trial.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TrialMetrics {
    pub(crate) water_blocked: Duration,
    pub(crate) salt_blocked: Duration,
    pub(crate) any_blocked: Duration,
    pub(crate) on_heat: Duration,
    pub(crate) stirred: Duration,
    pub(crate) active_cooking: Duration,
    pub(crate) held: Duration,
    pub(crate) grab_count: u32,
    pub(crate) disengage_count: u32,
    pub(crate) peak_burnt: f32,
    pub(crate) peak_salt: f32,
    previous_held: bool,
}

impl TrialMetrics {
    /// Starts a fresh accumulation with the held edge detector seeded.
    pub(crate) fn begin(initial_held: bool) -> Self {
        Self {
            previous_held: initial_held,
            ..Self::default()
        }
    }

    pub(crate) fn track(
        &mut self,
        dt: Duration,
        state: &ResourceState,
        progress_held: bool,
        flags: EnvironmentFlags,
    ) {
        let water_blocking = state.is_saturated(ResourceKind::Water);
        let salt_blocking = state.is_saturated(ResourceKind::Salt);
        accumulate(&mut self.water_blocked, water_blocking, dt);
        accumulate(&mut self.salt_blocked, salt_blocking, dt);
        accumulate(&mut self.any_blocked, water_blocking || salt_blocking, dt);

        self.peak_burnt = self.peak_burnt.max(state.burnt());
        self.peak_salt = self.peak_salt.max(state.salt());

        accumulate(&mut self.on_heat, flags.on_heat, dt);
        accumulate(&mut self.stirred, flags.is_stirred, dt);
        accumulate(&mut self.held, flags.is_held, dt);
        accumulate(
            &mut self.active_cooking,
            flags.on_heat && flags.is_stirred && !progress_held,
            dt,
        );

        if flags.is_held && !self.previous_held {
            self.grab_count = self.grab_count.saturating_add(1);
        }
        if !flags.is_held && self.previous_held {
            self.disengage_count = self.disengage_count.saturating_add(1);
        }
        self.previous_held = flags.is_held;
    }
}

fn accumulate(total: &mut Duration, active: bool, dt: Duration) {
    if active {
        *total = total.saturating_add(dt);
    }
}
