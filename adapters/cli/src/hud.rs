use anyhow::Result;
use cooking_trial_presentation::{HudFrame, PresentationBackend};
use tracing::{info, trace};

/// Headless backend that reports HUD changes through the log.
#[derive(Debug, Default)]
pub(crate) struct TracingHud {
    previous: Option<HudFrame>,
}

impl PresentationBackend for TracingHud {
    fn present(&mut self, frame: &HudFrame) -> Result<()> {
        trace!(
            burnt = frame.burnt.value,
            salt = frame.salt.value,
            progress = frame.progress.value,
            mug = frame.vessel_level,
            "hud frame"
        );

        let previous = self.previous.as_ref();
        let changed = |pick: fn(&HudFrame) -> bool| previous.map(pick) != Some(pick(frame));

        if changed(|hud| hud.burnt.is_warning()) {
            info!(warning = frame.burnt.is_warning(), "burnt slider");
        }
        if changed(|hud| hud.salt.is_warning()) {
            info!(warning = frame.salt.is_warning(), "salt slider");
        }
        if changed(|hud| hud.faucet_indicator_visible) {
            info!(visible = frame.faucet_indicator_visible, "faucet indicator");
        }
        if changed(|hud| hud.completion_message_visible) && frame.completion_message_visible {
            info!("completion message shown");
        }
        if previous.map(|hud| hud.phase) != Some(frame.phase) {
            info!(phase = ?frame.phase, "trial phase");
        }

        self.previous = Some(frame.clone());
        Ok(())
    }
}
