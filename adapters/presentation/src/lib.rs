#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared presentation contracts for cooking-trial adapters.

use anyhow::Result as AnyResult;
use cooking_trial_core::{AutomatedObject, ResourceKind, TrialPhase};
use cooking_trial_world::{query, World};

/// Slider value at or above which a resource slider switches to the warning colour.
pub const WARNING_THRESHOLD: f32 = 0.99;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white used for slider fills in the normal range.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Light red used for saturated resource sliders.
    pub const WARNING: Self = Self::new(1.0, 0.6, 0.6, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

/// Slider-style readout of a value in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderView {
    /// Displayed value.
    pub value: f32,
    /// Fill color.
    pub color: Color,
}

impl SliderView {
    /// Slider for a resource level, switching to the warning color near saturation.
    #[must_use]
    pub fn resource(level: f32) -> Self {
        let color = if level >= WARNING_THRESHOLD {
            Color::WARNING
        } else {
            Color::WHITE
        };
        Self {
            value: level,
            color,
        }
    }

    /// Slider that never changes color.
    #[must_use]
    pub const fn plain(value: f32) -> Self {
        Self {
            value,
            color: Color::WHITE,
        }
    }

    /// Reports whether the slider shows the warning color.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.color == Color::WARNING
    }
}

/// Everything the participant-facing HUD displays for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HudFrame {
    /// Lifecycle phase of the trial.
    pub phase: TrialPhase,
    /// Burnt level slider.
    pub burnt: SliderView,
    /// Salt level slider.
    pub salt: SliderView,
    /// Cooking progress slider.
    pub progress: SliderView,
    /// Fill level of the water mug.
    pub vessel_level: f32,
    /// Faucet progress indicator, visible while the faucet dispenses.
    pub faucet_indicator_visible: bool,
    /// Start sphere and tutorial panels.
    pub tutorials_visible: bool,
    /// Faucet, mug, pan and spatula accept interaction.
    pub interactables_enabled: bool,
    /// Completion message shown after a successful trial.
    pub completion_message_visible: bool,
    /// Objects currently driven by automation.
    pub automated: Vec<AutomatedObject>,
}

impl HudFrame {
    /// Composes the HUD from the authoritative world.
    #[must_use]
    pub fn from_world(world: &World) -> Self {
        let resources = query::resources(world);
        Self {
            phase: query::phase(world),
            burnt: SliderView::resource(resources.level(ResourceKind::Water)),
            salt: SliderView::resource(resources.level(ResourceKind::Salt)),
            progress: SliderView::plain(resources.progress()),
            vessel_level: query::vessel_level(world),
            faucet_indicator_visible: query::faucet_dispensing(world),
            tutorials_visible: query::start_sphere_visible(world),
            interactables_enabled: query::interactables_enabled(world),
            completion_message_visible: query::completion_visible(world),
            automated: AutomatedObject::ALL
                .into_iter()
                .filter(|object| query::is_automated(world, *object))
                .collect(),
        }
    }

    /// Reports whether either resource slider shows the warning color.
    #[must_use]
    pub fn any_warning(&self) -> bool {
        self.burnt.is_warning() || self.salt.is_warning()
    }
}

/// Backend capable of presenting HUD frames.
pub trait PresentationBackend {
    /// Presents one frame.
    fn present(&mut self, frame: &HudFrame) -> AnyResult<()>;
}

/// Manual debug controls available to operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManualAction {
    /// Trigger the water one-shot automation.
    TriggerWater,
    /// Trigger the salt one-shot automation.
    TriggerSalt,
    /// Recenter the play space on the head.
    Recenter,
    /// Abort the running trial and reset the session.
    Restart,
}

impl ManualAction {
    /// Action bound to the provided key, if any.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            '1' => Some(Self::TriggerWater),
            '2' => Some(Self::TriggerSalt),
            ' ' => Some(Self::Recenter),
            'r' => Some(Self::Restart),
            _ => None,
        }
    }
}

/// Latches manual actions until the frame loop consumes them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualControls {
    water_latched: bool,
    salt_latched: bool,
    recenter_latched: bool,
    restart_latched: bool,
}

impl ManualControls {
    /// Records that `action` was requested this frame.
    pub fn register(&mut self, action: ManualAction) {
        *self.latch(action) = true;
    }

    /// Returns whether `action` was requested and clears the latch so it fires once.
    pub fn take(&mut self, action: ManualAction) -> bool {
        std::mem::take(self.latch(action))
    }

    /// Returns whether the one-shot for `kind` was requested, clearing the latch.
    pub fn take_trigger(&mut self, kind: ResourceKind) -> bool {
        self.take(match kind {
            ResourceKind::Water => ManualAction::TriggerWater,
            ResourceKind::Salt => ManualAction::TriggerSalt,
        })
    }

    fn latch(&mut self, action: ManualAction) -> &mut bool {
        match action {
            ManualAction::TriggerWater => &mut self.water_latched,
            ManualAction::TriggerSalt => &mut self.salt_latched,
            ManualAction::Recenter => &mut self.recenter_latched,
            ManualAction::Restart => &mut self.restart_latched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_slider_warns_from_threshold() {
        assert!(!SliderView::resource(0.98).is_warning());
        assert!(SliderView::resource(0.99).is_warning());
        assert!(SliderView::resource(1.0).is_warning());
        assert!(!SliderView::plain(1.0).is_warning());
    }

    #[test]
    fn controls_fire_once_per_registration() {
        let mut controls = ManualControls::default();
        controls.register(ManualAction::TriggerSalt);
        controls.register(ManualAction::Restart);

        assert!(!controls.take_trigger(ResourceKind::Water));
        assert!(controls.take_trigger(ResourceKind::Salt));
        assert!(!controls.take_trigger(ResourceKind::Salt));
        assert!(controls.take(ManualAction::Restart));
        assert!(!controls.take(ManualAction::Restart));
    }

    #[test]
    fn keys_map_to_debug_actions() {
        assert_eq!(ManualAction::from_key('1'), Some(ManualAction::TriggerWater));
        assert_eq!(ManualAction::from_key('2'), Some(ManualAction::TriggerSalt));
        assert_eq!(ManualAction::from_key(' '), Some(ManualAction::Recenter));
        assert_eq!(ManualAction::from_key('R'), Some(ManualAction::Restart));
        assert_eq!(ManualAction::from_key('3'), None);
    }
}
