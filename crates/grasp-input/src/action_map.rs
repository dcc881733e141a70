//! Action mapping: which physical controller buttons drive which interaction.
//!
//! [`InputMap`] is the (device, button) → [`Action`] table consulted by the
//! interaction state machine on every button edge. Remapping controls only
//! touches this table, never the state machine. One button may feed several
//! actions at once (e.g. the trigger both grabs and counts toward a two-handed
//! gesture).

use crate::device::{ControllerButton, Device};
use grasp_config::{GestureButton, InputConfig, TriggerFunction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Logical interaction actions.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Pick the object under the controller and move it rigidly with the hand.
    Grab,
    /// Count toward the two-handed pinch gesture.
    ComplexGesture,
    /// Fly along the controller's pointing direction.
    Dolly,
}

impl Action {
    /// Every action, in dispatch order.
    pub const ALL: [Action; 3] = [Action::Grab, Action::ComplexGesture, Action::Dolly];
}

/// A physical button, optionally restricted to a single device.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ButtonBinding {
    /// The physical button.
    pub button: ControllerButton,
    /// `None` matches the button on either controller.
    pub device: Option<Device>,
}

impl ButtonBinding {
    /// Bind `button` on both controllers.
    #[must_use]
    pub fn any(button: ControllerButton) -> Self {
        Self {
            button,
            device: None,
        }
    }

    /// Bind `button` on `device` only.
    #[must_use]
    pub fn on(device: Device, button: ControllerButton) -> Self {
        Self {
            button,
            device: Some(device),
        }
    }

    /// Whether an edge from `device` on `button` triggers this binding.
    #[must_use]
    pub fn matches(&self, device: Device, button: ControllerButton) -> bool {
        self.button == button && self.device.is_none_or(|d| d == device)
    }
}

/// Maps [`Action`]s to lists of [`ButtonBinding`]s.
///
/// Serializable to RON for user-editable binding files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMap {
    /// The binding table.
    pub bindings: HashMap<Action, Vec<ButtonBinding>>,
}

impl Default for InputMap {
    fn default() -> Self {
        Self::from_presets(TriggerFunction::default(), GestureButton::default())
    }
}

impl InputMap {
    /// Create an empty input map with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Build the table from the trigger-function and gesture-button presets.
    ///
    /// The gesture preset decides which button is the "select" button (the one
    /// not used for gestures) and which buttons feed the gesture recognizer.
    /// The trigger function decides whether the select button grabs. The
    /// touchpad always dollies.
    #[must_use]
    pub fn from_presets(trigger: TriggerFunction, gesture: GestureButton) -> Self {
        let mut map = Self::new();
        map.set_gesture_button(gesture);
        map.set_trigger_function(trigger, gesture);
        map.set_bindings(
            Action::Dolly,
            vec![ButtonBinding::any(ControllerButton::TrackPad)],
        );
        map
    }

    /// Build the table from the input section of the config. A configured
    /// bindings file wins over the presets.
    #[must_use]
    pub fn from_config(config: &InputConfig) -> Self {
        match &config.bindings_file {
            Some(path) => Self::load(path),
            None => Self::from_presets(config.trigger_function, config.gesture_button),
        }
    }

    /// Rebind the gesture recognizer buttons.
    pub fn set_gesture_button(&mut self, gesture: GestureButton) {
        let buttons: &[ControllerButton] = match gesture {
            GestureButton::Trigger => &[ControllerButton::Trigger],
            GestureButton::Grip => &[ControllerButton::Grip],
            GestureButton::TriggerAndGrip => &[ControllerButton::Trigger, ControllerButton::Grip],
            GestureButton::None => &[],
        };
        self.set_bindings(
            Action::ComplexGesture,
            buttons.iter().copied().map(ButtonBinding::any).collect(),
        );
    }

    /// Rebind the grab action according to the trigger function. The grab
    /// button is whichever of trigger/grip the gesture preset leaves free.
    pub fn set_trigger_function(&mut self, trigger: TriggerFunction, gesture: GestureButton) {
        let select = match gesture {
            GestureButton::Trigger => Some(ControllerButton::Grip),
            GestureButton::Grip => Some(ControllerButton::Trigger),
            GestureButton::TriggerAndGrip | GestureButton::None => None,
        };
        let bindings = match (trigger, select) {
            (TriggerFunction::GrabObjectsAndWorld, Some(button)) => {
                vec![ButtonBinding::any(button)]
            }
            (TriggerFunction::GrabObjectsAndWorld, None) => {
                warn!("Gesture preset {gesture:?} leaves no button free for grabbing");
                Vec::new()
            }
            (TriggerFunction::None, _) => Vec::new(),
        };
        self.set_bindings(Action::Grab, bindings);
    }

    /// Set the bindings for an action, replacing any existing ones.
    pub fn set_bindings(&mut self, action: Action, bindings: Vec<ButtonBinding>) {
        self.bindings.insert(action, bindings);
    }

    /// Get the bindings for an action.
    #[must_use]
    pub fn get_bindings(&self, action: &Action) -> &[ButtonBinding] {
        self.bindings.get(action).map_or(&[], |v| v.as_slice())
    }

    /// All actions fed by `button` on `device`, in [`Action::ALL`] order.
    #[must_use]
    pub fn actions_for(&self, device: Device, button: ControllerButton) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| {
                self.get_bindings(action)
                    .iter()
                    .any(|b| b.matches(device, button))
            })
            .collect()
    }

    /// Serialize to RON string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON string.
    ///
    /// # Errors
    /// Returns an error if the RON string is malformed.
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: Device = Device::LeftController;
    const R: Device = Device::RightController;

    #[test]
    fn test_default_map_trigger_grabs_grip_gestures() {
        let map = InputMap::default();
        assert_eq!(map.actions_for(L, ControllerButton::Trigger), vec![Action::Grab]);
        assert_eq!(
            map.actions_for(R, ControllerButton::Grip),
            vec![Action::ComplexGesture]
        );
        assert_eq!(
            map.actions_for(R, ControllerButton::TrackPad),
            vec![Action::Dolly]
        );
        assert!(map.actions_for(R, ControllerButton::Menu).is_empty());
    }

    #[test]
    fn test_gesture_on_trigger_moves_grab_to_grip() {
        let map =
            InputMap::from_presets(TriggerFunction::GrabObjectsAndWorld, GestureButton::Trigger);
        assert_eq!(
            map.actions_for(L, ControllerButton::Trigger),
            vec![Action::ComplexGesture]
        );
        assert_eq!(map.actions_for(L, ControllerButton::Grip), vec![Action::Grab]);
    }

    #[test]
    fn test_trigger_and_grip_both_gesture() {
        let map = InputMap::from_presets(
            TriggerFunction::GrabObjectsAndWorld,
            GestureButton::TriggerAndGrip,
        );
        assert_eq!(
            map.actions_for(L, ControllerButton::Trigger),
            vec![Action::ComplexGesture]
        );
        assert_eq!(
            map.actions_for(L, ControllerButton::Grip),
            vec![Action::ComplexGesture]
        );
        assert!(map.get_bindings(&Action::Grab).is_empty());
    }

    #[test]
    fn test_trigger_function_none_unbinds_grab() {
        let map = InputMap::from_presets(TriggerFunction::None, GestureButton::Grip);
        assert!(map.actions_for(L, ControllerButton::Trigger).is_empty());
        assert_eq!(
            map.actions_for(L, ControllerButton::Grip),
            vec![Action::ComplexGesture]
        );
    }

    #[test]
    fn test_gesture_none_disables_gestures() {
        let map = InputMap::from_presets(TriggerFunction::GrabObjectsAndWorld, GestureButton::None);
        assert!(map.get_bindings(&Action::ComplexGesture).is_empty());
        assert!(map.get_bindings(&Action::Grab).is_empty());
        assert_eq!(map.get_bindings(&Action::Dolly).len(), 1);
    }

    #[test]
    fn test_device_specific_binding() {
        let mut map = InputMap::new();
        map.set_bindings(
            Action::Dolly,
            vec![ButtonBinding::on(R, ControllerButton::Joystick)],
        );
        assert_eq!(
            map.actions_for(R, ControllerButton::Joystick),
            vec![Action::Dolly]
        );
        assert!(map.actions_for(L, ControllerButton::Joystick).is_empty());
    }

    #[test]
    fn test_one_button_feeds_several_actions_in_order() {
        let mut map = InputMap::new();
        map.set_bindings(
            Action::ComplexGesture,
            vec![ButtonBinding::any(ControllerButton::Trigger)],
        );
        map.set_bindings(Action::Grab, vec![ButtonBinding::any(ControllerButton::Trigger)]);
        assert_eq!(
            map.actions_for(L, ControllerButton::Trigger),
            vec![Action::Grab, Action::ComplexGesture]
        );
    }

    #[test]
    fn test_ron_roundtrip_preserves_table() {
        let map =
            InputMap::from_presets(TriggerFunction::GrabObjectsAndWorld, GestureButton::Trigger);
        let ron_str = map.to_ron().unwrap();
        let back = InputMap::from_ron(&ron_str).unwrap();
        assert_eq!(map, back);
    }

    #[test]
    fn test_from_config_uses_presets_without_file() {
        let config = InputConfig {
            gesture_button: GestureButton::Trigger,
            ..Default::default()
        };
        let map = InputMap::from_config(&config);
        assert_eq!(map.actions_for(R, ControllerButton::Grip), vec![Action::Grab]);
    }
}
