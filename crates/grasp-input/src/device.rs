//! Tracked devices and their physical buttons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked device. Stable for the whole session and passed around by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Device {
    /// Left hand controller.
    LeftController,
    /// Right hand controller.
    RightController,
    /// The headset itself.
    HeadMountedDisplay,
    /// Any other tracked puck, numbered by the runtime.
    GenericTracker(u8),
}

impl Device {
    /// The two hand controllers, left first.
    pub const CONTROLLERS: [Device; 2] = [Device::LeftController, Device::RightController];

    /// Whether this device is one of the two hand controllers.
    #[must_use]
    pub fn is_controller(self) -> bool {
        matches!(self, Device::LeftController | Device::RightController)
    }

    /// The other hand of a controller pair.
    #[must_use]
    pub fn partner(self) -> Option<Device> {
        match self {
            Device::LeftController => Some(Device::RightController),
            Device::RightController => Some(Device::LeftController),
            _ => None,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::LeftController => f.write_str("LeftController"),
            Device::RightController => f.write_str("RightController"),
            Device::HeadMountedDisplay => f.write_str("HeadMountedDisplay"),
            Device::GenericTracker(n) => write!(f, "GenericTracker({n})"),
        }
    }
}

/// Physical controller inputs that can be bound to actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControllerButton {
    /// Index-finger trigger.
    Trigger,
    /// Side grip / squeeze.
    Grip,
    /// Touchpad click.
    TrackPad,
    /// Application menu button.
    Menu,
    /// Thumbstick click.
    Joystick,
    /// Face button A / X.
    ButtonA,
    /// Face button B / Y.
    ButtonB,
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonState {
    /// The button went down.
    Pressed,
    /// The button came up.
    Released,
}

/// A single button transition reported by the device layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonEdge {
    /// Originating device.
    pub device: Device,
    /// Which button.
    pub button: ControllerButton,
    /// Press or release.
    pub state: ButtonState,
}

impl ButtonEdge {
    /// A press edge.
    #[must_use]
    pub fn pressed(device: Device, button: ControllerButton) -> Self {
        Self {
            device,
            button,
            state: ButtonState::Pressed,
        }
    }

    /// A release edge.
    #[must_use]
    pub fn released(device: Device, button: ControllerButton) -> Self {
        Self {
            device,
            button,
            state: ButtonState::Released,
        }
    }
}
