//! Tracked-device identities and the controller-button → interaction-action table.

pub mod action_map;
pub mod device;
pub mod keybindings;

pub use action_map::{Action, ButtonBinding, InputMap};
pub use device::{ButtonEdge, ButtonState, ControllerButton, Device};
pub use keybindings::{Conflict, InputMapError};
