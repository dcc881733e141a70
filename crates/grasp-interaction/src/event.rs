//! Device events delivered to the interaction core once per tick.

use glam::DMat4;
use grasp_input::{ButtonEdge, Device};

/// One entry in a tick's event batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    /// A device joined the session.
    Connected(Device),
    /// A button went down or up.
    Button(ButtonEdge),
    /// New physical pose for a device.
    Move {
        /// Originating device.
        device: Device,
        /// Pose in physical (tracking) space.
        physical_pose: DMat4,
    },
    /// A device left the session; its in-flight interactions are cancelled.
    Disconnected(Device),
}

impl InteractionEvent {
    /// Shorthand for [`InteractionEvent::Move`].
    #[must_use]
    pub fn moved(device: Device, physical_pose: DMat4) -> Self {
        Self::Move {
            device,
            physical_pose,
        }
    }

    /// Processing order of the input pass: buttons before moves.
    fn input_phase(&self) -> Option<u8> {
        match self {
            Self::Button(_) => Some(0),
            Self::Move { .. } => Some(1),
            Self::Connected(_) | Self::Disconnected(_) => None,
        }
    }
}

/// A tick's batch split into the order it is processed in.
#[derive(Debug, Default)]
pub(crate) struct TickSchedule<'a> {
    /// Connects, plus any disconnect that a later connect of the same device
    /// supersedes. Batch order.
    pub(crate) lifecycle_before: Vec<&'a InteractionEvent>,
    /// Every button edge, then every move. Ties keep batch order.
    pub(crate) input: Vec<&'a InteractionEvent>,
    /// Remaining disconnects, batch order.
    pub(crate) lifecycle_after: Vec<&'a InteractionEvent>,
}

impl<'a> TickSchedule<'a> {
    pub(crate) fn new(events: &'a [InteractionEvent]) -> Self {
        let mut schedule = Self::default();
        for (i, event) in events.iter().enumerate() {
            match event {
                InteractionEvent::Connected(_) => schedule.lifecycle_before.push(event),
                InteractionEvent::Disconnected(device) => {
                    let reconnects = events[i + 1..]
                        .iter()
                        .any(|later| *later == InteractionEvent::Connected(*device));
                    if reconnects {
                        schedule.lifecycle_before.push(event);
                    } else {
                        schedule.lifecycle_after.push(event);
                    }
                }
                InteractionEvent::Button(_) | InteractionEvent::Move { .. } => {
                    schedule.input.push(event);
                }
            }
        }
        schedule.input.sort_by_key(|event| event.input_phase());
        schedule
    }
}

impl From<ButtonEdge> for InteractionEvent {
    fn from(edge: ButtonEdge) -> Self {
        Self::Button(edge)
    }
}
