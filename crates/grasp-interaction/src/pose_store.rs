//! Per-device pose bookkeeping.
//!
//! Poses kept here are **physical**: the tracking system's native frame,
//! metres, origin at the play-area centre. Conversion to world space always
//! goes through the render view's physical-to-world transform at the moment
//! of use; see [`WorldPose::from_physical`].

use glam::{DMat4, DQuat, DVec3};
use grasp_input::Device;
use rustc_hash::FxHashMap;

/// Rigid world-space pose (scale stripped) of a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPose {
    /// World-space position.
    pub position: DVec3,
    /// World-space orientation.
    pub rotation: DQuat,
}

impl WorldPose {
    /// Map a physical device pose into world space through `physical_to_world`.
    #[must_use]
    pub fn from_physical(physical_to_world: &DMat4, physical_pose: &DMat4) -> Self {
        let world = *physical_to_world * *physical_pose;
        let (_, rotation, position) = world.to_scale_rotation_translation();
        Self {
            position,
            rotation: rotation.normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct DeviceRecord {
    live: Option<DMat4>,
    starting: Option<DMat4>,
    button_down: u32,
}

/// Live pose, gesture-start pose and gesture button count for every
/// connected device, plus the physical-to-world transform captured when the
/// current gesture started.
#[derive(Debug, Default)]
pub struct PoseStore {
    devices: FxHashMap<Device, DeviceRecord>,
    starting_physical_to_world: Option<DMat4>,
}

impl PoseStore {
    /// Empty store, no devices connected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a device. Reconnecting keeps nothing from before.
    pub fn connect(&mut self, device: Device) {
        self.devices.insert(device, DeviceRecord::default());
    }

    /// Forget a device. Returns whether it was tracked.
    pub fn disconnect(&mut self, device: Device) -> bool {
        self.devices.remove(&device).is_some()
    }

    /// Whether the device is being tracked.
    #[must_use]
    pub fn is_connected(&self, device: Device) -> bool {
        self.devices.contains_key(&device)
    }

    /// Overwrite the live physical pose. A pose from an unseen device
    /// implicitly connects it.
    pub fn record_pose(&mut self, device: Device, physical_pose: DMat4) {
        self.devices.entry(device).or_default().live = Some(physical_pose);
    }

    /// Snapshot the live pose as the gesture starting pose.
    pub fn record_starting_pose(&mut self, device: Device) {
        if let Some(record) = self.devices.get_mut(&device) {
            record.starting = record.live;
        }
    }

    /// Most recent physical pose.
    #[must_use]
    pub fn live_pose(&self, device: Device) -> Option<DMat4> {
        self.devices.get(&device).and_then(|r| r.live)
    }

    /// Physical pose captured when the device last pressed a gesture button.
    #[must_use]
    pub fn starting_pose(&self, device: Device) -> Option<DMat4> {
        self.devices.get(&device).and_then(|r| r.starting)
    }

    /// Gesture buttons currently counted as down on this device.
    #[must_use]
    pub fn button_down_count(&self, device: Device) -> u32 {
        self.devices.get(&device).map_or(0, |r| r.button_down)
    }

    /// Count one more gesture button down and return the new count.
    pub fn increment_button_down(&mut self, device: Device) -> u32 {
        let record = self.devices.entry(device).or_default();
        record.button_down = record.button_down.saturating_add(1);
        record.button_down
    }

    /// A release clears the whole count, not just one press.
    pub fn reset_button_down(&mut self, device: Device) {
        if let Some(record) = self.devices.get_mut(&device) {
            record.button_down = 0;
        }
    }

    /// Capture the physical-to-world transform at gesture start.
    pub fn record_starting_physical_to_world(&mut self, physical_to_world: DMat4) {
        self.starting_physical_to_world = Some(physical_to_world);
    }

    /// Physical-to-world transform captured at gesture start.
    #[must_use]
    pub fn starting_physical_to_world(&self) -> Option<DMat4> {
        self.starting_physical_to_world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: Device = Device::LeftController;

    #[test]
    fn test_record_pose_connects_implicitly() {
        let mut store = PoseStore::new();
        assert!(!store.is_connected(L));
        store.record_pose(L, DMat4::from_translation(DVec3::X));
        assert!(store.is_connected(L));
        assert_eq!(
            store.live_pose(L),
            Some(DMat4::from_translation(DVec3::X))
        );
    }

    #[test]
    fn test_starting_pose_is_a_snapshot() {
        let mut store = PoseStore::new();
        store.record_pose(L, DMat4::from_translation(DVec3::X));
        store.record_starting_pose(L);
        store.record_pose(L, DMat4::from_translation(DVec3::Y));
        assert_eq!(
            store.starting_pose(L),
            Some(DMat4::from_translation(DVec3::X))
        );
        assert_eq!(
            store.live_pose(L),
            Some(DMat4::from_translation(DVec3::Y))
        );
    }

    #[test]
    fn test_release_resets_whole_count() {
        let mut store = PoseStore::new();
        store.connect(L);
        assert_eq!(store.increment_button_down(L), 1);
        assert_eq!(store.increment_button_down(L), 2);
        store.reset_button_down(L);
        assert_eq!(store.button_down_count(L), 0);
        store.reset_button_down(L);
        assert_eq!(store.button_down_count(L), 0);
    }

    #[test]
    fn test_disconnect_forgets_everything() {
        let mut store = PoseStore::new();
        store.record_pose(L, DMat4::IDENTITY);
        store.increment_button_down(L);
        assert!(store.disconnect(L));
        assert!(!store.disconnect(L));
        assert_eq!(store.live_pose(L), None);
        assert_eq!(store.button_down_count(L), 0);
    }

    #[test]
    fn test_world_pose_strips_scale() {
        let p2w = DMat4::from_scale(DVec3::splat(1000.0));
        let pose = DMat4::from_rotation_translation(
            DQuat::from_rotation_y(0.5),
            DVec3::new(1.0, 2.0, 3.0),
        );
        let world = WorldPose::from_physical(&p2w, &pose);
        assert!(world.position.abs_diff_eq(DVec3::new(1000.0, 2000.0, 3000.0), 1e-9));
        assert!(world.rotation.abs_diff_eq(DQuat::from_rotation_y(0.5), 1e-9));
    }
}
