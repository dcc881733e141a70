//! The per-device interaction state machine.
//!
//! [`InteractionStyle`] owns the pose store, the gesture recognizer and the
//! two manipulation engines. The host feeds it one batch of
//! [`InteractionEvent`]s per tick through [`InteractionStyle::process_tick`];
//! the style routes button edges through the [`InputMap`], forwards motion to
//! whichever engine the device is engaged with, and leaves the results in the
//! scene graph and the render view.
//!
//! Within a tick, connects are handled first, then every button edge, then
//! every move, then disconnects. A button press in the same tick as a move is
//! therefore applied before the move. Connects and disconnects keep their
//! batch order relative to each other, so a device that drops and comes back
//! within one tick ends the tick connected.

use crate::error::InteractionError;
use crate::event::{InteractionEvent, TickSchedule};
use crate::gesture::{GestureEdge, GestureRecognizer, GestureState};
use crate::navigation;
use crate::object_manipulation::{GrabStart, ObjectManipulator};
use crate::pose_store::{PoseStore, WorldPose};
use crate::scene::{ObjectHandle, RenderView, SceneGraph};
use crate::world_pinch::WorldPinch;
use glam::{DMat4, DVec3};
use grasp_config::{Config, InteractionConfig};
use grasp_input::{Action, ButtonEdge, ButtonState, Device, InputMap};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info, warn};

/// What a single device is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    /// Nothing.
    #[default]
    Idle,
    /// Carrying a picked object.
    PositioningObject,
    /// Flying along the controller direction.
    Dollying,
    /// One half of a two-handed world pinch.
    Zooming,
}

/// Tunables for world navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSettings {
    /// World units in one real-world metre.
    pub world_units_per_meter: f64,
    /// Dolly speed in physical metres per second.
    pub dolly_speed_m_s: f64,
    /// Cut-off on `|X · Y'|` for the combined pose.
    pub parallel_axis_threshold: f64,
    /// Seconds per tick.
    pub tick_dt: f64,
}

impl NavigationSettings {
    /// Settings from the interaction section plus the tick length.
    #[must_use]
    pub fn new(interaction: &InteractionConfig, tick_dt: f64) -> Self {
        Self {
            world_units_per_meter: interaction.world_units_per_meter,
            dolly_speed_m_s: interaction.dolly_speed_m_s,
            parallel_axis_threshold: interaction.parallel_axis_threshold,
            tick_dt,
        }
    }

    /// Physical distance covered by one tick of dolly.
    #[must_use]
    pub fn dolly_step_m(&self) -> f64 {
        self.dolly_speed_m_s * self.tick_dt
    }
}

/// What a tick did, for hosts and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Gesture edges emitted this tick, in order.
    pub gesture_edges: Vec<GestureEdge>,
    /// Objects started being held this tick.
    pub grabs_started: Vec<(Device, ObjectHandle)>,
    /// Number of successful object updates.
    pub objects_moved: usize,
    /// Whether the physical-to-world transform changed.
    pub world_moved: bool,
    /// Whether a redraw was requested.
    pub render_requested: bool,
}

/// Two-controller VR interaction core.
#[derive(Debug)]
pub struct InteractionStyle {
    input_map: InputMap,
    settings: NavigationSettings,
    poses: PoseStore,
    connected: FxHashSet<Device>,
    states: FxHashMap<Device, InteractionState>,
    recognizer: GestureRecognizer,
    manipulator: ObjectManipulator,
    pinch: WorldPinch,
}

impl Default for InteractionStyle {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl InteractionStyle {
    /// Build from explicit parts.
    #[must_use]
    pub fn new(input_map: InputMap, interaction: &InteractionConfig, tick_dt: f64) -> Self {
        Self {
            input_map,
            settings: NavigationSettings::new(interaction, tick_dt),
            poses: PoseStore::new(),
            connected: FxHashSet::default(),
            states: FxHashMap::default(),
            recognizer: GestureRecognizer::new(),
            manipulator: ObjectManipulator::new(interaction.grab_enabled),
            pinch: WorldPinch::new(interaction.parallel_axis_threshold),
        }
    }

    /// Build from a full configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            InputMap::from_config(&config.input),
            &config.interaction,
            config.session.tick_dt(),
        )
    }

    /// Current state of `device`. Unknown devices are idle.
    #[must_use]
    pub fn state(&self, device: Device) -> InteractionState {
        self.states.get(&device).copied().unwrap_or_default()
    }

    /// The object `device` holds.
    #[must_use]
    pub fn picked_object(&self, device: Device) -> Option<ObjectHandle> {
        self.manipulator.picked(device)
    }

    /// Gesture recognizer state.
    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.recognizer.state()
    }

    /// Read access to the pose store.
    #[must_use]
    pub fn poses(&self) -> &PoseStore {
        &self.poses
    }

    /// The active binding table.
    #[must_use]
    pub fn input_map(&self) -> &InputMap {
        &self.input_map
    }

    /// Replace the binding table. Takes effect on the next button edge.
    pub fn set_input_map(&mut self, input_map: InputMap) {
        self.input_map = input_map;
    }

    /// Navigation tunables.
    #[must_use]
    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Whether grab presses pick objects.
    #[must_use]
    pub fn grab_enabled(&self) -> bool {
        self.manipulator.grab_enabled()
    }

    /// Switch object picking on or off.
    pub fn set_grab_enabled(&mut self, enabled: bool) {
        self.manipulator.set_grab_enabled(enabled);
    }

    /// Run one tick over a batch of device events.
    pub fn process_tick<S, V>(
        &mut self,
        events: &[InteractionEvent],
        scene: &mut S,
        view: &mut V,
    ) -> TickReport
    where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        let schedule = TickSchedule::new(events);
        let mut report = TickReport::default();

        for event in schedule.lifecycle_before {
            self.handle_lifecycle(event, &mut report);
        }

        let mut controller_moved = false;
        for event in schedule.input {
            match *event {
                InteractionEvent::Button(edge) => {
                    self.handle_button(edge, scene, view, &mut report);
                }
                InteractionEvent::Move {
                    device,
                    physical_pose,
                } => {
                    self.handle_move(device, physical_pose, scene, view, &mut report);
                    controller_moved |= device.is_controller();
                }
                InteractionEvent::Connected(_) | InteractionEvent::Disconnected(_) => {}
            }
        }
        if controller_moved {
            self.recognize(scene, view, &mut report);
        }

        for event in schedule.lifecycle_after {
            self.handle_lifecycle(event, &mut report);
        }
        self.advance_dolly(view, &mut report);

        if report.objects_moved > 0 || report.world_moved {
            view.request_render();
            report.render_requested = true;
        }
        report
    }

    /// Start tracking a device. A device that was already connected has its
    /// in-flight interactions cancelled first. A device only seen through its
    /// poses so far keeps its pose record and whatever it is doing.
    pub fn connect(&mut self, device: Device) {
        self.connect_device(device, &mut TickReport::default());
    }

    /// Stop tracking a device, cancelling whatever it was doing.
    pub fn disconnect(&mut self, device: Device) {
        self.disconnect_device(device, &mut TickReport::default());
    }

    /// Cancel every in-flight interaction: grabs released, dolly stopped,
    /// pinch ended. Device connections and poses are kept.
    pub fn cancel_all(&mut self) {
        for (device, object) in self.manipulator.end_all() {
            debug!(%device, %object, "grab cancelled");
        }
        if self.recognizer.cancel(&mut self.poses) == Some(GestureEdge::End) {
            self.end_pinch();
        }
        for state in self.states.values_mut() {
            *state = InteractionState::Idle;
        }
        info!("all interactions cancelled");
    }

    /// Current magnification, if the view has a usable transform.
    #[must_use]
    pub fn magnification<V: RenderView + ?Sized>(&self, view: &V) -> Option<f64> {
        view.physical_to_world()
            .and_then(|p2w| navigation::magnification(&p2w, self.settings.world_units_per_meter))
    }

    /// Rescale the world about the centre of the visible bounds (the world
    /// origin when nothing is visible) so that the magnification becomes
    /// `target`, clamped to `[0.01, 100]`. Returns whether anything changed.
    pub fn set_magnification<V: RenderView + ?Sized>(&mut self, view: &mut V, target: f64) -> bool {
        let Some(p2w) = view.physical_to_world() else {
            error!("render view has no physical-to-world transform, cannot magnify");
            return false;
        };
        let focus = view.visible_bounds_center().unwrap_or(DVec3::ZERO);
        let target = navigation::clamp_magnification(target);
        match navigation::magnify(&p2w, focus, target, self.settings.world_units_per_meter) {
            Some(next) => {
                view.set_physical_to_world(next);
                view.request_render();
                info!(magnification = target, "magnification changed");
                true
            }
            None => false,
        }
    }

    fn handle_lifecycle(&mut self, event: &InteractionEvent, report: &mut TickReport) {
        match *event {
            InteractionEvent::Connected(device) => self.connect_device(device, report),
            InteractionEvent::Disconnected(device) => self.disconnect_device(device, report),
            InteractionEvent::Button(_) | InteractionEvent::Move { .. } => {}
        }
    }

    fn set_state(&mut self, device: Device, state: InteractionState) {
        self.states.insert(device, state);
    }

    fn handle_button<S, V>(
        &mut self,
        edge: ButtonEdge,
        scene: &mut S,
        view: &mut V,
        report: &mut TickReport,
    ) where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        let device = edge.device;
        for action in self.input_map.actions_for(device, edge.button) {
            match (action, edge.state) {
                (Action::Grab, ButtonState::Pressed) => {
                    self.start_grab(device, scene, view, report)
                }
                (Action::Grab, ButtonState::Released) => self.end_grab(device),
                (Action::ComplexGesture, state) => {
                    let p2w = view.physical_to_world();
                    if let Some(gesture) =
                        self.recognizer.on_button(&mut self.poses, device, state, p2w)
                    {
                        self.apply_gesture(gesture, scene, view, report);
                    }
                }
                (Action::Dolly, ButtonState::Pressed) => {
                    if self.state(device) == InteractionState::Idle {
                        self.set_state(device, InteractionState::Dollying);
                        debug!(%device, "dolly started");
                    }
                }
                (Action::Dolly, ButtonState::Released) => {
                    if self.state(device) == InteractionState::Dollying {
                        self.set_state(device, InteractionState::Idle);
                        debug!(%device, "dolly stopped");
                    }
                }
            }
        }
    }

    fn start_grab<S, V>(&mut self, device: Device, scene: &S, view: &V, report: &mut TickReport)
    where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        let current = self.state(device);
        if current != InteractionState::Idle {
            debug!(%device, state = ?current, "grab ignored, device is busy");
            return;
        }
        let Some(p2w) = view.physical_to_world() else {
            error!("render view has no physical-to-world transform, grab ignored");
            return;
        };
        let Some(physical) = self.poses.live_pose(device) else {
            debug!(%device, "no pose recorded yet, grab ignored");
            return;
        };

        match self
            .manipulator
            .start(scene, device, WorldPose::from_physical(&p2w, &physical))
        {
            GrabStart::Picked(object) => {
                self.set_state(device, InteractionState::PositioningObject);
                report.grabs_started.push((device, object));
                info!(%device, %object, "object grabbed");
            }
            GrabStart::NothingPicked => {}
            GrabStart::AlreadyHeld { object, holder } => {
                debug!(%device, %object, %holder, "object already held by the other hand");
            }
        }
    }

    fn end_grab(&mut self, device: Device) {
        if self.state(device) != InteractionState::PositioningObject {
            return;
        }
        if let Some(object) = self.manipulator.end(device) {
            info!(%device, %object, "object released");
        }
        self.set_state(device, InteractionState::Idle);
    }

    fn handle_move<S, V>(
        &mut self,
        device: Device,
        physical_pose: DMat4,
        scene: &mut S,
        view: &V,
        report: &mut TickReport,
    ) where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        self.poses.record_pose(device, physical_pose);
        if self.state(device) != InteractionState::PositioningObject {
            return;
        }

        let Some(p2w) = view.physical_to_world() else {
            error!("render view has no physical-to-world transform, object not moved");
            return;
        };
        let pose = WorldPose::from_physical(&p2w, &physical_pose);
        match self.manipulator.update(scene, device, pose) {
            Ok(true) => report.objects_moved += 1,
            Ok(false) => {}
            Err(InteractionError::StaleObject(object)) => {
                warn!(%device, %object, "held object no longer exists, releasing");
                self.manipulator.end(device);
                self.set_state(device, InteractionState::Idle);
            }
            // Logged where it is detected.
            Err(InteractionError::NonLinearTransform { .. }) => {}
            Err(err) => warn!(%device, %err, "object update failed"),
        }
    }

    fn recognize<S, V>(&mut self, scene: &S, view: &mut V, report: &mut TickReport)
    where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        if let Some(gesture) = self.recognizer.recognize(&self.poses) {
            self.apply_gesture(gesture, scene, view, report);
        }
    }

    fn apply_gesture<S, V>(
        &mut self,
        gesture: GestureEdge,
        scene: &S,
        view: &mut V,
        report: &mut TickReport,
    ) where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        report.gesture_edges.push(gesture);
        match gesture {
            GestureEdge::Start => {
                self.start_pinch();
                self.update_pinch(scene, view, report);
            }
            GestureEdge::Update => self.update_pinch(scene, view, report),
            GestureEdge::End => self.end_pinch(),
        }
    }

    fn start_pinch(&mut self) {
        let [a, b] = Device::CONTROLLERS;
        match (self.poses.starting_pose(a), self.poses.starting_pose(b)) {
            (Some(pa), Some(pb)) => match self.pinch.start_gesture(&pa, &pb) {
                Ok(()) => info!("world pinch started"),
                Err(err) => debug!(%err, "pinch started from degenerate poses, world stays put"),
            },
            _ => {
                self.pinch.end_gesture();
                debug!("pinch started before both controllers reported a pose");
            }
        }
    }

    fn update_pinch<S, V>(&mut self, scene: &S, view: &mut V, report: &mut TickReport)
    where
        S: SceneGraph + ?Sized,
        V: RenderView + ?Sized,
    {
        // Object manipulation has priority over world manipulation.
        if self.manipulator.holds_selectable(scene)
            || Device::CONTROLLERS
                .iter()
                .any(|d| self.state(*d) == InteractionState::PositioningObject)
        {
            return;
        }

        for controller in Device::CONTROLLERS {
            self.set_state(controller, InteractionState::Zooming);
        }

        if !self.pinch.has_valid_start() {
            return;
        }
        let [a, b] = Device::CONTROLLERS;
        let (Some(p2w_start), Some(pa), Some(pb)) = (
            self.poses.starting_physical_to_world(),
            self.poses.live_pose(a),
            self.poses.live_pose(b),
        ) else {
            return;
        };

        match self.pinch.update(&pa, &pb, &p2w_start) {
            Ok(next) => {
                view.set_physical_to_world(next);
                report.world_moved = true;
            }
            Err(err) => debug!(%err, "pinch update skipped"),
        }
    }

    fn end_pinch(&mut self) {
        self.pinch.end_gesture();
        for controller in Device::CONTROLLERS {
            if self.state(controller) == InteractionState::Zooming {
                self.set_state(controller, InteractionState::Idle);
            }
        }
        info!("world pinch ended");
    }

    fn advance_dolly<V: RenderView + ?Sized>(&mut self, view: &mut V, report: &mut TickReport) {
        let mut dollying: Vec<Device> = self
            .states
            .iter()
            .filter(|(_, s)| **s == InteractionState::Dollying)
            .map(|(d, _)| *d)
            .collect();
        if dollying.is_empty() {
            return;
        }
        dollying.sort();

        let step = self.settings.dolly_step_m();
        for device in dollying {
            let Some(p2w) = view.physical_to_world() else {
                error!("render view has no physical-to-world transform, dolly skipped");
                return;
            };
            let Some(pose) = self.poses.live_pose(device) else {
                continue;
            };
            if let Some(next) = navigation::dolly(&p2w, &pose, step) {
                view.set_physical_to_world(next);
                report.world_moved = true;
            }
        }
    }

    /// Cancel everything `device` takes part in without forgetting it.
    fn release_device(&mut self, device: Device, report: &mut TickReport) {
        if let Some(object) = self.manipulator.end(device) {
            debug!(%device, %object, "grab cancelled");
        }
        if device.is_controller()
            && let Some(gesture) =
                self.recognizer
                    .on_button(&mut self.poses, device, ButtonState::Released, None)
        {
            report.gesture_edges.push(gesture);
            if gesture == GestureEdge::End {
                self.end_pinch();
            }
        }
        self.set_state(device, InteractionState::Idle);
    }

    fn connect_device(&mut self, device: Device, report: &mut TickReport) {
        if self.connected.contains(&device) {
            self.release_device(device, report);
            self.poses.connect(device);
        } else if !self.poses.is_connected(device) {
            self.poses.connect(device);
        }
        self.connected.insert(device);
        self.states.entry(device).or_default();
        info!(%device, "device connected");
    }

    fn disconnect_device(&mut self, device: Device, report: &mut TickReport) {
        self.connected.remove(&device);
        self.release_device(device, report);
        self.states.remove(&device);
        if self.poses.disconnect(device) {
            info!(%device, "device disconnected");
        }
    }
}

#[cfg(test)]
#[path = "style_tests.rs"]
mod tests;
