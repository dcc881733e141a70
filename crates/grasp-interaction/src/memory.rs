//! In-memory [`SceneGraph`] and [`RenderView`] used by the demo and the tests.
//!
//! Objects are spheres (centre + radius in object space). Each object and each
//! transform node has at most one parent transform; an object's world matrix
//! is the product of its parent chain, outermost first.

use crate::error::InteractionError;
use crate::scene::{
    ObjectHandle, OutermostTransform, PickResult, RenderView, SceneGraph, TransformHandle,
    TransformKind,
};
use glam::{DMat4, DVec3};

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot storage. Removing a value bumps its slot's generation.
#[derive(Debug)]
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return (index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_ref())
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_mut())
    }

    fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        Some(value)
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (i as u32, s.generation, v)))
    }
}

#[derive(Debug, Clone)]
struct SceneObject {
    name: String,
    center: DVec3,
    radius: f64,
    selectable: bool,
    parent: Option<TransformHandle>,
}

#[derive(Debug, Clone)]
struct TransformNode {
    name: String,
    kind: TransformKind,
    matrix: DMat4,
    interaction_tagged: bool,
    parent: Option<TransformHandle>,
}

/// Scene graph of pickable spheres.
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: Arena<SceneObject>,
    transforms: Arena<TransformNode>,
}

impl MemoryScene {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selectable sphere with no parent transform.
    pub fn add_object(&mut self, name: &str, center: DVec3, radius: f64) -> ObjectHandle {
        let (index, generation) = self.objects.insert(SceneObject {
            name: name.to_string(),
            center,
            radius,
            selectable: true,
            parent: None,
        });
        ObjectHandle::from_raw(index, generation)
    }

    /// Delete an object. Its handles stop resolving.
    pub fn remove_object(&mut self, object: ObjectHandle) -> bool {
        self.objects
            .remove(object.index(), object.generation())
            .is_some()
    }

    /// Toggle whether an object accepts manipulation.
    pub fn set_selectable(&mut self, object: ObjectHandle, selectable: bool) -> bool {
        match self.object_mut(object) {
            Ok(o) => {
                o.selectable = selectable;
                true
            }
            Err(_) => false,
        }
    }

    /// Add a free-standing transform node.
    pub fn add_transform(
        &mut self,
        name: &str,
        kind: TransformKind,
        matrix: DMat4,
    ) -> TransformHandle {
        let (index, generation) = self.transforms.insert(TransformNode {
            name: name.to_string(),
            kind,
            matrix,
            interaction_tagged: false,
            parent: None,
        });
        TransformHandle::from_raw(index, generation)
    }

    /// Make `transform` the direct parent of `object`, replacing any parent.
    pub fn set_object_parent(
        &mut self,
        object: ObjectHandle,
        transform: TransformHandle,
    ) -> Result<(), InteractionError> {
        self.transform(transform)?;
        self.object_mut(object)?.parent = Some(transform);
        Ok(())
    }

    /// Matrix of a single transform node.
    #[must_use]
    pub fn transform_matrix(&self, transform: TransformHandle) -> Option<DMat4> {
        self.transform(transform).ok().map(|t| t.matrix)
    }

    /// Name of a transform node.
    #[must_use]
    pub fn transform_name(&self, transform: TransformHandle) -> Option<&str> {
        self.transform(transform).ok().map(|t| t.name.as_str())
    }

    /// Parent transforms of `object`, innermost first.
    #[must_use]
    pub fn parent_chain(&self, object: ObjectHandle) -> Vec<TransformHandle> {
        let mut chain = Vec::new();
        let mut next = self.object(object).ok().and_then(|o| o.parent);
        while let Some(handle) = next {
            if chain.contains(&handle) {
                break;
            }
            let Ok(node) = self.transform(handle) else {
                break;
            };
            chain.push(handle);
            next = node.parent;
        }
        chain
    }

    /// Object-to-world matrix.
    #[must_use]
    pub fn world_matrix(&self, object: ObjectHandle) -> Option<DMat4> {
        self.object(object).ok()?;
        let matrix = self
            .parent_chain(object)
            .iter()
            .filter_map(|h| self.transform_matrix(*h))
            .fold(DMat4::IDENTITY, |acc, m| m * acc);
        Some(matrix)
    }

    /// World-space centre of an object.
    #[must_use]
    pub fn world_center(&self, object: ObjectHandle) -> Option<DVec3> {
        let center = self.object(object).ok()?.center;
        self.world_matrix(object).map(|m| m.transform_point3(center))
    }

    fn object(&self, object: ObjectHandle) -> Result<&SceneObject, InteractionError> {
        self.objects
            .get(object.index(), object.generation())
            .ok_or(InteractionError::StaleObject(object))
    }

    fn object_mut(&mut self, object: ObjectHandle) -> Result<&mut SceneObject, InteractionError> {
        self.objects
            .get_mut(object.index(), object.generation())
            .ok_or(InteractionError::StaleObject(object))
    }

    fn transform(&self, transform: TransformHandle) -> Result<&TransformNode, InteractionError> {
        self.transforms
            .get(transform.index(), transform.generation())
            .ok_or(InteractionError::StaleTransform(transform))
    }

    fn transform_mut(
        &mut self,
        transform: TransformHandle,
    ) -> Result<&mut TransformNode, InteractionError> {
        self.transforms
            .get_mut(transform.index(), transform.generation())
            .ok_or(InteractionError::StaleTransform(transform))
    }
}

impl SceneGraph for MemoryScene {
    fn pick_object_at(&self, world_point: DVec3) -> Option<PickResult> {
        let mut best: Option<(f64, PickResult)> = None;
        for (index, generation, object) in self.objects.iter() {
            let handle = ObjectHandle::from_raw(index, generation);
            let Some(matrix) = self.world_matrix(handle) else {
                continue;
            };
            let center = matrix.transform_point3(object.center);
            let radius = object.radius * matrix.x_axis.truncate().length();
            let distance = center.distance(world_point);
            if distance > radius {
                continue;
            }
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((
                    distance,
                    PickResult {
                        object: handle,
                        selectable: object.selectable,
                    },
                ));
            }
        }
        best.map(|(_, pick)| pick)
    }

    fn is_selectable(&self, object: ObjectHandle) -> Option<bool> {
        self.object(object).ok().map(|o| o.selectable)
    }

    fn object_name(&self, object: ObjectHandle) -> Option<String> {
        self.object(object).ok().map(|o| o.name.clone())
    }

    fn outermost_transform(&self, object: ObjectHandle) -> Option<OutermostTransform> {
        let handle = *self.parent_chain(object).last()?;
        let node = self.transform(handle).ok()?;
        Some(OutermostTransform {
            handle,
            kind: node.kind,
            interaction_tagged: node.interaction_tagged,
        })
    }

    fn create_linear_transform(&mut self, name: &str) -> TransformHandle {
        self.add_transform(name, TransformKind::Linear, DMat4::IDENTITY)
    }

    fn set_outermost_transform(
        &mut self,
        object: ObjectHandle,
        transform: TransformHandle,
    ) -> Result<(), InteractionError> {
        self.transform(transform)?;
        let chain = self.parent_chain(object);
        if chain.contains(&transform) {
            return Ok(());
        }
        match chain.last().copied() {
            Some(top) => self.transform_mut(top)?.parent = Some(transform),
            None => self.object_mut(object)?.parent = Some(transform),
        }
        Ok(())
    }

    fn tag_interaction_transform(
        &mut self,
        transform: TransformHandle,
    ) -> Result<(), InteractionError> {
        self.transform_mut(transform)?.interaction_tagged = true;
        Ok(())
    }

    fn concatenate(
        &mut self,
        transform: TransformHandle,
        incremental: &DMat4,
    ) -> Result<(), InteractionError> {
        let node = self.transform_mut(transform)?;
        if node.kind == TransformKind::NonLinear {
            return Err(InteractionError::NonLinearTransform {
                object: node.name.clone(),
            });
        }
        node.matrix = *incremental * node.matrix;
        Ok(())
    }
}

/// Render view holding a physical-to-world transform and a render counter.
#[derive(Debug, Clone)]
pub struct MemoryView {
    physical_to_world: Option<DMat4>,
    visible_bounds: Option<(DVec3, DVec3)>,
    render_requests: u64,
}

impl Default for MemoryView {
    fn default() -> Self {
        Self::new(DMat4::IDENTITY)
    }
}

impl MemoryView {
    /// View with the given physical-to-world transform.
    #[must_use]
    pub fn new(physical_to_world: DMat4) -> Self {
        Self {
            physical_to_world: Some(physical_to_world),
            visible_bounds: None,
            render_requests: 0,
        }
    }

    /// View with no camera rig at all.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            physical_to_world: None,
            visible_bounds: None,
            render_requests: 0,
        }
    }

    /// Set the world-space bounds of what is visible.
    pub fn set_visible_bounds(&mut self, min: DVec3, max: DVec3) {
        self.visible_bounds = Some((min.min(max), min.max(max)));
    }

    /// How many redraws have been requested.
    #[must_use]
    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }
}

impl RenderView for MemoryView {
    fn physical_to_world(&self) -> Option<DMat4> {
        self.physical_to_world
    }

    fn set_physical_to_world(&mut self, physical_to_world: DMat4) {
        self.physical_to_world = Some(physical_to_world);
    }

    fn visible_bounds_center(&self) -> Option<DVec3> {
        self.visible_bounds.map(|(min, max)| (min + max) * 0.5)
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }
}
