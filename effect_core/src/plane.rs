// Plane records and the registry that owns them.
// All per-image state lives here, keyed by PlaneId; nothing is stored on DOM elements.

use std::collections::BTreeMap;

use crate::geometry::CellCounts;
use crate::types::{PixelRect, PlaneId, ShaderVariant};
use crate::uniforms::{self, UniformSet, UniformValue};

/// State of one tracked image.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneRecord {
    id: PlaneId,
    variant: ShaderVariant,
    grid_size: f32,
    bounds: PixelRect,
    cells: CellCounts,
    pub uniforms: UniformSet,
    /// Set while a reveal has been triggered and the element has not exited since.
    pub animated: bool,
    /// Texture uploaded and mesh built; only ready planes are observed and drawn.
    pub ready: bool,
}

impl PlaneRecord {
    pub fn new(id: PlaneId, variant: ShaderVariant, grid_size: f32, bounds: PixelRect) -> Self {
        let mut uniforms = UniformSet::new();
        uniforms.declare(uniforms::GRID_SIZE, UniformValue::Float(grid_size));
        uniforms.declare(
            uniforms::IMAGE_SIZE,
            UniformValue::Vec2([bounds.width, bounds.height]),
        );
        uniforms.declare(uniforms::PROGRESS, UniformValue::Float(0.0));
        uniforms.declare(uniforms::TIME, UniformValue::Float(0.0));
        if variant == ShaderVariant::Wave {
            uniforms.declare(uniforms::DIRECTION, UniformValue::Float(1.0));
            uniforms.declare(uniforms::POINTER, UniformValue::Vec2([0.5, 0.5]));
        }

        PlaneRecord {
            id,
            variant,
            grid_size,
            bounds,
            cells: CellCounts::for_bounds(&bounds, grid_size),
            uniforms,
            animated: false,
            ready: false,
        }
    }

    pub fn id(&self) -> PlaneId {
        self.id
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn bounds(&self) -> PixelRect {
        self.bounds
    }

    pub fn cells(&self) -> CellCounts {
        self.cells
    }

    pub fn progress(&self) -> f32 {
        self.uniforms.float(uniforms::PROGRESS).unwrap_or(0.0)
    }

    pub fn set_progress(&mut self, value: f32) {
        self.uniforms.set_float(uniforms::PROGRESS, value);
    }

    /// Apply a new bounding box. Size changes update the image-size uniform and cell counts.
    ///
    /// Returns true when the cell counts changed and the mesh must be rebuilt.
    pub fn apply_bounds(&mut self, bounds: PixelRect) -> bool {
        self.bounds = bounds;
        self.uniforms
            .set_vec2(uniforms::IMAGE_SIZE, [bounds.width, bounds.height]);
        let cells = CellCounts::for_bounds(&bounds, self.grid_size);
        let changed = cells != self.cells;
        self.cells = cells;
        changed
    }
}

/// Owned collection of active planes.
#[derive(Debug, Default)]
pub struct PlaneRegistry {
    planes: BTreeMap<PlaneId, PlaneRecord>,
    next_id: u32,
}

impl PlaneRegistry {
    pub fn new() -> Self {
        PlaneRegistry::default()
    }

    pub fn create(&mut self, variant: ShaderVariant, grid_size: f32, bounds: PixelRect) -> PlaneId {
        let id = PlaneId::new(self.next_id);
        self.next_id += 1;
        self.planes
            .insert(id, PlaneRecord::new(id, variant, grid_size, bounds));
        id
    }

    pub fn get(&self, id: PlaneId) -> Option<&PlaneRecord> {
        self.planes.get(&id)
    }

    pub fn get_mut(&mut self, id: PlaneId) -> Option<&mut PlaneRecord> {
        self.planes.get_mut(&id)
    }

    pub fn remove(&mut self, id: PlaneId) -> Option<PlaneRecord> {
        self.planes.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaneRecord> {
        self.planes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlaneRecord> {
        self.planes.values_mut()
    }

    pub fn ids(&self) -> Vec<PlaneId> {
        self.planes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_plane_declares_base_uniforms() {
        let plane = PlaneRecord::new(
            PlaneId::new(0),
            ShaderVariant::Flip,
            20.0,
            PixelRect::sized(400.0, 300.0),
        );
        assert_eq!(plane.uniforms.float(uniforms::GRID_SIZE), Some(20.0));
        assert_eq!(plane.uniforms.vec2(uniforms::IMAGE_SIZE), Some([400.0, 300.0]));
        assert_eq!(plane.progress(), 0.0);
        assert!(plane.uniforms.get(uniforms::DIRECTION).is_none());
        assert_eq!(plane.cells(), CellCounts { x: 20, y: 15 });
        assert!(!plane.animated);
    }

    #[test]
    fn wave_plane_declares_direction_and_pointer() {
        let plane = PlaneRecord::new(
            PlaneId::new(0),
            ShaderVariant::Wave,
            20.0,
            PixelRect::sized(100.0, 100.0),
        );
        assert_eq!(plane.uniforms.float(uniforms::DIRECTION), Some(1.0));
        assert_eq!(plane.uniforms.vec2(uniforms::POINTER), Some([0.5, 0.5]));
    }

    #[test]
    fn moving_without_resizing_keeps_cells() {
        let mut plane = PlaneRecord::new(
            PlaneId::new(0),
            ShaderVariant::Flip,
            20.0,
            PixelRect::sized(400.0, 300.0),
        );
        assert!(!plane.apply_bounds(PixelRect::new(0.0, -250.0, 400.0, 300.0)));
        assert!(plane.apply_bounds(PixelRect::new(0.0, -250.0, 200.0, 150.0)));
        assert_eq!(plane.cells(), CellCounts { x: 10, y: 7 });
        assert_eq!(plane.uniforms.vec2(uniforms::IMAGE_SIZE), Some([200.0, 150.0]));
    }

    #[test]
    fn registry_ids_are_not_reused() {
        let mut registry = PlaneRegistry::new();
        let a = registry.create(ShaderVariant::Flip, 20.0, PixelRect::sized(10.0, 10.0));
        registry.remove(a);
        let b = registry.create(ShaderVariant::Flip, 20.0, PixelRect::sized(10.0, 10.0));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(a).is_none());
    }
}
