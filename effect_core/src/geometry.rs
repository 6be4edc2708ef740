// Grid sizing and plane mesh construction.
// Cell counts are always floor(extent / pitch); the mesh never has fewer than one segment per axis.

use serde::{Deserialize, Serialize};

use crate::types::PixelRect;

/// Upper bound on mesh subdivisions per axis; keeps index buffers within u32 range.
pub const MAX_SEGMENTS: u32 = 512;

/// Number of whole grid cells covering an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CellCounts {
    pub x: u32,
    pub y: u32,
}

impl CellCounts {
    /// `⌊width / pitch⌋ × ⌊height / pitch⌋`.
    /// Non-positive or non-finite inputs yield zero cells.
    pub fn for_bounds(bounds: &PixelRect, pitch: f32) -> Self {
        CellCounts {
            x: whole_cells(bounds.width, pitch),
            y: whole_cells(bounds.height, pitch),
        }
    }

    pub fn total(&self) -> u64 {
        self.x as u64 * self.y as u64
    }

    /// Mesh subdivision used for drawing, in `1..=MAX_SEGMENTS` per axis.
    pub fn segments(&self) -> (u32, u32) {
        (
            self.x.clamp(1, MAX_SEGMENTS),
            self.y.clamp(1, MAX_SEGMENTS),
        )
    }
}

fn whole_cells(extent: f32, pitch: f32) -> u32 {
    if !(extent.is_finite() && pitch.is_finite()) || extent <= 0.0 || pitch <= 0.0 {
        return 0;
    }
    (extent / pitch).floor() as u32
}

/// Subdivided unit plane: positions in [-1, 1]², texture coordinates in [0, 1]².
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaneMesh {
    /// Interleaved `x, y, z` per vertex.
    pub positions: Vec<f32>,
    /// Interleaved `u, v` per vertex, v = 0 at the bottom edge.
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u32>,
}

impl PlaneMesh {
    pub fn subdivided(segments_x: u32, segments_y: u32) -> Self {
        let sx = segments_x.clamp(1, MAX_SEGMENTS);
        let sy = segments_y.clamp(1, MAX_SEGMENTS);
        let vertex_count = ((sx + 1) * (sy + 1)) as usize;

        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut tex_coords = Vec::with_capacity(vertex_count * 2);
        for row in 0..=sy {
            let v = row as f32 / sy as f32;
            for col in 0..=sx {
                let u = col as f32 / sx as f32;
                positions.extend_from_slice(&[u * 2.0 - 1.0, v * 2.0 - 1.0, 0.0]);
                tex_coords.extend_from_slice(&[u, v]);
            }
        }

        let mut indices = Vec::with_capacity((sx * sy * 6) as usize);
        let stride = sx + 1;
        for row in 0..sy {
            for col in 0..sx {
                let bl = row * stride + col;
                let br = bl + 1;
                let tl = bl + stride;
                let tr = tl + 1;
                indices.extend_from_slice(&[bl, br, tl, tl, br, tr]);
            }
        }

        PlaneMesh {
            positions,
            tex_coords,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Column-major model-view matrix placing the unit plane over `rect` in clip space.
pub fn clip_transform(rect: &PixelRect, viewport_width: f32, viewport_height: f32) -> [f32; 16] {
    if viewport_width <= 0.0 || viewport_height <= 0.0 {
        return [0.0; 16];
    }
    let sx = rect.width / viewport_width;
    let sy = rect.height / viewport_height;
    let tx = (rect.x + rect.width / 2.0) / viewport_width * 2.0 - 1.0;
    let ty = 1.0 - (rect.y + rect.height / 2.0) / viewport_height * 2.0;
    [
        sx, 0.0, 0.0, 0.0, //
        0.0, sy, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        tx, ty, 0.0, 1.0,
    ]
}

pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_floor() {
        let counts = CellCounts::for_bounds(&PixelRect::sized(415.0, 99.9), 20.0);
        assert_eq!(counts, CellCounts { x: 20, y: 4 });
        assert_eq!(counts.total(), 80);
    }

    #[test]
    fn tiny_image_has_no_cells_but_one_segment() {
        let counts = CellCounts::for_bounds(&PixelRect::sized(12.0, 8.0), 20.0);
        assert_eq!(counts, CellCounts { x: 0, y: 0 });
        assert_eq!(counts.segments(), (1, 1));
    }

    #[test]
    fn degenerate_inputs_yield_zero() {
        assert_eq!(CellCounts::for_bounds(&PixelRect::sized(-5.0, 100.0), 20.0).x, 0);
        assert_eq!(CellCounts::for_bounds(&PixelRect::sized(100.0, f32::NAN), 20.0).y, 0);
        assert_eq!(CellCounts::for_bounds(&PixelRect::sized(100.0, 100.0), 0.0).x, 0);
    }

    #[test]
    fn mesh_shape() {
        let mesh = PlaneMesh::subdivided(3, 2);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.tex_coords.len(), 24);
        assert_eq!(mesh.indices.len(), 3 * 2 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        // corners
        assert_eq!(&mesh.positions[0..3], &[-1.0, -1.0, 0.0]);
        let last = mesh.positions.len() - 3;
        assert_eq!(&mesh.positions[last..], &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn fine_grid_caps_mesh_segments() {
        let counts = CellCounts::for_bounds(&PixelRect::sized(1000.0, 1000.0), 0.5);
        assert_eq!(counts.x, 2000);
        assert_eq!(counts.segments(), (MAX_SEGMENTS, MAX_SEGMENTS));

        let mesh = PlaneMesh::subdivided(100_000, 100_000);
        let side = (MAX_SEGMENTS + 1) as usize;
        assert_eq!(mesh.vertex_count(), side * side);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn clip_transform_maps_corners() {
        let rect = PixelRect::new(100.0, 50.0, 200.0, 100.0);
        let m = clip_transform(&rect, 800.0, 400.0);
        // top-left corner of the plane (-1, 1)
        let x = m[0] * -1.0 + m[12];
        let y = m[5] * 1.0 + m[13];
        assert!((x - (100.0 / 800.0 * 2.0 - 1.0)).abs() < 1e-6);
        assert!((y - (1.0 - 50.0 / 400.0 * 2.0)).abs() < 1e-6);
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Counts equal floor(W/G) x floor(H/G), and a resize recomputes them identically.
            #[test]
            fn counts_match_floor_division(
                w in 0.0f32..4000.0,
                h in 0.0f32..4000.0,
                w2 in 0.0f32..4000.0,
                h2 in 0.0f32..4000.0,
                pitch in 1.0f32..64.0,
            ) {
                let first = CellCounts::for_bounds(&PixelRect::sized(w, h), pitch);
                prop_assert_eq!(first.x, (w / pitch).floor() as u32);
                prop_assert_eq!(first.y, (h / pitch).floor() as u32);

                let resized = CellCounts::for_bounds(&PixelRect::sized(w2, h2), pitch);
                let fresh = CellCounts::for_bounds(&PixelRect::new(5.0, 5.0, w2, h2), pitch);
                prop_assert_eq!(resized, fresh);
            }
        }
    }
}
