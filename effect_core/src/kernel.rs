// CPU evaluation of the flip/mosaic fragment kernel.
// Mirrors the GLSL in shaders.rs so the numeric contract can be checked off-GPU.

use std::f32::consts::PI;

use crate::types::ShaderVariant;

pub const GREEN_LIGHT: [f32; 3] = [0.0, 0.91, 0.522];
pub const GREEN_MED: [f32; 3] = [0.0, 0.741, 0.42];
pub const GREEN_DARK: [f32; 3] = [0.0, 0.447, 0.255];

/// Largest per-cell delay. Progress is stretched by `1 + MAX_DELAY` so the last cell finishes.
pub const MAX_DELAY: f32 = 0.75;

/// How a cell's distance from the top-left origin is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Manhattan,
    Euclidean,
}

impl DistanceMetric {
    pub fn for_variant(variant: ShaderVariant) -> Self {
        match variant {
            ShaderVariant::Mosaic => DistanceMetric::Euclidean,
            ShaderVariant::Flip | ShaderVariant::Wave => DistanceMetric::Manhattan,
        }
    }

    /// Distance of a normalized position from the origin, scaled to [0, 1].
    fn normalized(&self, pos: [f32; 2]) -> f32 {
        match self {
            DistanceMetric::Manhattan => (pos[0] + pos[1]) / 2.0,
            DistanceMetric::Euclidean => (pos[0] * pos[0] + pos[1] * pos[1]).sqrt() / 2f32.sqrt(),
        }
    }
}

/// Uniform and varying inputs for one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput {
    /// Texture coordinate, v = 0 at the bottom edge.
    pub tex_coord: [f32; 2],
    pub image_size: [f32; 2],
    pub grid_size: f32,
    pub progress: f32,
    pub time: f32,
}

/// Intermediate and final values of one fragment evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentSample {
    pub grid_coord: [f32; 2],
    pub delay: f32,
    pub local_progress: f32,
    pub angle: f32,
    /// Perspective x-scale, `cos(angle)`.
    pub scale: f32,
    /// Palette side faces the viewer.
    pub front: bool,
    /// Where the back face samples the image texture.
    pub sample_uv: [f32; 2],
    pub palette_color: [f32; 3],
    /// Edge-on falloff: 0 for pixels outside the foreshortened cell.
    pub alpha: f32,
}

/// GLSL-style hash: `fract(sin(dot(st, (12.9898, 78.233))) * 43758.5453123)`.
pub fn random(st: [f32; 2]) -> f32 {
    fract((st[0] * 12.9898 + st[1] * 78.233).sin() * 43758.547)
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Blend around the three-shade palette; `t` in [0, 1] covers one full cycle.
pub fn interpolate_palette(t: f32) -> [f32; 3] {
    let t = t * 3.0;
    if t < 1.0 {
        mix3(GREEN_LIGHT, GREEN_MED, t)
    } else if t < 2.0 {
        mix3(GREEN_MED, GREEN_DARK, t - 1.0)
    } else {
        mix3(GREEN_DARK, GREEN_LIGHT, t - 2.0)
    }
}

/// Palette colour for a cell, oscillating slowly with time.
pub fn palette_color(grid_coord: [f32; 2], time: f32) -> [f32; 3] {
    let r = random(grid_coord);
    let oscillation = ((time * PI + r * PI * 2.0).sin() + 1.0) * 0.1;
    interpolate_palette(oscillation)
}

/// Reveal delay of a cell in [0, MAX_DELAY].
pub fn cell_delay(grid_coord: [f32; 2], total_grid: [f32; 2], metric: DistanceMetric) -> f32 {
    let span = [total_grid[0].max(1.0), total_grid[1].max(1.0)];
    let normalized = [grid_coord[0] / span[0], grid_coord[1] / span[1]];
    let noise = random([grid_coord[0] * 0.1, grid_coord[1] * 0.1]) * 0.15;
    (metric.normalized(normalized) * 0.8 + noise).clamp(0.0, MAX_DELAY)
}

/// Evaluate the flip kernel for one fragment.
pub fn evaluate(input: &FragmentInput, metric: DistanceMetric) -> FragmentSample {
    let size = input.image_size;
    let g = input.grid_size;
    let [u, v] = input.tex_coord;

    // grid rows counted from the top edge
    let grid_coord = [(u * size[0] / g).floor(), ((1.0 - v) * size[1] / g).floor()];
    let cell_position = [fract(u * size[0] / g), fract(v * size[1] / g)];
    let total_grid = [(size[0] / g).floor(), (size[1] / g).floor()];

    let delay = cell_delay(grid_coord, total_grid, metric);
    let local_progress = (input.progress * (1.0 + MAX_DELAY) - delay).clamp(0.0, 1.0);
    let angle = local_progress * PI;
    let scale = angle.cos();

    let from_center = [-(cell_position[0] - 0.5), cell_position[1] - 0.5];
    let rotated = [0.5 + from_center[0] * scale, 0.5 + from_center[1]];
    let cell_origin = [(u * size[0] / g).floor(), (v * size[1] / g).floor()];
    let sample_uv = [
        rotated[0] * g / size[0] + cell_origin[0] * g / size[0],
        rotated[1] * g / size[1] + cell_origin[1] * g / size[1],
    ];

    let alpha = if from_center[0].abs() <= 0.5 * scale.abs() {
        1.0
    } else {
        0.0
    };

    FragmentSample {
        grid_coord,
        delay,
        local_progress,
        angle,
        scale,
        front: scale >= 0.0,
        sample_uv,
        palette_color: palette_color(grid_coord, input.time),
        alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(tex_coord: [f32; 2], progress: f32) -> FragmentInput {
        FragmentInput {
            tex_coord,
            image_size: [400.0, 300.0],
            grid_size: 20.0,
            progress,
            time: 0.0,
        }
    }

    #[test]
    fn unstarted_plane_shows_palette() {
        let sample = evaluate(&input([0.52, 0.48], 0.0), DistanceMetric::Manhattan);
        assert_eq!(sample.local_progress, 0.0);
        assert!(sample.front);
        assert_eq!(sample.scale, 1.0);
    }

    #[test]
    fn finished_plane_shows_image_everywhere() {
        for &uv in &[[0.01, 0.99], [0.5, 0.5], [0.99, 0.01]] {
            let sample = evaluate(&input(uv, 1.0), DistanceMetric::Manhattan);
            assert_eq!(sample.local_progress, 1.0, "uv {uv:?}");
            assert!(!sample.front);
        }
    }

    #[test]
    fn top_left_cells_start_first() {
        let top_left = evaluate(&input([0.01, 0.99], 0.3), DistanceMetric::Manhattan);
        let bottom_right = evaluate(&input([0.99, 0.01], 0.3), DistanceMetric::Manhattan);
        assert_eq!(top_left.grid_coord, [0.0, 0.0]);
        assert!(top_left.delay < bottom_right.delay);
        assert!(top_left.local_progress >= bottom_right.local_progress);
    }

    #[test]
    fn delay_never_exceeds_max() {
        for metric in [DistanceMetric::Manhattan, DistanceMetric::Euclidean] {
            let d = cell_delay([19.0, 14.0], [20.0, 15.0], metric);
            assert!((0.0..=MAX_DELAY).contains(&d));
        }
    }

    #[test]
    fn zero_cell_grid_does_not_divide_by_zero() {
        let d = cell_delay([0.0, 0.0], [0.0, 0.0], DistanceMetric::Euclidean);
        assert!(d.is_finite());
    }

    #[test]
    fn mosaic_uses_euclidean() {
        assert_eq!(
            DistanceMetric::for_variant(ShaderVariant::Mosaic),
            DistanceMetric::Euclidean
        );
        assert_eq!(
            DistanceMetric::for_variant(ShaderVariant::Flip),
            DistanceMetric::Manhattan
        );
    }

    #[test]
    fn palette_stays_in_green_band() {
        for i in 0..50 {
            let c = palette_color([i as f32, (i * 7) as f32], i as f32 * 0.37);
            assert_eq!(c[0], 0.0);
            assert!(c[1] >= GREEN_DARK[1] - 1e-6 && c[1] <= GREEN_LIGHT[1] + 1e-6);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any externally supplied progress, including slider misuse, clamps per cell.
            #[test]
            fn local_progress_is_clamped(
                u in 0.0f32..1.0,
                v in 0.0f32..1.0,
                progress in -10.0f32..10.0,
                w in 20.0f32..2000.0,
                h in 20.0f32..2000.0,
                time in 0.0f32..100.0,
            ) {
                let input = FragmentInput {
                    tex_coord: [u, v],
                    image_size: [w, h],
                    grid_size: 20.0,
                    progress,
                    time,
                };
                let sample = evaluate(&input, DistanceMetric::Euclidean);
                prop_assert!((0.0..=1.0).contains(&sample.local_progress));
                prop_assert!((0.0..=PI).contains(&sample.angle));
                prop_assert!(sample.alpha == 0.0 || sample.alpha == 1.0);
            }
        }
    }
}
