//! Fragment color stage
//!
//! CPU reference of `fs_main` in `terrain.wgsl`: the color-texture sample at
//! the interpolated UV, fully opaque. The terrain is double-sided, so the
//! face orientation never changes the result.

use super::color_map::ColorMap;

/// Which side of a triangle is facing the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    /// Orientation of a screen-space triangle; counter-clockwise is front
    pub fn from_winding(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> Self {
        let signed_area = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
        if signed_area >= 0.0 {
            Facing::Front
        } else {
            Facing::Back
        }
    }
}

/// Opaque linear RGBA for one terrain fragment
pub fn shade_fragment(uv: [f32; 2], color_map: &ColorMap, _facing: Facing) -> [f32; 4] {
    let [r, g, b] = color_map.sample(uv);
    [r, g, b, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::texture_image::TextureImage;

    fn checker() -> ColorMap {
        let rgba = vec![
            255, 0, 0, 255, /**/ 0, 255, 0, 255, //
            0, 0, 255, 255, /**/ 255, 255, 255, 255,
        ];
        ColorMap::from_image(TextureImage::from_rgba("checker", 2, 2, rgba).unwrap())
    }

    #[test]
    fn output_is_opaque_texture_sample() {
        let map = checker();
        let color = shade_fragment([0.25, 0.25], &map, Facing::Front);
        assert_eq!(color, [1.0, 0.0, 0.0, 1.0]);
        let color = shade_fragment([0.75, 0.75], &map, Facing::Front);
        assert!(color.iter().all(|c| (c - 1.0).abs() < 1e-6));
    }

    #[test]
    fn both_windings_shade_identically() {
        let map = checker();
        let (a, b, c) = ([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
        let front = Facing::from_winding(a, b, c);
        let back = Facing::from_winding(a, c, b);
        assert_eq!(front, Facing::Front);
        assert_eq!(back, Facing::Back);

        for uv in [[0.1, 0.2], [0.5, 0.5], [0.9, 0.3], [0.77, 0.01]] {
            assert_eq!(
                shade_fragment(uv, &map, front),
                shade_fragment(uv, &map, back)
            );
        }
    }

    #[test]
    fn out_of_range_uv_wraps() {
        let map = checker();
        for uv in [[0.25, 0.75], [0.6, 0.1]] {
            let shifted = [uv[0] - 4.0, uv[1] + 7.0];
            let a = shade_fragment(uv, &map, Facing::Front);
            let b = shade_fragment(shifted, &map, Facing::Front);
            for k in 0..4 {
                assert!((a[k] - b[k]).abs() < 1e-5);
            }
        }
        let nan = shade_fragment([f32::NAN, f32::INFINITY], &map, Facing::Back);
        assert_eq!(nan[3], 1.0);
        assert!(nan.iter().all(|c| c.is_finite()));
    }
}
