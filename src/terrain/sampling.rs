//! Repeat-addressed texel grids
//!
//! CPU mirror of the GPU sampler state used by the terrain shaders:
//! repeat addressing on both axes and bilinear filtering with texel centers
//! at `(i + 0.5) / size`. Any finite or non-finite coordinate resolves to a
//! texel inside the grid.

/// Values that can be stored in a [`TexelGrid`] and filtered
pub trait Texel: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Texel for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Texel for [f32; 3] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            f32::lerp(a[0], b[0], t),
            f32::lerp(a[1], b[1], t),
            f32::lerp(a[2], b[2], t),
        ]
    }
}

/// Wraps a texture coordinate into `[0, 1)`. Non-finite input maps to 0.
pub fn wrap_coord(t: f32) -> f32 {
    if !t.is_finite() {
        return 0.0;
    }
    let wrapped = t - t.floor();
    // tiny negative inputs round up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn wrap_uv(uv: [f32; 2]) -> [f32; 2] {
    [wrap_coord(uv[0]), wrap_coord(uv[1])]
}

/// sRGB transfer function decode, `c` in `[0, 1]`
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Decodes an 8-bit sRGB channel to linear intensity
pub fn srgb8_to_linear(c: u8) -> f32 {
    srgb_to_linear(c as f32 / 255.0)
}

/// Row-major grid of texels, row 0 at `v = 0`
#[derive(Debug, Clone, PartialEq)]
pub struct TexelGrid<T> {
    width: u32,
    height: u32,
    texels: Vec<T>,
}

impl<T: Texel> TexelGrid<T> {
    /// Returns `None` when the texel count does not match the dimensions
    pub fn new(width: u32, height: u32, texels: Vec<T>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            texels,
        })
    }

    pub fn filled(width: u32, height: u32, value: T) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            texels: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel at integer coordinates, wrapped into the grid
    pub fn texel_wrapped(&self, x: i64, y: i64) -> T {
        let xi = x.rem_euclid(self.width as i64) as usize;
        let yi = y.rem_euclid(self.height as i64) as usize;
        self.texels[yi * self.width as usize + xi]
    }

    pub fn sample_nearest(&self, uv: [f32; 2]) -> T {
        let [u, v] = wrap_uv(uv);
        let x = (u * self.width as f32).floor() as i64;
        let y = (v * self.height as f32).floor() as i64;
        self.texel_wrapped(x, y)
    }

    /// Bilinear sample with repeat addressing
    pub fn sample_bilinear(&self, uv: [f32; 2]) -> T {
        let [u, v] = wrap_uv(uv);
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = T::lerp(
            self.texel_wrapped(x0, y0),
            self.texel_wrapped(x0 + 1, y0),
            fx,
        );
        let bottom = T::lerp(
            self.texel_wrapped(x0, y0 + 1),
            self.texel_wrapped(x0 + 1, y0 + 1),
            fx,
        );
        T::lerp(top, bottom, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn ramp() -> TexelGrid<f32> {
        TexelGrid::new(4, 3, (0..12).map(|i| i as f32 / 11.0).collect()).unwrap()
    }

    #[test]
    fn wrap_coord_stays_in_unit_interval() {
        for t in [-3.25, -1.0, -1e-9, 0.0, 0.5, 1.0, 2.75, 1e6] {
            let w = wrap_coord(t);
            assert!((0.0..1.0).contains(&w), "{t} -> {w}");
        }
        assert_eq!(wrap_coord(1.25), 0.25);
        assert_eq!(wrap_coord(-0.25), 0.75);
        assert_eq!(wrap_coord(f32::NAN), 0.0);
        assert_eq!(wrap_coord(f32::INFINITY), 0.0);
    }

    #[test]
    fn sampling_outside_unit_square_equals_wrapped_sample() {
        let grid = ramp();
        let mut rng = rand::rng();
        for _ in 0..500 {
            let uv = [rng.random_range(0.0..1.0f32), rng.random_range(0.0..1.0f32)];
            let shift = [
                rng.random_range(-5..=5) as f32,
                rng.random_range(-5..=5) as f32,
            ];
            let shifted = [uv[0] + shift[0], uv[1] + shift[1]];

            assert_eq!(
                grid.sample_bilinear(shifted),
                grid.sample_bilinear(wrap_uv(shifted))
            );
            assert_eq!(
                grid.sample_nearest(shifted),
                grid.sample_nearest(wrap_uv(shifted))
            );
            // float shifts are not exact, so compare to the original loosely
            assert!((grid.sample_bilinear(shifted) - grid.sample_bilinear(uv)).abs() < 1e-3);
        }
    }

    #[test]
    fn texel_centers_return_exact_texels() {
        let grid = ramp();
        for y in 0..3 {
            for x in 0..4 {
                let uv = [(x as f32 + 0.5) / 4.0, (y as f32 + 0.5) / 3.0];
                let expected = grid.texel_wrapped(x, y);
                assert!((grid.sample_bilinear(uv) - expected).abs() < 1e-6);
                assert_eq!(grid.sample_nearest(uv), expected);
            }
        }
    }

    #[test]
    fn bilinear_blends_across_the_wrap_seam() {
        let grid = TexelGrid::new(2, 1, vec![0.0f32, 1.0]).unwrap();
        // u = 0 lies halfway between the last and first texel centers
        assert!((grid.sample_bilinear([0.0, 0.5]) - 0.5).abs() < 1e-6);
        assert!((grid.sample_bilinear([1.0, 0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn constant_grid_samples_constant() {
        let grid = TexelGrid::filled(7, 5, 0.3f32);
        for uv in [[0.0, 0.0], [0.13, 0.91], [-4.2, 8.7], [f32::NAN, 0.5]] {
            assert_eq!(grid.sample_bilinear(uv), 0.3);
        }
    }

    #[test]
    fn rejects_mismatched_texel_count() {
        assert!(TexelGrid::new(2, 2, vec![0.0f32; 3]).is_none());
        assert!(TexelGrid::<f32>::new(0, 2, Vec::new()).is_none());
    }

    #[test]
    fn srgb_decode_matches_reference_points() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        // sRGB 188/255 decodes to roughly mid intensity
        assert!((srgb8_to_linear(188) - 0.5).abs() < 0.01);
        // linear segment
        assert!((srgb_to_linear(0.04) - 0.04 / 12.92).abs() < 1e-7);
    }
}
