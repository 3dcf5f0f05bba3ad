//! The rendering capability consumed by the distance-mesh stage.
//!
//! The pipeline does not rasterise triangles itself: it hands a coloured
//! triangle list to a [`Renderer`] and reads the resulting colour buffer
//! back as a [`VoronoiImage`]. Backends can be hardware (a GL framebuffer
//! with a depth attachment) or the bundled [`SoftwareRenderer`]; the core
//! never retains backend handles, so everything it consumes is CPU-visible
//! once [`Renderer::read_pixels`] returns.

use std::fmt;

mod software;

pub use software::SoftwareRenderer;

/// A distance mesh vertex: scene-space position plus the distance function
/// value in `z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Render target and projection setup.
///
/// The projection is a left-handed orthographic box from `(min[0], min[1], 0)`
/// to `(max[0], max[1], far_plane)`, with the camera at zero looking down +z.
/// Depth test is `LESS`, front faces wind counter-clockwise, and primitives
/// are drawn with one solid colour each (no interpolation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub render_target_width: u32,
    pub render_target_height: u32,
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub far_plane: f32,
}

/// Failure reported by a render backend.
///
/// Backends differ too much for a common error taxonomy; the pipeline treats
/// the code as opaque and aborts the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderError {
    code: u32,
}

impl RenderError {
    pub fn new(code: u32) -> Self {
        RenderError { code }
    }

    pub fn code(&self) -> u32 {
        self.code
    }
}

impl std::error::Error for RenderError {}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "render backend failed with code {}", self.code)
    }
}

/// Abstract rendering backend.
pub trait Renderer {
    /// Allocate the render target and set up the orthographic projection.
    fn initialize(&mut self, params: &RenderParams) -> Result<(), RenderError>;
    /// Begin the scene: clear colour and depth.
    fn begin(&mut self);
    /// Draw a CCW triangle list with one solid colour. `vertices.len()` must
    /// be a multiple of three.
    fn draw(&mut self, vertices: &[MeshVertex], color: u32);
    /// End the scene.
    fn end(&mut self);
    /// Copy the colour buffer out of the backend.
    fn read_pixels(&mut self) -> Result<VoronoiImage, RenderError>;
}

/// Convert an obstacle id to the packed RGBA8 colour a backend writes for
/// it: the id in the RGB channels and an opaque alpha.
#[inline]
pub fn pack_obstacle_id(id: u32) -> u32 {
    (id << 8) | 0xff
}

/// Inverse of [`pack_obstacle_id`].
#[inline]
pub fn unpack_obstacle_id(color: u32) -> u32 {
    color >> 8
}

/// The rasterised distance field: one packed RGBA8 colour per pixel, equal
/// to the colour of the closest obstacle's mesh segment.
///
/// Row 0 is the bottom of the scene (minimum `y`); the linear index of pixel
/// `(x, y)` is `y * width + x`.
#[derive(Clone, Debug)]
pub struct VoronoiImage {
    width: usize,
    height: usize,
    colors: Vec<u32>,
}

impl VoronoiImage {
    /// Wraps a raw colour buffer. `colors.len()` must equal
    /// `width * height`.
    pub fn new(width: usize, height: usize, colors: Vec<u32>) -> Self {
        debug_assert_eq!(colors.len(), width * height);
        VoronoiImage {
            width,
            height,
            colors,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Packed colour at `(x, y)` with clamp-to-edge addressing, matching the
    /// sampler the classification stencil expects at the image border.
    #[inline]
    pub fn color_clamped(&self, x: isize, y: isize) -> u32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.colors[y * self.width + x]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn obstacle_id_pack_roundtrip() {
        for id in [0u32, 1, 7, 255, 1024] {
            assert_eq!(unpack_obstacle_id(pack_obstacle_id(id)), id);
        }
        // packed colours stay distinct and opaque.
        assert_ne!(pack_obstacle_id(1), pack_obstacle_id(2));
        assert_eq!(pack_obstacle_id(0) & 0xff, 0xff);
    }

    #[test]
    fn image_clamps_to_edge() {
        let img = VoronoiImage::new(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(img.color_clamped(-1, -1), 1);
        assert_eq!(img.color_clamped(0, 0), 1);
        assert_eq!(img.color_clamped(5, 0), 2);
        assert_eq!(img.color_clamped(1, 5), 4);
    }
}
