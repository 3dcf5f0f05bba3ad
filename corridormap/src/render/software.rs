//! CPU reference implementation of the render capability.
//!
//! Rasterises the distance mesh with the same visible semantics as the GL
//! backend: left-handed ortho projection, counter-clockwise front faces,
//! depth test `LESS`, solid per-primitive colours. Deterministic, so tests
//! and headless builds do not need a device context.

use super::{pack_obstacle_id, MeshVertex, RenderError, RenderParams, Renderer, VoronoiImage};

// error codes reported through the opaque RenderError.
const ERROR_BAD_PARAMS: u32 = 1;
const ERROR_NOT_INITIALIZED: u32 = 2;

/// Software rasteriser over a plain colour + depth buffer pair.
#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    params: Option<RenderParams>,
    color: Vec<u32>,
    depth: Vec<f32>,
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        SoftwareRenderer::default()
    }

    fn scene_to_screen(&self, params: &RenderParams, v: &MeshVertex) -> (f32, f32) {
        let w = params.render_target_width as f32;
        let h = params.render_target_height as f32;
        let sx = (v.x - params.min[0]) / (params.max[0] - params.min[0]) * w;
        let sy = (v.y - params.min[1]) / (params.max[1] - params.min[1]) * h;
        (sx, sy)
    }

    fn fill_triangle(&mut self, params: &RenderParams, tri: &[MeshVertex], packed: u32) {
        let (ax, ay) = self.scene_to_screen(params, &tri[0]);
        let (bx, by) = self.scene_to_screen(params, &tri[1]);
        let (cx, cy) = self.scene_to_screen(params, &tri[2]);

        // back-face culling: front faces wind CCW in screen space.
        let doubled_area = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
        if doubled_area <= 0. {
            return;
        }

        let width = params.render_target_width as usize;
        let height = params.render_target_height as usize;

        let min_x = ax.min(bx).min(cx).floor().max(0.) as usize;
        let min_y = ay.min(by).min(cy).floor().max(0.) as usize;
        let max_x = (ax.max(bx).max(cx).ceil() as usize).min(width);
        let max_y = (ay.max(by).max(cy).ceil() as usize).min(height);

        for y in min_y..max_y {
            let py = y as f32 + 0.5;
            for x in min_x..max_x {
                let px = x as f32 + 0.5;

                let w0 = (cx - bx) * (py - by) - (cy - by) * (px - bx);
                let w1 = (ax - cx) * (py - cy) - (ay - cy) * (px - cx);
                let w2 = (bx - ax) * (py - ay) - (by - ay) * (px - ax);

                if w0 < 0. || w1 < 0. || w2 < 0. {
                    continue;
                }

                let z = (w0 * tri[0].z + w1 * tri[1].z + w2 * tri[2].z) / doubled_area;
                if z < 0. {
                    continue;
                }

                let idx = y * width + x;
                if z < self.depth[idx] {
                    self.depth[idx] = z;
                    self.color[idx] = packed;
                }
            }
        }
    }
}

impl Renderer for SoftwareRenderer {
    fn initialize(&mut self, params: &RenderParams) -> Result<(), RenderError> {
        if params.render_target_width == 0
            || params.render_target_height == 0
            || params.far_plane <= 0.
            || params.max[0] <= params.min[0]
            || params.max[1] <= params.min[1]
        {
            return Err(RenderError::new(ERROR_BAD_PARAMS));
        }

        let num_pixels = params.render_target_width as usize * params.render_target_height as usize;
        self.color = vec![0; num_pixels];
        self.depth = vec![0.; num_pixels];
        self.params = Some(*params);
        Ok(())
    }

    fn begin(&mut self) {
        let far = match self.params {
            Some(p) => p.far_plane,
            None => return,
        };
        self.color.fill(pack_obstacle_id(0));
        self.depth.fill(far);
    }

    fn draw(&mut self, vertices: &[MeshVertex], color: u32) {
        debug_assert_eq!(vertices.len() % 3, 0);
        let params = match self.params {
            Some(p) => p,
            None => return,
        };
        let packed = pack_obstacle_id(color);
        for tri in vertices.chunks_exact(3) {
            self.fill_triangle(&params, tri, packed);
        }
    }

    fn end(&mut self) {}

    fn read_pixels(&mut self) -> Result<VoronoiImage, RenderError> {
        let params = self.params.ok_or(RenderError::new(ERROR_NOT_INITIALIZED))?;
        Ok(VoronoiImage::new(
            params.render_target_width as usize,
            params.render_target_height as usize,
            self.color.clone(),
        ))
    }
}
