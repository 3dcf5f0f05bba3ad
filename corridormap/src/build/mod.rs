//! One-shot construction of the walkable space.
//!
//! The pipeline, leaves first: the footprint becomes a distance mesh, a
//! render backend turns that into a closest-obstacle image, classification
//! marks Voronoi vertex and edge pixels, CSR grids index the marks, and the
//! tracer assembles the half-edge mesh. [`build_walkable_space`] runs the
//! stages in order; each stage is also usable on its own.

use std::fmt;

use corridormap_types::{coord, Coord, Footprint, Rect};

use crate::render::{RenderError, RenderParams, Renderer};
use crate::space::WalkableSpace;

pub mod csr;
pub mod distance_mesh;
pub mod features;
pub mod normals;
pub mod trace;

pub use distance_mesh::{
    build_distance_mesh, distance_mesh_tris_for_point, max_distance_mesh_verts,
    set_segment_colors, DistanceMesh, MeshSegment, NUM_BORDER_SEGMENTS,
};
pub use features::{find_voronoi_features, VoronoiFeatures};
pub use normals::{
    build_edge_normal_indices, build_footprint_normals, closest_obstacle_point, find_normal_index,
    EdgeNormalIndices, FootprintNormals,
};
pub use trace::trace_diagram;

/// Arena identifiers for pool exhaustion reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Vertices,
    Edges,
    Events,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pool::Vertices => write!(f, "vertices"),
            Pool::Edges => write!(f, "edges"),
            Pool::Events => write!(f, "events"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum BuildError {
    /// `max_dist <= max_error`: the cone half-angle has no solution.
    DistanceTolerance { max_dist: f32, max_error: f32 },
    /// A walkable-space arena filled up during tracing.
    PoolExhausted(Pool),
    /// The render backend failed; the code is backend-specific.
    Render(RenderError),
}

impl std::error::Error for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildError::DistanceTolerance {
                max_dist,
                max_error,
            } => write!(
                f,
                "distance mesh tolerance {} must be below the max distance {}",
                max_error, max_dist
            ),
            BuildError::PoolExhausted(pool) => write!(f, "walkable space {} pool exhausted", pool),
            BuildError::Render(err) => write!(f, "render stage failed: {}", err),
        }
    }
}

impl From<RenderError> for BuildError {
    fn from(err: RenderError) -> Self {
        BuildError::Render(err)
    }
}

/// Build configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildParams {
    /// Margin added around the footprint bounding rect to form the scene.
    pub border: f32,
    /// Distance mesh approximation tolerance, in scene units.
    pub max_error: f32,
    /// Render target width in pixels.
    pub render_target_width: u32,
    /// Render target height in pixels.
    pub render_target_height: u32,
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            border: 10.,
            max_error: 0.1,
            render_target_width: 1024,
            render_target_height: 1024,
        }
    }
}

/// Scene rectangle: the footprint bounding rect expanded by `border`.
/// An empty footprint yields a `border`-sized rect around the origin.
pub fn scene_bounds(footprint: &Footprint, border: f32) -> Rect {
    footprint
        .bounding_rect()
        .unwrap_or_else(|| Rect::new(Coord::zero(), Coord::zero()))
        .expanded_by(border)
}

/// Maximum distance any scene point can have to an obstacle, with slack:
/// distance mesh cones of this radius cover the whole render target.
pub fn max_distance(scene: Rect) -> f32 {
    scene.width().max(scene.height()) * std::f32::consts::SQRT_2
}

// scene-space position of a pixel centre.
pub(crate) fn pixel_to_scene(
    scene: Rect,
    grid_width: usize,
    grid_height: usize,
    col: usize,
    row: usize,
) -> Coord {
    let cell_w = scene.width() / grid_width as f32;
    let cell_h = scene.height() / grid_height as f32;
    coord! {
        x: scene.min().x + (col as f32 + 0.5) * cell_w,
        y: scene.min().y + (row as f32 + 0.5) * cell_h,
    }
}

/// Runs the full pipeline: distance mesh, render, classification, CSR
/// grids, normals and tracing.
///
/// The renderer is the single external stage; it is initialized here from
/// the scene bounds and read back synchronously, so everything the later
/// stages consume is CPU-visible.
pub fn build_walkable_space(
    footprint: &Footprint,
    params: &BuildParams,
    renderer: &mut dyn Renderer,
) -> Result<WalkableSpace, BuildError> {
    let scene = scene_bounds(footprint, params.border);
    let max_dist = max_distance(scene);

    debug!(
        "building walkable space: {} obstacles, scene {:?} .. {:?}",
        footprint.num_polys(),
        scene.min(),
        scene.max()
    );

    let mesh = build_distance_mesh(footprint, scene, max_dist, params.max_error)?;

    renderer.initialize(&RenderParams {
        render_target_width: params.render_target_width,
        render_target_height: params.render_target_height,
        min: [scene.min().x, scene.min().y, 0.],
        max: [scene.max().x, scene.max().y, 0.],
        far_plane: max_dist + params.max_error,
    })?;
    mesh.render(renderer);
    let image = renderer.read_pixels()?;

    let features = find_voronoi_features(&image);

    let footprint_normals = build_footprint_normals(footprint, scene);
    let normal_indices =
        build_edge_normal_indices(&features, footprint, &footprint_normals, scene);

    let rows = image.height();
    let cols = image.width();
    let vertex_grid = csr::CsrGrid::new(rows, cols, features.verts());
    let edge_grid = csr::CsrGrid::new(rows, cols, features.edges());

    trace_diagram(
        footprint,
        scene,
        &features,
        &normal_indices,
        &vertex_grid,
        &edge_grid,
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scene_bounds_expand_the_footprint() {
        let footprint = Footprint::from_polygons(vec![vec![
            coord! { x: 10., y: 20. },
            coord! { x: 50., y: 20. },
            coord! { x: 30., y: 50. },
        ]])
        .unwrap();
        let scene = scene_bounds(&footprint, 10.);
        assert_eq!(scene.min(), coord! { x: 0., y: 10. });
        assert_eq!(scene.max(), coord! { x: 60., y: 60. });
    }

    #[test]
    fn max_distance_covers_the_diagonal() {
        let scene = Rect::new((0., 0.), (30., 40.));
        // sqrt(2) * max side always reaches across the rect.
        let diagonal = (30.0f32 * 30. + 40. * 40.).sqrt();
        assert!(max_distance(scene) >= diagonal);
    }

    #[test]
    fn pixel_centres_land_inside_the_scene() {
        let scene = Rect::new((0., 0.), (10., 10.));
        let first = pixel_to_scene(scene, 10, 10, 0, 0);
        let last = pixel_to_scene(scene, 10, 10, 9, 9);
        assert_eq!(first, coord! { x: 0.5, y: 0.5 });
        assert_eq!(last, coord! { x: 9.5, y: 9.5 });
    }
}
