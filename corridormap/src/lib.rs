#![warn(missing_debug_implementations)]
//! The `corridormap` crate builds Explicit Corridor Maps of planar
//! polygonal environments and answers clearance-aware shortest path
//! queries over them.
//!
//! An Explicit Corridor Map is the generalised Voronoi diagram of an
//! obstacle set, annotated with the closest-obstacle information needed to
//! reconstruct the navigable corridor between any two points. The diagram
//! is not computed exactly: every obstacle is expanded into a 3-d *distance
//! mesh* (cones at polygon vertices, "tents" over polygon edges) and
//! rasterised under an orthographic projection with a depth test, so the
//! colour buffer ends up holding the id of the closest obstacle per pixel.
//! Pixel classification, tracing and annotation then recover the diagram's
//! combinatorial structure from the image.
//!
//! # Pipeline
//!
//! - **[`Footprint`]**: the input — convex obstacle polygons in CCW order
//! - **[`build::build_distance_mesh`]**: the per-obstacle distance function
//!   as a renderable triangle list
//! - **[`render::Renderer`]**: the external rasterisation capability;
//!   [`render::SoftwareRenderer`] is the bundled CPU reference backend
//! - **[`build::find_voronoi_features`]**: 2×2 classification of the
//!   rendered image into Voronoi vertex and edge pixels
//! - **[`build::trace_diagram`]**: BFS tracing of the pixel sets into the
//!   half-edge [`space::WalkableSpace`]
//! - **[`corridor::extract`]**: the disk corridor along a half-edge route
//! - **[`shortest_path::find_shortest_path`]**: the arc-aware funnel over a
//!   corridor, for an agent of positive radius
//!
//! [`build::build_walkable_space`] chains the build stages.
//!
//! # Example
//!
//! ```
//! use corridormap::{build_walkable_space, BuildParams, Footprint, SoftwareRenderer};
//!
//! let footprint = Footprint::from_arrays(
//!     &[10., 50., 30.],
//!     &[20., 20., 50.],
//!     &[3],
//! )
//! .unwrap();
//!
//! let mut renderer = SoftwareRenderer::new();
//! let params = BuildParams {
//!     render_target_width: 128,
//!     render_target_height: 128,
//!     ..BuildParams::default()
//! };
//! let space = build_walkable_space(&footprint, &params, &mut renderer).unwrap();
//! assert!(space.num_vertices() > 0);
//! ```

pub use corridormap_types::{coord, Coord, CoordFloat, CoordNum, Footprint, Rect};

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod build;
pub mod corridor;
pub mod render;
pub mod shortest_path;
pub mod space;

pub use crate::build::{
    build_walkable_space, max_distance, scene_bounds, BuildError, BuildParams, Pool,
};
pub use crate::corridor::{extract, num_path_disks, Corridor, Curve};
pub use crate::render::{
    MeshVertex, RenderError, RenderParams, Renderer, SoftwareRenderer, VoronoiImage,
};
pub use crate::shortest_path::{find_shortest_path, find_shortest_path_points, PathElement};
pub use crate::space::{EdgeId, EventId, HalfEdgeId, VertexId, WalkableSpace};
