//! Obstacle edge normals and per-pixel site assignment.
//!
//! A Voronoi edge point knows which two obstacles it is equidistant from,
//! but not which *feature* of each obstacle (edge interior or corner) is the
//! closest site. Walking the obstacle's fan of outward edge normals answers
//! that: the point lies in the angular wedge of a corner iff its direction
//! from that corner aligns closer with the bisector of the two adjacent
//! normals than the normals themselves do. The tracer only needs the
//! resulting index to change whenever the closest feature changes.

use corridormap_types::{Coord, Footprint, Rect};

use crate::build::distance_mesh::NUM_BORDER_SEGMENTS;
use crate::build::features::VoronoiFeatures;
use crate::build::pixel_to_scene;

/// Outward unit normals of every footprint polygon edge, plus one inward
/// normal per scene border segment.
#[derive(Clone, Debug)]
pub struct FootprintNormals {
    normals: Vec<Coord>,
    // per obstacle (polygons then borders): first normal index and count.
    offsets: Vec<usize>,
    counts: Vec<usize>,
}

impl FootprintNormals {
    #[inline]
    pub fn normal(&self, global_idx: usize) -> Coord {
        self.normals[global_idx]
    }

    #[inline]
    pub fn obstacle_normals(&self, obstacle_id: usize) -> &[Coord] {
        let first = self.offsets[obstacle_id];
        &self.normals[first..first + self.counts[obstacle_id]]
    }

    #[inline]
    pub fn obstacle_offset(&self, obstacle_id: usize) -> usize {
        self.offsets[obstacle_id]
    }
}

/// Computes normals for each polygon edge and each scene border.
///
/// Normal `j` of a polygon belongs to the edge *ending* at vertex `j`, so
/// vertex `j` sits between normals `j` and `j + 1` — the layout the wedge
/// walk in [`find_normal_index`] relies on.
pub fn build_footprint_normals(footprint: &Footprint, scene: Rect) -> FootprintNormals {
    let mut normals = Vec::with_capacity(footprint.num_verts() + NUM_BORDER_SEGMENTS);
    let mut offsets = Vec::with_capacity(footprint.num_polys() + NUM_BORDER_SEGMENTS);
    let mut counts = Vec::with_capacity(footprint.num_polys() + NUM_BORDER_SEGMENTS);

    for poly in footprint.polygons() {
        offsets.push(normals.len());
        counts.push(poly.len());

        let nverts = poly.len();
        let mut curr_idx = nverts - 1;
        for next_idx in 0..nverts {
            let edge = (poly[next_idx] - poly[curr_idx]).normalized();
            // CCW polygon: the right-hand perpendicular points outward.
            normals.push(edge.right());
            curr_idx = next_idx;
        }
    }

    // border segments run CCW around the scene with the obstacle body
    // outside, so their outward normal is the left-hand perpendicular.
    for (from, to) in border_segments(scene) {
        offsets.push(normals.len());
        counts.push(1);
        normals.push((to - from).normalized().left());
    }

    FootprintNormals {
        normals,
        offsets,
        counts,
    }
}

/// The four border segments of the scene rect in obstacle-id order
/// (bottom, right, top, left), each CCW around the scene.
pub fn border_segments(scene: Rect) -> [(Coord, Coord); NUM_BORDER_SEGMENTS] {
    let [lb, rb, rt, lt] = scene.corners();
    [(lb, rb), (rb, rt), (rt, lt), (lt, lb)]
}

/// Identifies the closest feature of `obstacle_id` as seen from `point`:
/// `0` when the closest site is an edge interior, otherwise the 1-based
/// global index of the corner's first adjacent normal.
pub fn find_normal_index(
    footprint: &Footprint,
    normals: &FootprintNormals,
    obstacle_id: u32,
    point: Coord,
) -> usize {
    let obstacle = obstacle_id as usize;
    if obstacle >= footprint.num_polys() {
        // borders have a single edge and no corner wedges.
        return 0;
    }

    let poly = footprint.polygon(obstacle);
    let fan = normals.obstacle_normals(obstacle);
    let first = normals.obstacle_offset(obstacle);
    let nverts = poly.len();

    let mut curr = nverts - 1;
    for next in 0..nverts {
        let vertex = poly[curr];
        let mid = (fan[curr] + fan[next]).normalized();
        let dir = (point - vertex).normalized();

        if dir.dot(mid) >= fan[curr].dot(mid) {
            return first + curr + 1;
        }

        curr = next;
    }

    0
}

/// For each Voronoi edge point and each of its two sides, the index of the
/// closest obstacle feature per [`find_normal_index`].
#[derive(Clone, Debug)]
pub struct EdgeNormalIndices {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

/// Runs the wedge walk for both sides of every compacted edge point.
/// Pixel indices are converted to scene space first; the wedge test mixes
/// directions with footprint vertices and is only meaningful there.
pub fn build_edge_normal_indices(
    features: &VoronoiFeatures,
    footprint: &Footprint,
    normals: &FootprintNormals,
    scene: Rect,
) -> EdgeNormalIndices {
    let grid_width = features.grid_width();
    let grid_height = features.grid_height();

    let mut left = Vec::with_capacity(features.edges().len());
    let mut right = Vec::with_capacity(features.edges().len());

    for (i, &linear) in features.edges().iter().enumerate() {
        let col = linear as usize % grid_width;
        let row = linear as usize / grid_width;
        let point = pixel_to_scene(scene, grid_width, grid_height, col, row);

        left.push(find_normal_index(
            footprint,
            normals,
            features.edge_obstacle_left(i),
            point,
        ));
        right.push(find_normal_index(
            footprint,
            normals,
            features.edge_obstacle_right(i),
            point,
        ));
    }

    EdgeNormalIndices { left, right }
}

/// Perpendicular foot of `point` on the given obstacle: the closest point on
/// any of its polygon edges, or on the border segment for synthetic border
/// obstacles.
pub fn closest_obstacle_point(
    footprint: &Footprint,
    scene: Rect,
    obstacle_id: u32,
    point: Coord,
) -> Coord {
    let obstacle = obstacle_id as usize;

    if obstacle >= footprint.num_polys() {
        let (from, to) = border_segments(scene)[obstacle - footprint.num_polys()];
        return closest_segment_point(from, to, point);
    }

    let poly = footprint.polygon(obstacle);
    let mut best = poly[0];
    let mut best_dist = f32::MAX;

    let mut curr = poly.len() - 1;
    for next in 0..poly.len() {
        let candidate = closest_segment_point(poly[curr], poly[next], point);
        let dist = (candidate - point).magnitude_squared();
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
        curr = next;
    }

    best
}

fn closest_segment_point(a: Coord, b: Coord, point: Coord) -> Coord {
    let seg = b - a;
    let len_sq = seg.magnitude_squared();
    if len_sq == 0. {
        return a;
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0., 1.);
    a + seg * t
}
