//! Distance mesh construction.
//!
//! Every obstacle is turned into a 3-d triangle mesh whose `z` value at a
//! point equals the distance from that point to the obstacle: a fan of cone
//! sectors at each polygon vertex and a pair of "tent" quads per polygon
//! edge. Rendered with a depth test, the z-buffer computes the per-pixel
//! minimum over all obstacles, so the colour buffer ends up holding the id
//! of the closest obstacle — a discretised generalised Voronoi diagram.

use corridormap_types::{Coord, Footprint, Rect};

use crate::build::BuildError;
use crate::render::{MeshVertex, Renderer};

/// Ids `num_polys..num_polys + NUM_BORDER_SEGMENTS` are the synthetic
/// obstacles bounding the scene rectangle.
pub const NUM_BORDER_SEGMENTS: usize = 4;

/// A contiguous run of triangles sharing one obstacle colour.
#[derive(Clone, Copy, Debug)]
pub struct MeshSegment {
    pub color: u32,
    pub num_verts: usize,
}

/// Triangle list partitioned into one segment per obstacle, plus the four
/// border segments.
#[derive(Clone, Debug, Default)]
pub struct DistanceMesh {
    verts: Vec<MeshVertex>,
    segments: Vec<MeshSegment>,
}

impl DistanceMesh {
    #[inline]
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn num_verts(&self) -> usize {
        self.verts.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = (MeshSegment, &[MeshVertex])> {
        self.segments.iter().scan(0, move |offset, seg| {
            let verts = &self.verts[*offset..*offset + seg.num_verts];
            *offset += seg.num_verts;
            Some((*seg, verts))
        })
    }

    /// Draws every segment through the render capability, coloured by
    /// obstacle id.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.begin();
        for (seg, verts) in self.segments() {
            renderer.draw(verts, seg.color);
        }
        renderer.end();
    }
}

/// Overrides segment colours with `colors[segment_index % colors.len()]`.
/// Only useful for visual debugging of the rendered diagram.
pub fn set_segment_colors(mesh: &mut DistanceMesh, colors: &[u32]) {
    for (i, seg) in mesh.segments.iter_mut().enumerate() {
        seg.color = colors[i % colors.len()];
    }
}

/// Number of triangles needed to approximate a full distance cone with chord
/// error at most `max_error`.
pub fn distance_mesh_tris_for_point(max_dist: f32, max_error: f32) -> usize {
    let cone_half_angle = ((max_dist - max_error) / max_dist).acos();
    (std::f32::consts::PI / cone_half_angle).ceil() as usize
}

/// Conservative upper bound on the vertex count of
/// [`build_distance_mesh`]'s output, suitable for sizing backend buffers up
/// front.
pub fn max_distance_mesh_verts(footprint: &Footprint, max_dist: f32, max_error: f32) -> usize {
    let point_tris = distance_mesh_tris_for_point(max_dist, max_error);
    // a full cone per vertex plus two tent sides per edge plus the borders.
    point_tris * footprint.num_verts() * 3 + footprint.num_verts() * 4 * 3 + NUM_BORDER_SEGMENTS * 6
}

fn build_cone_sector(
    verts: &mut Vec<MeshVertex>,
    pos: Coord,
    steps: usize,
    step_angle: f32,
    start_angle: f32,
    radius: f32,
) -> usize {
    for i in 0..steps {
        let a0 = start_angle + i as f32 * step_angle;
        let a1 = start_angle + (i + 1) as f32 * step_angle;

        verts.push(MeshVertex {
            x: pos.x,
            y: pos.y,
            z: 0.,
        });
        verts.push(MeshVertex {
            x: pos.x + radius * a0.cos(),
            y: pos.y + radius * a0.sin(),
            z: radius,
        });
        verts.push(MeshVertex {
            x: pos.x + radius * a1.cos(),
            y: pos.y + radius * a1.sin(),
            z: radius,
        });
    }

    steps * 3
}

fn build_tent_side(verts: &mut Vec<MeshVertex>, a: Coord, b: Coord, len: f32, size: f32) -> usize {
    let e = b - a;
    let n = e.left() / len;

    let p0 = MeshVertex { x: a.x, y: a.y, z: 0. };
    let p1 = MeshVertex { x: b.x, y: b.y, z: 0. };
    let p2 = MeshVertex {
        x: a.x + size * n.x,
        y: a.y + size * n.y,
        z: size,
    };
    let p3 = MeshVertex {
        x: b.x + size * n.x,
        y: b.y + size * n.y,
        z: size,
    };

    verts.extend_from_slice(&[p0, p1, p2, p2, p1, p3]);
    6
}

/// Builds the distance mesh for `footprint` inside the scene rectangle.
///
/// Each polygon vertex becomes a cone sector spanning the exterior angle,
/// each polygon edge a tent on both of its sides, and each side of the scene
/// rectangle a border tent ramping inwards. Cone subdivision is chosen so the
/// chord error stays within `max_error`.
///
/// Errors when `max_dist <= max_error`: the cone half-angle formula has no
/// solution there.
pub fn build_distance_mesh(
    footprint: &Footprint,
    scene: Rect,
    max_dist: f32,
    max_error: f32,
) -> Result<DistanceMesh, BuildError> {
    if max_dist <= max_error {
        return Err(BuildError::DistanceTolerance {
            max_dist,
            max_error,
        });
    }

    let cone_half_angle = ((max_dist - max_error) / max_dist).acos();
    let cone_triangle_count = (std::f32::consts::PI / cone_half_angle).ceil();
    let cone_angle = 2. * std::f32::consts::PI / cone_triangle_count;

    let mut mesh = DistanceMesh {
        verts: Vec::with_capacity(max_distance_mesh_verts(footprint, max_dist, max_error)),
        segments: Vec::with_capacity(footprint.num_polys() + NUM_BORDER_SEGMENTS),
    };

    for (poly_idx, poly) in footprint.polygons().enumerate() {
        let nverts = poly.len();
        let mut num_segment_verts = 0;

        let mut prev_idx = nverts - 2;
        let mut curr_idx = nverts - 1;

        for next_idx in 0..nverts {
            let prev = poly[prev_idx];
            let curr = poly[curr_idx];
            let next = poly[next_idx];

            let len_e1 = (next - curr).magnitude();

            let e0 = (prev - curr).normalized();
            let e1 = (next - curr).normalized();

            let cos_inner = e0.dot(e1).clamp(-1., 1.);
            let angle_inner = cos_inner.acos();
            let angle_cone_sector = 2. * std::f32::consts::PI - angle_inner;

            let angle_cone_sector_steps = (angle_cone_sector / cone_angle).ceil().max(1.) as usize;
            let angle_cone_sector_step = angle_cone_sector / angle_cone_sector_steps as f32;
            let angle_start = e0.y.atan2(e0.x);

            // 1. cone sector for the current vertex.
            num_segment_verts += build_cone_sector(
                &mut mesh.verts,
                curr,
                angle_cone_sector_steps,
                angle_cone_sector_step,
                angle_start,
                max_dist,
            );

            // 2. tents for the (curr, next) edge.
            num_segment_verts += build_tent_side(&mut mesh.verts, curr, next, len_e1, max_dist);
            num_segment_verts += build_tent_side(&mut mesh.verts, next, curr, len_e1, max_dist);

            prev_idx = curr_idx;
            curr_idx = next_idx;
        }

        mesh.segments.push(MeshSegment {
            color: poly_idx as u32,
            num_verts: num_segment_verts,
        });
    }

    // 3. border tents, ramping towards the scene interior.
    {
        let [lb, rb, rt, lt] = scene.corners();
        let diag = rt - lb;
        let num_polys = footprint.num_polys() as u32;

        let sides = [(lb, rb, diag.x), (rb, rt, diag.y), (rt, lt, diag.x), (lt, lb, diag.y)];
        for (i, (from, to, len)) in sides.into_iter().enumerate() {
            let num_verts = build_tent_side(&mut mesh.verts, from, to, len, max_dist);
            mesh.segments.push(MeshSegment {
                color: num_polys + i as u32,
                num_verts,
            });
        }
    }

    debug!(
        "distance mesh: {} segments, {} vertices",
        mesh.num_segments(),
        mesh.num_verts()
    );

    Ok(mesh)
}
