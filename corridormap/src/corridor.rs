//! Corridor extraction.
//!
//! A route through the walkable space is a sequence of half-edges sharing
//! endpoints. Walking it and collecting every vertex and event position
//! yields the corridor: the maximum inscribed disk at each sample plus the
//! left and right border geometry the funnel needs — border points offset
//! from the obstacles by the agent radius, the contact sites those borders
//! touch, and a per-disk classification of how each border moves between
//! samples.

use corridormap_types::Coord;

use crate::space::{HalfEdgeId, WalkableSpace};

/// How a border point moves from the previous corridor disk to this one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    /// The border did not move.
    Point = 0,
    /// The border translated along an obstacle edge.
    Line = 1,
    /// The border wrapped around an obstacle corner (the contact site is
    /// the pivot).
    ConvexArc = 2,
    /// The border pivoted around the corridor vertex itself; winds opposite
    /// to a convex arc.
    ReflexArc = 3,
}

impl Curve {
    fn from_bits(bits: u8) -> Curve {
        match bits & 0x3 {
            0 => Curve::Point,
            1 => Curve::Line,
            2 => Curve::ConvexArc,
            _ => Curve::ReflexArc,
        }
    }
}

/// The corridor of maximum inscribed disks along one route.
#[derive(Clone, Debug, Default)]
pub struct Corridor {
    origins: Vec<Coord>,
    border_l: Vec<Coord>,
    border_r: Vec<Coord>,
    obstacle_l: Vec<Coord>,
    obstacle_r: Vec<Coord>,
    // packed (left << 4) | right curve bits per disk.
    curves: Vec<u8>,
    clearance: f32,
    epsilon: f32,
}

impl Corridor {
    #[inline]
    pub fn num_disks(&self) -> usize {
        self.origins.len()
    }

    /// Agent radius the borders are offset by.
    #[inline]
    pub fn clearance(&self) -> f32 {
        self.clearance
    }

    /// Geometric tolerance for curve classification and funnel tests.
    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    #[inline]
    pub fn origin(&self, i: usize) -> Coord {
        self.origins[i]
    }

    #[inline]
    pub fn border_l(&self, i: usize) -> Coord {
        self.border_l[i]
    }

    #[inline]
    pub fn border_r(&self, i: usize) -> Coord {
        self.border_r[i]
    }

    /// Contact site the left border touches at disk `i`; the centre of the
    /// border arc when the left curve is an arc.
    #[inline]
    pub fn obstacle_l(&self, i: usize) -> Coord {
        self.obstacle_l[i]
    }

    #[inline]
    pub fn obstacle_r(&self, i: usize) -> Coord {
        self.obstacle_r[i]
    }

    #[inline]
    pub fn left_border_curve(&self, i: usize) -> Curve {
        Curve::from_bits(self.curves[i] >> 4)
    }

    #[inline]
    pub fn right_border_curve(&self, i: usize) -> Curve {
        Curve::from_bits(self.curves[i])
    }
}

/// Number of disks [`extract`] will produce for the route: every event on
/// every half-edge, plus the vertices the route visits.
pub fn num_path_disks(space: &WalkableSpace, path: &[HalfEdgeId]) -> usize {
    if path.is_empty() {
        return 0;
    }
    path.iter()
        .map(|&h| 1 + space.num_edge_events(h))
        .sum::<usize>()
        + 1
}

/// Extracts the corridor along `path` for an agent of radius `clearance`.
///
/// Consecutive half-edges must share a vertex: `target(path[i]) ==
/// source(path[i + 1])`.
pub fn extract(
    space: &WalkableSpace,
    path: &[HalfEdgeId],
    clearance: f32,
    epsilon: f32,
) -> Corridor {
    let mut corridor = Corridor {
        clearance,
        epsilon,
        ..Corridor::default()
    };

    if path.is_empty() {
        return corridor;
    }

    let num_disks = num_path_disks(space, path);
    corridor.origins.reserve(num_disks);
    corridor.border_l.reserve(num_disks);
    corridor.border_r.reserve(num_disks);
    corridor.obstacle_l.reserve(num_disks);
    corridor.obstacle_r.reserve(num_disks);
    corridor.curves.reserve(num_disks);

    for (i, &h) in path.iter().enumerate() {
        debug_assert!(i == 0 || space.source(h) == space.target(path[i - 1]));

        let source = space.source(h);
        push_vertex_disk(&mut corridor, space, source, h);

        for event in space.events(h) {
            push_disk(
                &mut corridor,
                space.event_pos(event),
                space.event_left_side(h, event),
                space.event_right_side(h, event),
            );
        }
    }

    let last = *path.last().expect("path is non-empty");
    push_vertex_disk(&mut corridor, space, space.target(last), last);

    debug_assert_eq!(corridor.num_disks(), num_disks);
    classify_curves(&mut corridor);
    corridor
}

fn push_vertex_disk(
    corridor: &mut Corridor,
    space: &WalkableSpace,
    vertex: crate::space::VertexId,
    h: HalfEdgeId,
) {
    let pos = space.vertex_pos(vertex);
    let left = space
        .vertex_side(vertex, space.left_obstacle(h))
        .unwrap_or(pos);
    let right = space
        .vertex_side(vertex, space.right_obstacle(h))
        .unwrap_or(pos);
    push_disk(corridor, pos, left, right);
}

fn push_disk(corridor: &mut Corridor, origin: Coord, contact_l: Coord, contact_r: Coord) {
    corridor.origins.push(origin);
    corridor.obstacle_l.push(contact_l);
    corridor.obstacle_r.push(contact_r);
    corridor
        .border_l
        .push(offset_border(origin, contact_l, corridor.clearance));
    corridor
        .border_r
        .push(offset_border(origin, contact_r, corridor.clearance));
}

// the border runs at agent-radius distance from the obstacle, towards the
// disk origin. a disk degenerated onto its contact keeps the contact.
fn offset_border(origin: Coord, contact: Coord, clearance: f32) -> Coord {
    let dir = origin - contact;
    let len = dir.magnitude();
    if len <= f32::EPSILON {
        return contact;
    }
    contact + dir * (clearance / len)
}

fn classify_curves(corridor: &mut Corridor) {
    let n = corridor.num_disks();
    if n == 0 {
        return;
    }

    corridor.curves.push(pack(Curve::Point, Curve::Point));
    for i in 1..n {
        let left = classify_side(
            corridor.border_l[i - 1],
            corridor.border_l[i],
            corridor.obstacle_l[i - 1],
            corridor.obstacle_l[i],
            corridor.epsilon,
        );
        let right = classify_side(
            corridor.border_r[i - 1],
            corridor.border_r[i],
            corridor.obstacle_r[i - 1],
            corridor.obstacle_r[i],
            corridor.epsilon,
        );
        corridor.curves.push(pack(left, right));
    }
}

#[inline]
fn pack(left: Curve, right: Curve) -> u8 {
    ((left as u8) << 4) | right as u8
}

fn classify_side(
    border_prev: Coord,
    border: Coord,
    contact_prev: Coord,
    contact: Coord,
    epsilon: f32,
) -> Curve {
    if border.is_near(border_prev, epsilon) {
        return Curve::Point;
    }
    if contact.is_near(contact_prev, epsilon) {
        // stationary site, moving border: wrap around an obstacle corner.
        return Curve::ConvexArc;
    }
    if (border - border_prev).is_near(contact - contact_prev, epsilon) {
        // border and site translate together along an obstacle edge.
        return Curve::Line;
    }
    // the site jumped while the border swung: pivot around the vertex disk.
    Curve::ReflexArc
}

// hand-built corridors for the funnel tests: disks from origins and
// contact sites, with borders and curves derived exactly as extract() does.
#[cfg(test)]
pub(crate) fn corridor_from_disks(
    origins: &[Coord],
    obstacle_l: &[Coord],
    obstacle_r: &[Coord],
    clearance: f32,
    epsilon: f32,
) -> Corridor {
    let mut corridor = Corridor {
        clearance,
        epsilon,
        ..Corridor::default()
    };
    for i in 0..origins.len() {
        push_disk(&mut corridor, origins[i], obstacle_l[i], obstacle_r[i]);
    }
    classify_curves(&mut corridor);
    corridor
}

#[cfg(test)]
mod test {
    use super::*;
    use corridormap_types::coord;

    #[test]
    fn curve_bits_roundtrip() {
        for (l, r) in [
            (Curve::Point, Curve::Line),
            (Curve::ConvexArc, Curve::ReflexArc),
            (Curve::Line, Curve::ConvexArc),
        ] {
            let byte = pack(l, r);
            assert_eq!(Curve::from_bits(byte >> 4), l);
            assert_eq!(Curve::from_bits(byte), r);
        }
    }

    #[test]
    fn stationary_border_is_a_point() {
        let b = coord! { x: 1., y: 1. };
        let c = coord! { x: 1., y: 0. };
        assert_eq!(classify_side(b, b, c, c, 1e-3), Curve::Point);
    }

    #[test]
    fn translating_border_is_a_line() {
        let curve = classify_side(
            coord! { x: 0., y: 1. },
            coord! { x: 2., y: 1. },
            coord! { x: 0., y: 0. },
            coord! { x: 2., y: 0. },
            1e-3,
        );
        assert_eq!(curve, Curve::Line);
    }

    #[test]
    fn pivot_around_a_site_is_a_convex_arc() {
        // border swings around a fixed corner contact.
        let corner = coord! { x: 0., y: 0. };
        let curve = classify_side(
            coord! { x: -1., y: 0. },
            coord! { x: 0., y: 1. },
            corner,
            corner,
            1e-3,
        );
        assert_eq!(curve, Curve::ConvexArc);
    }

    #[test]
    fn site_jump_is_a_reflex_arc() {
        // the contact site flips to another obstacle while the border swings
        // around the corridor vertex.
        let curve = classify_side(
            coord! { x: 0., y: 1. },
            coord! { x: 1., y: 0. },
            coord! { x: 0., y: 2. },
            coord! { x: 2., y: 0. },
            1e-3,
        );
        assert_eq!(curve, Curve::ReflexArc);
    }

    #[test]
    fn borders_sit_at_clearance_from_their_sites() {
        let mut corridor = Corridor {
            clearance: 0.5,
            epsilon: 1e-3,
            ..Corridor::default()
        };
        push_disk(
            &mut corridor,
            coord! { x: 0., y: 0. },
            coord! { x: 0., y: -2. },
            coord! { x: 0., y: 3. },
        );
        assert_eq!(corridor.border_l(0), coord! { x: 0., y: -1.5 });
        assert_eq!(corridor.border_r(0), coord! { x: 0., y: 2.5 });
    }
}
