//! Clearance-aware shortest paths through a corridor.
//!
//! The classic funnel algorithm assumes straight portal edges and a point
//! agent. Corridor borders here include arcs — around obstacle corners and
//! around pinch vertices — and the agent is a disk, which shrinks the
//! traversable region away from the borders by `clearance`. The funnel
//! state therefore holds [`PathElement`]s rather than points: each side is
//! a deque of segments and clearance-radius arcs kept at its winding
//! invariant (left side turns counter-clockwise everywhere, right side
//! clockwise), and the apex advances over whole or split arcs.
//!
//! [`find_shortest_path_points`] is the plain polyline variant for a point
//! agent; it ignores border curvature entirely.

use std::collections::VecDeque;

use corridormap_types::Coord;

use crate::corridor::{Corridor, Curve};

// orientation tolerance for the point-agent funnel's apex comparisons.
const ORIENT_EPSILON: f32 = 1e-6;
// absolute area tolerance for on-arc containment tests.
const ON_ARC_EPSILON: f32 = 1e-3;

const WINDING_CCW: bool = true;
const WINDING_CW: bool = false;

const DIRECTION_INCOMING: bool = true;
const DIRECTION_OUTGOING: bool = false;

/// One element of a shortest path: a segment or an arc of radius
/// `clearance` around `origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathElement {
    pub curve: Curve,
    /// Arc winding; `true` when the arc is walked counter-clockwise.
    pub ccw: bool,
    /// Arc centre; for segments, the start point.
    pub origin: Coord,
    pub p0: Coord,
    pub p1: Coord,
}

#[inline]
fn orient(o: Coord, a: Coord, b: Coord) -> f32 {
    (a - o).wedge(b - o)
}

fn make_segment(p0: Coord, p1: Coord) -> PathElement {
    PathElement {
        curve: Curve::Line,
        ccw: false,
        origin: p0,
        p0,
        p1,
    }
}

fn make_arc(origin: Coord, p0: Coord, p1: Coord, ccw: bool) -> PathElement {
    PathElement {
        curve: Curve::ConvexArc,
        ccw,
        origin,
        p0,
        p1,
    }
}

// tangent point on the disk ['origin', 'radius'] for a tangent line through
// 'point'. 'ccw' picks the winding (ccw -> the disk ends up left of the
// tangent line); 'incoming' gives the direction of the tangent for the side
// test.
fn get_tangent(point: Coord, origin: Coord, radius: f32, ccw: bool, incoming: bool) -> Coord {
    let d = point - origin;
    let l = d.magnitude();
    debug_assert!(l >= radius - ON_ARC_EPSILON);
    let d = d / l;
    let t = (l * l - radius * radius).max(0.).sqrt();

    let sina = t / l;
    let cosa = radius / l;
    let m11 = Coord { x: cosa, y: -sina };
    let m12 = Coord { x: sina, y: cosa };
    let m21 = Coord { x: cosa, y: sina };
    let m22 = Coord { x: -sina, y: cosa };

    let t1 = origin
        + Coord {
            x: d.dot(m11),
            y: d.dot(m12),
        } * radius;
    let t2 = origin
        + Coord {
            x: d.dot(m21),
            y: d.dot(m22),
        } * radius;

    let td = t1 - point;
    let od = origin - point;

    let area = if incoming {
        td.wedge(od)
    } else {
        -td.wedge(od)
    };
    let t_ccw = if area > 0. { t1 } else { t2 };
    let t_cw = if area > 0. { t2 } else { t1 };
    if ccw {
        t_ccw
    } else {
        t_cw
    }
}

// endpoint of the tangent segment at a point already on the circle.
fn get_tangent_at_point(point: Coord, origin: Coord, radius: f32, ccw: bool) -> Coord {
    let d = point - origin;
    debug_assert!((d.magnitude() - radius).abs() < ON_ARC_EPSILON * radius.max(1.));
    let e1 = point + d.left();
    let e2 = point + d.right();
    let area = orient(point, e1, origin);
    let e_ccw = if area > 0. { e1 } else { e2 };
    let e_cw = if area > 0. { e2 } else { e1 };
    if ccw {
        e_ccw
    } else {
        e_cw
    }
}

// mutual tangent of two clearance disks, outgoing from 'o1' and incoming to
// 'o2'; that direction plus the two windings selects one of the four
// candidates.
fn get_mutual_tangent(
    o1: Coord,
    o2: Coord,
    radius: f32,
    ccw1: bool,
    ccw2: bool,
) -> (Coord, Coord) {
    if ccw1 == ccw2 {
        let d = o2 - o1;
        let s = d.magnitude();
        debug_assert!(s > 0.);
        let p = d.left() * (radius / s);
        if ccw1 {
            (o1 - p, o2 - p)
        } else {
            (o1 + p, o2 + p)
        }
    } else if ccw1 {
        // crossing tangent via the doubled disk around o1.
        let t = get_tangent(o2, o1, 2. * radius, ccw1, DIRECTION_OUTGOING);
        let v = (o1 - t) * 0.5;
        (t + v, o2 + v)
    } else {
        let t = get_tangent(o1, o2, 2. * radius, ccw2, DIRECTION_INCOMING);
        let v = (o2 - t) * 0.5;
        (o1 + v, t + v)
    }
}

#[inline]
fn is_ccw_turn(o: Coord, a: Coord, b: Coord) -> bool {
    orient(o, a, b) >= 0.
}

// point 'p' inside the arc spanned from 'a' to 'b' with the given winding.
fn in_arc(p: Coord, a: Coord, b: Coord, ccw: bool) -> bool {
    let area = orient(a, p, b);
    if ccw {
        area >= -ON_ARC_EPSILON
    } else {
        area <= ON_ARC_EPSILON
    }
}

// direction (point - arc_start) wraps past the arc start: the tangent point
// from 'point' lies beyond 'arc_start'.
fn wraps_arc(origin: Coord, radius: f32, arc_start: Coord, ccw: bool, point: Coord) -> bool {
    let start_tangent = get_tangent_at_point(arc_start, origin, radius, ccw);
    let area = orient(arc_start, start_tangent, point);
    if ccw {
        area > 0.
    } else {
        area < 0.
    }
}

// output path under construction, bounded by the caller's element budget.
struct PathState {
    max_elems: usize,
    elems: Vec<PathElement>,
}

impl PathState {
    fn full(&self) -> bool {
        self.elems.len() >= self.max_elems
    }

    // append an element, merging consecutive arcs around one origin and
    // dissolving arcs that closed on themselves.
    fn grow(&mut self, new_element: PathElement, epsilon: f32) {
        if let Some(previous) = self.elems.last_mut() {
            previous.p1 = new_element.p0;

            if previous.curve == Curve::ConvexArc && new_element.curve == Curve::ConvexArc {
                if previous.origin.is_near(new_element.origin, epsilon) {
                    previous.p1 = new_element.p1;
                    return;
                }
            }

            if previous.curve == Curve::ConvexArc && new_element.curve == Curve::Line {
                if previous.p0.is_near(previous.p1, epsilon) {
                    previous.curve = new_element.curve;
                    previous.ccw = new_element.ccw;
                    previous.p1 = new_element.p1;
                    return;
                }
            }
        }

        if self.elems.len() < self.max_elems {
            self.elems.push(new_element);
        }
    }
}

// add a new portal element to its own funnel side, popping elements until
// the side winding invariant can hold again.
fn grow_funnel_side(
    side: &mut VecDeque<PathElement>,
    ccw: bool,
    following_border: &mut bool,
    new_element: PathElement,
    epsilon: f32,
    clearance: f32,
) {
    let mut curve = new_element.curve;
    debug_assert!(!new_element.p0.is_near(new_element.p1, epsilon));

    // treat reflex arcs as their chords. opposite winding arcs are never
    // part of a funnel side, so the side stops following the border.
    if curve == Curve::ReflexArc {
        curve = Curve::Line;
        *following_border = false;
    }

    if *following_border {
        side.push_back(new_element);
        return;
    }

    while let Some(&elem) = side.back() {
        // adding a vertex.
        if curve == Curve::Line {
            if elem.curve == Curve::Line {
                let area = orient(elem.p0, elem.p1, new_element.p1);
                if if ccw { area >= 0. } else { area <= 0. } {
                    side.push_back(make_segment(elem.p1, new_element.p1));
                    break;
                }
                side.pop_back();
                continue;
            }

            if elem.curve == Curve::ConvexArc {
                let tangent = get_tangent(
                    new_element.p1,
                    elem.origin,
                    clearance,
                    elem.ccw,
                    DIRECTION_OUTGOING,
                );

                if in_arc(tangent, elem.p0, elem.p1, elem.ccw) {
                    side.pop_back();
                    side.push_back(make_arc(elem.origin, elem.p0, tangent, elem.ccw));
                    side.push_back(make_segment(tangent, new_element.p1));
                    break;
                }

                side.pop_back();
                continue;
            }
        }

        // adding an arc.
        if curve == Curve::ConvexArc {
            if elem.curve == Curve::Line {
                let mut p = elem.p1;
                if p.is_near(new_element.p0, epsilon) {
                    p = elem.p0;
                }

                let tangent =
                    get_tangent(p, new_element.origin, clearance, ccw, DIRECTION_INCOMING);
                let area = orient(elem.p0, elem.p1, tangent);

                if if ccw { area >= 0. } else { area <= 0. } {
                    if in_arc(tangent, new_element.p0, new_element.p1, ccw) {
                        side.pop_back();
                        side.push_back(make_segment(elem.p0, tangent));
                        side.push_back(make_arc(new_element.origin, tangent, new_element.p1, ccw));
                        // arcs return the funnel side to the border.
                        *following_border = true;
                        break;
                    }
                }

                side.pop_back();
                continue;
            }

            if elem.curve == Curve::ConvexArc {
                let (t1, t2) =
                    get_mutual_tangent(elem.origin, new_element.origin, clearance, ccw, ccw);

                if in_arc(t1, elem.p0, elem.p1, ccw)
                    && in_arc(t2, new_element.p0, new_element.p1, ccw)
                {
                    side.pop_back();
                    side.push_back(make_arc(elem.origin, elem.p0, t1, ccw));
                    side.push_back(make_segment(t1, t2));
                    side.push_back(make_arc(new_element.origin, t2, new_element.p1, ccw));
                    // arcs return the funnel side to the border.
                    *following_border = true;
                    break;
                }

                side.pop_back();
                continue;
            }
        }

        side.pop_back();
    }
}

// advance the apex over the topmost arc: either consume it whole, or split
// it at the tangent point and stop there.
fn move_apex_over_arc(
    side: &mut VecDeque<PathElement>,
    tangent: Coord,
    apex: &mut Coord,
    path: &mut PathState,
    epsilon: f32,
) -> bool {
    let arc = side.front_mut().expect("apex moves over a non-empty side");

    if in_arc(tangent, arc.p0, arc.p1, arc.ccw) {
        let consumed = make_arc(arc.origin, arc.p0, tangent, arc.ccw);
        arc.p0 = tangent;
        *apex = tangent;
        path.grow(consumed, epsilon);
        return true;
    }

    let whole = side.pop_front().expect("checked non-empty");
    *apex = whole.p1;
    path.grow(whole, epsilon);
    false
}

// the new element never satisfied its own side's winding invariant: move
// the apex up the opposite side, emitting consumed elements into the path.
fn move_funnel_apex(
    side: &mut VecDeque<PathElement>,
    ccw: bool,
    apex: &mut Coord,
    new_element: &PathElement,
    path: &mut PathState,
    clearance: f32,
    epsilon: f32,
) {
    let vertex = new_element.p1;
    let origin = new_element.origin;
    let mut curve = new_element.curve;

    if curve == Curve::ReflexArc {
        curve = Curve::Line;
    }

    while let Some(&elem) = side.front() {
        // adding a vertex.
        if curve == Curve::Line {
            if elem.curve == Curve::Line {
                if is_ccw_turn(elem.p0, elem.p1, vertex) != ccw {
                    break;
                }

                *apex = elem.p1;
                let popped = side.pop_front().expect("checked non-empty");
                path.grow(popped, epsilon);
                continue;
            }

            if elem.curve == Curve::ConvexArc {
                if !wraps_arc(elem.origin, clearance, elem.p0, elem.ccw, vertex) {
                    break;
                }

                let t = get_tangent(vertex, elem.origin, clearance, elem.ccw, DIRECTION_OUTGOING);

                if move_apex_over_arc(side, t, apex, path, epsilon) {
                    break;
                }
                continue;
            }
        }

        // adding an arc.
        if curve == Curve::ConvexArc {
            if elem.curve == Curve::Line {
                let t = get_tangent(elem.p1, origin, clearance, !ccw, DIRECTION_INCOMING);

                if is_ccw_turn(elem.p0, elem.p1, t) != ccw {
                    break;
                }

                *apex = elem.p1;
                let popped = side.pop_front().expect("checked non-empty");
                path.grow(popped, epsilon);
                continue;
            }

            if elem.curve == Curve::ConvexArc {
                let (t1, t2) = get_mutual_tangent(elem.origin, origin, clearance, elem.ccw, !ccw);

                if !wraps_arc(elem.origin, clearance, elem.p0, elem.ccw, t2) {
                    break;
                }

                if move_apex_over_arc(side, t1, apex, path, epsilon) {
                    break;
                }
                continue;
            }
        }

        break;
    }
}

// seed a funnel side again after its apex moved over the opposite side.
fn restart_funnel_side(
    side: &mut VecDeque<PathElement>,
    ccw: bool,
    apex: Coord,
    following_border: &mut bool,
    new_element: &PathElement,
    clearance: f32,
) {
    let mut curve = new_element.curve;

    if curve == Curve::ReflexArc {
        curve = Curve::Line;
    }

    if curve == Curve::Line {
        side.push_back(make_segment(apex, new_element.p1));
        return;
    }

    let tangent = get_tangent(apex, new_element.origin, clearance, ccw, DIRECTION_INCOMING);
    if in_arc(tangent, new_element.p0, new_element.p1, ccw) {
        side.push_back(make_segment(apex, tangent));
        side.push_back(make_arc(new_element.origin, tangent, new_element.p1, ccw));
        *following_border = true;
    } else {
        side.push_back(make_segment(apex, new_element.p1));
        *following_border = false;
    }
}

/// Runs the arc-aware funnel over `corridor` from `source` to `target`.
///
/// The returned elements describe the detours of the shortest
/// `clearance`-feasible path in order; the final straight leg from the last
/// element to `target` is implicit, so an empty result means the straight
/// segment from `source` to `target` is the whole path. At most
/// `max_path_size` elements are produced; longer paths are truncated.
pub fn find_shortest_path(
    corridor: &Corridor,
    source: Coord,
    target: Coord,
    max_path_size: usize,
) -> Vec<PathElement> {
    debug_assert!(corridor.num_disks() > 0);
    debug_assert!(max_path_size > 0);
    if corridor.num_disks() == 0 || max_path_size == 0 {
        return Vec::new();
    }

    let epsilon = corridor.epsilon();
    let clearance = corridor.clearance();

    let mut funnel_l: VecDeque<PathElement> = VecDeque::with_capacity(corridor.num_disks());
    let mut funnel_r: VecDeque<PathElement> = VecDeque::with_capacity(corridor.num_disks());
    let mut apex = source;
    // true while a side's topmost element lies on the corridor border
    // rather than an interior tangent.
    let mut following_border_l = false;
    let mut following_border_r = false;

    let mut path = PathState {
        max_elems: max_path_size,
        elems: Vec::new(),
    };

    funnel_l.push_back(make_segment(apex, corridor.border_l(0)));
    funnel_r.push_back(make_segment(apex, corridor.border_r(0)));

    let mut prev_l = corridor.border_l(0);
    let mut prev_r = corridor.border_r(0);

    for i in 1..corridor.num_disks() {
        let (elem_l, elem_r) = if i < corridor.num_disks() - 1 {
            let elem_l = PathElement {
                curve: corridor.left_border_curve(i),
                ccw: true,
                origin: corridor.obstacle_l(i),
                p0: prev_l,
                p1: corridor.border_l(i),
            };
            let elem_r = PathElement {
                curve: corridor.right_border_curve(i),
                ccw: false,
                origin: corridor.obstacle_r(i),
                p0: prev_r,
                p1: corridor.border_r(i),
            };
            debug_assert!(
                elem_l.curve != Curve::Point || elem_l.p0.is_near(elem_l.p1, epsilon)
            );
            debug_assert!(
                elem_r.curve != Curve::Point || elem_r.p0.is_near(elem_r.p1, epsilon)
            );
            (elem_l, elem_r)
        } else {
            // the target acts as the last portal.
            let elem_l = PathElement {
                curve: Curve::Line,
                ccw: true,
                origin: target,
                p0: prev_l,
                p1: target,
            };
            let elem_r = PathElement {
                curve: Curve::Line,
                ccw: false,
                origin: target,
                p0: prev_r,
                p1: target,
            };
            (elem_l, elem_r)
        };

        // add the left portal element.
        if elem_l.curve != Curve::Point {
            grow_funnel_side(
                &mut funnel_l,
                WINDING_CCW,
                &mut following_border_l,
                elem_l,
                epsilon,
                clearance,
            );
            if funnel_l.is_empty() {
                trace!("funnel apex moves over the right side at portal {}", i);
                move_funnel_apex(
                    &mut funnel_r,
                    WINDING_CW,
                    &mut apex,
                    &elem_l,
                    &mut path,
                    clearance,
                    epsilon,
                );
                if path.full() {
                    return path.elems;
                }
                restart_funnel_side(
                    &mut funnel_l,
                    WINDING_CCW,
                    apex,
                    &mut following_border_l,
                    &elem_l,
                    clearance,
                );
            }
        }

        // add the right portal element.
        if elem_r.curve != Curve::Point {
            grow_funnel_side(
                &mut funnel_r,
                WINDING_CW,
                &mut following_border_r,
                elem_r,
                epsilon,
                clearance,
            );
            if funnel_r.is_empty() {
                trace!("funnel apex moves over the left side at portal {}", i);
                move_funnel_apex(
                    &mut funnel_l,
                    WINDING_CCW,
                    &mut apex,
                    &elem_r,
                    &mut path,
                    clearance,
                    epsilon,
                );
                if path.full() {
                    return path.elems;
                }
                restart_funnel_side(
                    &mut funnel_r,
                    WINDING_CW,
                    apex,
                    &mut following_border_r,
                    &elem_r,
                    clearance,
                );
            }
        }

        prev_l = elem_l.p1;
        prev_r = elem_r.p1;
    }

    path.elems
}

/// Point-agent funnel over the corridor borders.
///
/// Reference: "Simple Stupid Funnel Algorithm",
/// <http://digestingduck.blogspot.co.at/2010/03/simple-stupid-funnel-algorithm.html>
///
/// Returns the shortest polyline through the portal sequence, starting at
/// `source` and ending at `target` (when it fits the size budget).
pub fn find_shortest_path_points(
    corridor: &Corridor,
    source: Coord,
    target: Coord,
    max_path_size: usize,
) -> Vec<Coord> {
    debug_assert!(corridor.num_disks() > 0);
    debug_assert!(max_path_size > 0);
    if corridor.num_disks() == 0 || max_path_size == 0 {
        return Vec::new();
    }

    let last_portal = corridor.num_disks() - 1;

    let mut path = Vec::with_capacity(max_path_size.min(corridor.num_disks() + 1));
    let mut apex = source;
    let mut left = source;
    let mut right = source;
    let mut left_idx = 0;
    let mut right_idx = 0;

    path.push(apex);

    let mut i = 1;
    while i <= last_portal + 1 && path.len() < max_path_size {
        let (portal_l, portal_r) = if i < last_portal {
            (corridor.border_l(i), corridor.border_r(i))
        } else {
            (target, target)
        };

        if orient(apex, portal_l, left) >= 0. {
            if apex.is_near(left, ORIENT_EPSILON) || orient(apex, right, portal_l) > 0. {
                left = portal_l;
                left_idx = i;
            } else {
                path.push(right);
                apex = right;
                left = apex;
                left_idx = right_idx;
                i = right_idx + 1;
                continue;
            }
        }

        if orient(apex, right, portal_r) >= 0. {
            if apex.is_near(right, ORIENT_EPSILON) || orient(apex, portal_r, left) > 0. {
                right = portal_r;
                right_idx = i;
            } else {
                path.push(left);
                apex = left;
                right = apex;
                right_idx = left_idx;
                i = left_idx + 1;
                continue;
            }
        }

        i += 1;
    }

    if path.len() < max_path_size {
        path.push(target);
    }

    path
}

#[cfg(test)]
mod tests;
