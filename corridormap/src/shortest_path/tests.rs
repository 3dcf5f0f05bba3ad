use super::*;
use crate::corridor::corridor_from_disks;
use corridormap_types::coord;

fn unit(angle_degrees: f32) -> Coord {
    let a = angle_degrees.to_radians();
    coord! { x: a.cos(), y: a.sin() }
}

// total length of the emitted elements plus the implicit closing leg.
fn path_length(path: &[PathElement], source: Coord, target: Coord, clearance: f32) -> f32 {
    let mut total = 0.;
    let mut cursor = source;

    for elem in path {
        total += (elem.p0 - cursor).magnitude();
        match elem.curve {
            Curve::Line => total += (elem.p1 - elem.p0).magnitude(),
            Curve::ConvexArc => {
                let a = elem.p0 - elem.origin;
                let b = elem.p1 - elem.origin;
                let mut sweep = b.y.atan2(b.x) - a.y.atan2(a.x);
                if elem.ccw && sweep < 0. {
                    sweep += 2. * std::f32::consts::PI;
                }
                if !elem.ccw && sweep > 0. {
                    sweep -= 2. * std::f32::consts::PI;
                }
                total += sweep.abs() * clearance;
            }
            _ => {}
        }
        cursor = elem.p1;
    }

    total + (target - cursor).magnitude()
}

// length of the shortest path from `p` to `q` wrapping the circle
// (`center`, `radius`): two tangent legs plus the wrapped arc.
fn wrap_length(p: Coord, q: Coord, center: Coord, radius: f32) -> f32 {
    let dp = (p - center).magnitude();
    let dq = (q - center).magnitude();
    let tp = (dp * dp - radius * radius).sqrt();
    let tq = (dq * dq - radius * radius).sqrt();

    let up = (p - center).normalized();
    let uq = (q - center).normalized();
    let between = up.dot(uq).clamp(-1., 1.).acos();
    let wrap = between - (radius / dp).clamp(-1., 1.).acos() - (radius / dq).clamp(-1., 1.).acos();

    tp + tq + radius * wrap.max(0.)
}

/// Straight channel: the funnel emits nothing, the whole path is the
/// implicit source-to-target segment.
#[test]
fn straight_corridor_keeps_the_funnel_empty() {
    let mut origins = Vec::new();
    let mut walls_l = Vec::new();
    let mut walls_r = Vec::new();
    for i in 0..=10 {
        let x = i as f32 * 0.5;
        origins.push(coord! { x: x, y: 0. });
        walls_l.push(coord! { x: x, y: 1. });
        walls_r.push(coord! { x: x, y: -1. });
    }

    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, 0.25, 1e-3);
    let source = coord! { x: 0., y: 0. };
    let target = coord! { x: 5., y: 0. };

    let path = find_shortest_path(&corridor, source, target, 8);
    assert!(path.is_empty());

    let total = path_length(&path, source, target, corridor.clearance());
    assert_relative_eq!(total, 5., max_relative = 1e-3);
}

/// One obstacle corner in the way: segment, one clockwise arc, implicit
/// closing segment; length matches the tangent-wrap closed form.
#[test]
fn single_corner_detour_emits_segment_then_arc() {
    let corner = coord! { x: 0., y: 0. };
    let clearance = 0.5;

    let mut origins = Vec::new();
    let mut walls_l = Vec::new();
    let mut walls_r = Vec::new();
    for i in 0..=8 {
        let u = unit(170. - i as f32 * 20.);
        origins.push(u * 2.);
        walls_l.push(u * 4.);
        walls_r.push(corner);
    }

    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, clearance, 1e-3);
    let source = coord! { x: -3., y: 0.2 };
    let target = coord! { x: 3., y: 0.2 };

    let path = find_shortest_path(&corridor, source, target, 16);
    assert!(!path.is_empty());

    // first emitted element leaves the source.
    assert_eq!(path[0].curve, Curve::Line);
    assert!(path[0].p0.is_near(source, 1e-3));

    // exactly one arc, clockwise around the corner, at clearance radius.
    let arcs: Vec<&PathElement> = path.iter().filter(|e| e.curve == Curve::ConvexArc).collect();
    assert_eq!(arcs.len(), 1);
    let arc = arcs[0];
    assert!(!arc.ccw);
    assert!(arc.origin.is_near(corner, 1e-3));
    assert_relative_eq!((arc.p0 - corner).magnitude(), clearance, max_relative = 1e-2);
    assert_relative_eq!((arc.p1 - corner).magnitude(), clearance, max_relative = 1e-2);

    let total = path_length(&path, source, target, clearance);
    let expected = wrap_length(source, target, corner, clearance);
    assert_relative_eq!(total, expected, max_relative = 0.01);
}

/// Reversing the corridor and swapping the endpoints yields the same path,
/// walked backwards.
#[test]
fn reversed_corridor_gives_the_reversed_path() {
    let corner = coord! { x: 0., y: 0. };
    let clearance = 0.5;

    let mut origins = Vec::new();
    let mut walls_l = Vec::new();
    let mut walls_r = Vec::new();
    for i in 0..=8 {
        let u = unit(170. - i as f32 * 20.);
        origins.push(u * 2.);
        walls_l.push(u * 4.);
        walls_r.push(corner);
    }
    let source = coord! { x: -3., y: 0.2 };
    let target = coord! { x: 3., y: 0.2 };

    let forward = {
        let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, clearance, 1e-3);
        find_shortest_path(&corridor, source, target, 16)
    };
    let backward = {
        // reversing the travel direction swaps left and right.
        let origins: Vec<Coord> = origins.iter().rev().copied().collect();
        let walls_l_rev: Vec<Coord> = walls_r.iter().rev().copied().collect();
        let walls_r_rev: Vec<Coord> = walls_l.iter().rev().copied().collect();
        let corridor = corridor_from_disks(&origins, &walls_l_rev, &walls_r_rev, clearance, 1e-3);
        find_shortest_path(&corridor, target, source, 16)
    };

    let total_f = path_length(&forward, source, target, clearance);
    let total_b = path_length(&backward, target, source, clearance);
    assert_relative_eq!(total_f, total_b, max_relative = 1e-3);

    // the backward run wraps the same corner with opposite winding.
    let arc_f = forward.iter().find(|e| e.curve == Curve::ConvexArc).unwrap();
    let arc_b = backward.iter().find(|e| e.curve == Curve::ConvexArc).unwrap();
    assert!(arc_f.origin.is_near(arc_b.origin, 1e-3));
    assert_ne!(arc_f.ccw, arc_b.ccw);
}

/// S-shaped weave between two obstacles: two arcs of opposite winding
/// joined by one segment.
#[test]
fn s_shape_emits_two_arcs_of_opposite_winding() {
    let a = coord! { x: -1., y: 0.3 };
    let b = coord! { x: 1., y: -0.3 };
    let clearance = 0.5;

    let mut origins = Vec::new();
    let mut walls_l = Vec::new();
    let mut walls_r = Vec::new();
    for i in 0..=16 {
        let x = -4. + i as f32 * 0.5;
        origins.push(coord! { x: x, y: 0. });
        walls_l.push(a);
        walls_r.push(b);
    }

    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, clearance, 1e-3);
    let source = coord! { x: -4., y: 0. };
    let target = coord! { x: 4., y: 0. };

    let path = find_shortest_path(&corridor, source, target, 16);

    let arcs: Vec<&PathElement> = path.iter().filter(|e| e.curve == Curve::ConvexArc).collect();
    assert_eq!(arcs.len(), 2);

    // first around the left obstacle (counter-clockwise), then around the
    // right one (clockwise).
    assert!(arcs[0].origin.is_near(a, 1e-3));
    assert!(arcs[0].ccw);
    assert!(arcs[1].origin.is_near(b, 1e-3));
    assert!(!arcs[1].ccw);

    // the two arcs are joined by exactly one segment.
    let between: Vec<&PathElement> = path
        .iter()
        .skip_while(|e| e.curve != Curve::ConvexArc)
        .skip(1)
        .take_while(|e| e.curve != Curve::ConvexArc)
        .collect();
    assert_eq!(between.len(), 1);
    assert_eq!(between[0].curve, Curve::Line);

    // every arc stays at clearance distance from its obstacle.
    for arc in arcs {
        assert_relative_eq!((arc.p0 - arc.origin).magnitude(), clearance, max_relative = 1e-2);
        assert_relative_eq!((arc.p1 - arc.origin).magnitude(), clearance, max_relative = 1e-2);
    }
}

/// A reflex disk (the contact site jumps between obstacles) participates as
/// its chord: the funnel neither panics nor emits reflex elements.
#[test]
fn reflex_disks_act_as_chords() {
    let origins = [
        coord! { x: 0., y: 0. },
        coord! { x: 1., y: 0. },
        coord! { x: 2., y: 0. },
        coord! { x: 3., y: 0. },
        coord! { x: 4., y: 0. },
    ];
    let walls_l = [
        coord! { x: 1., y: 1.2 },
        coord! { x: 1., y: 1.2 },
        coord! { x: 3., y: 1.2 },
        coord! { x: 3., y: 1.2 },
        coord! { x: 3., y: 1.2 },
    ];
    let walls_r = [
        coord! { x: 0., y: -1. },
        coord! { x: 1., y: -1. },
        coord! { x: 2., y: -1. },
        coord! { x: 3., y: -1. },
        coord! { x: 4., y: -1. },
    ];

    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, 0.5, 1e-3);

    // the contact jump at disk 2 classifies as a reflex arc.
    assert_eq!(corridor.left_border_curve(2), Curve::ReflexArc);

    let source = coord! { x: 0., y: 0. };
    let target = coord! { x: 4., y: 0. };
    let path = find_shortest_path(&corridor, source, target, 8);

    assert!(path.iter().all(|e| e.curve != Curve::ReflexArc));
    let total = path_length(&path, source, target, corridor.clearance());
    assert_relative_eq!(total, 4., max_relative = 1e-2);
}

/// Point-agent funnel: a single interior portal corner bends the polyline.
#[test]
fn point_funnel_bends_at_portal_corners() {
    let origins = [
        coord! { x: 0., y: 0. },
        coord! { x: 2., y: 3. },
        coord! { x: 4., y: 0. },
    ];
    let walls_l = [
        coord! { x: 0., y: 2. },
        coord! { x: 2., y: 5. },
        coord! { x: 4., y: 2. },
    ];
    let walls_r = [
        coord! { x: 0., y: -2. },
        coord! { x: 2., y: 1. },
        coord! { x: 4., y: -2. },
    ];

    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, 0.5, 1e-3);
    let source = coord! { x: 0., y: 0. };
    let target = coord! { x: 4., y: 0. };

    let path = find_shortest_path_points(&corridor, source, target, 8);

    // the right border of the middle disk forces the bend.
    let bend = corridor.border_r(1);
    assert!(path.len() >= 3);
    assert_eq!(path[0], source);
    assert!(path[1].is_near(bend, 1e-4));
    assert_eq!(*path.last().unwrap(), target);
}

/// Point-agent funnel over a wide corridor degenerates to the straight
/// segment.
#[test]
fn point_funnel_straight_when_unobstructed() {
    let origins = [
        coord! { x: 0., y: 0. },
        coord! { x: 2., y: 0. },
        coord! { x: 4., y: 0. },
    ];
    let walls_l = [
        coord! { x: 0., y: 3. },
        coord! { x: 2., y: 3. },
        coord! { x: 4., y: 3. },
    ];
    let walls_r = [
        coord! { x: 0., y: -3. },
        coord! { x: 2., y: -3. },
        coord! { x: 4., y: -3. },
    ];

    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, 0.5, 1e-3);
    let source = coord! { x: 0., y: 0. };
    let target = coord! { x: 4., y: 0. };

    let path = find_shortest_path_points(&corridor, source, target, 8);
    assert_eq!(path[0], source);
    assert_eq!(*path.last().unwrap(), target);

    let length: f32 = path.windows(2).map(|w| (w[1] - w[0]).magnitude()).sum();
    assert_relative_eq!(length, 4., max_relative = 1e-4);
}

/// The element budget truncates the output instead of overflowing.
#[test]
fn path_respects_the_element_budget() {
    let corner = coord! { x: 0., y: 0. };
    let mut origins = Vec::new();
    let mut walls_l = Vec::new();
    let mut walls_r = Vec::new();
    for i in 0..=8 {
        let u = unit(170. - i as f32 * 20.);
        origins.push(u * 2.);
        walls_l.push(u * 4.);
        walls_r.push(corner);
    }
    let corridor = corridor_from_disks(&origins, &walls_l, &walls_r, 0.5, 1e-3);

    let path = find_shortest_path(
        &corridor,
        coord! { x: -3., y: 0.2 },
        coord! { x: 3., y: 0.2 },
        1,
    );
    assert!(path.len() <= 1);
}
