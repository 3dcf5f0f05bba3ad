//! The annotated half-edge mesh describing walkable space.
//!
//! Vertices, edges and events live in fixed-capacity arenas addressed by
//! stable `u32` indices — records never move once created, and every
//! cross-reference is an index rather than a pointer. The two half-edges of
//! edge `k` sit at indices `2k` and `2k + 1`, which makes
//! [`HalfEdgeId::opposite`] a single XOR with no stored link.
//!
//! Two ring structures share the arenas:
//!
//! - every vertex owns a circular list of outgoing half-edges, kept sorted
//!   counter-clockwise by target direction;
//! - every edge threads its events through two singly-linked lists over the
//!   same records (`next[0]` and `next[1]`), appended in direction 0 and
//!   prepended in direction 1, so iterating from either half-edge yields
//!   events in that direction's traversal order.

use corridormap_types::Coord;

use crate::build::{BuildError, Pool};

/// A vertex can touch at most this many obstacles (its classifying 2×2
/// pixel block has four samples).
pub const MAX_VERTEX_SIDES: usize = 4;

const NULL: u32 = u32::MAX;

/// Index of a vertex record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VertexId(pub(crate) u32);

/// Index of an edge record (a pair of half-edges).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EdgeId(pub(crate) u32);

/// Index of a directed half-edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HalfEdgeId(pub(crate) u32);

/// Index of an event record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EventId(pub(crate) u32);

impl VertexId {
    /// Dense index of the record, stable for the lifetime of the space.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EventId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl HalfEdgeId {
    /// The half-edge running the other way along the same edge.
    #[inline]
    pub fn opposite(self) -> HalfEdgeId {
        HalfEdgeId(self.0 ^ 1)
    }

    /// The owning edge.
    #[inline]
    pub fn edge(self) -> EdgeId {
        EdgeId(self.0 >> 1)
    }

    /// Direction bit: 0 for the even half-edge, 1 for its opposite.
    #[inline]
    pub fn direction(self) -> usize {
        (self.0 & 1) as usize
    }
}

impl EdgeId {
    /// The half-edge of this edge with the given direction bit.
    #[inline]
    pub fn half_edge(self, direction: usize) -> HalfEdgeId {
        debug_assert!(direction < 2);
        HalfEdgeId(self.0 * 2 + direction as u32)
    }
}

#[derive(Clone, Copy, Debug)]
struct VertexRec {
    pos: Coord,
    half_edge: u32,
    num_sides: usize,
    side_obstacles: [u32; MAX_VERTEX_SIDES],
    side_contacts: [Coord; MAX_VERTEX_SIDES],
}

#[derive(Clone, Copy, Debug)]
struct HalfEdgeRec {
    target: u32,
    next: u32,
    event: u32,
}

#[derive(Clone, Copy, Debug)]
struct EdgeRec {
    dirs: [HalfEdgeRec; 2],
    // closest obstacle ids (left, right) relative to direction 0.
    obstacles: [u32; 2],
}

#[derive(Clone, Copy, Debug)]
struct EventRec {
    pos: Coord,
    next: [u32; 2],
    // contact points (left, right) relative to direction 0.
    sides: [Coord; 2],
}

/// The walkable-space mesh: the Explicit Corridor Map of one footprint.
#[derive(Debug)]
pub struct WalkableSpace {
    vertices: Vec<VertexRec>,
    edges: Vec<EdgeRec>,
    events: Vec<EventRec>,
    max_vertices: usize,
    max_edges: usize,
    max_events: usize,
}

// exact orientation: ties in the CCW ring must order identically no matter
// which side of the comparison a target lands on.
fn is_ccw(u: Coord, v1: Coord, v2: Coord) -> bool {
    let p = |c: Coord| robust::Coord {
        x: c.x as f64,
        y: c.y as f64,
    };
    robust::orient2d(p(u), p(v1), p(v2)) > 0.
}

impl WalkableSpace {
    /// Allocates empty arenas. The capacities are hard limits: running out
    /// during construction is reported as a build failure naming the pool.
    pub fn with_capacity(max_vertices: usize, max_edges: usize, max_events: usize) -> Self {
        WalkableSpace {
            vertices: Vec::with_capacity(max_vertices),
            edges: Vec::with_capacity(max_edges),
            events: Vec::with_capacity(max_events),
            max_vertices,
            max_edges,
            max_events,
        }
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    pub fn half_edges(&self) -> impl Iterator<Item = HalfEdgeId> {
        (0..self.edges.len() as u32 * 2).map(HalfEdgeId)
    }

    /// Creates an isolated vertex.
    pub(crate) fn create_vertex(&mut self, pos: Coord) -> Result<VertexId, BuildError> {
        if self.vertices.len() >= self.max_vertices {
            return Err(BuildError::PoolExhausted(Pool::Vertices));
        }
        self.vertices.push(VertexRec {
            pos,
            half_edge: NULL,
            num_sides: 0,
            side_obstacles: [NULL; MAX_VERTEX_SIDES],
            side_contacts: [Coord::zero(); MAX_VERTEX_SIDES],
        });
        Ok(VertexId(self.vertices.len() as u32 - 1))
    }

    /// Records the contact point of `vertex` on `obstacle`. Duplicate
    /// obstacles are ignored; so are sides past [`MAX_VERTEX_SIDES`].
    pub(crate) fn add_vertex_side(&mut self, vertex: VertexId, obstacle: u32, contact: Coord) {
        let rec = &mut self.vertices[vertex.0 as usize];
        if rec.side_obstacles[..rec.num_sides].contains(&obstacle) {
            return;
        }
        if rec.num_sides == MAX_VERTEX_SIDES {
            return;
        }
        rec.side_obstacles[rec.num_sides] = obstacle;
        rec.side_contacts[rec.num_sides] = contact;
        rec.num_sides += 1;
    }

    /// Creates an edge between `u` and `v` and splices both half-edges into
    /// their source rings in CCW position. `obstacles` is the (left, right)
    /// obstacle pair seen travelling from `u` to `v`.
    pub(crate) fn create_edge(
        &mut self,
        u: VertexId,
        v: VertexId,
        obstacles: [u32; 2],
    ) -> Result<EdgeId, BuildError> {
        if self.edges.len() >= self.max_edges {
            return Err(BuildError::PoolExhausted(Pool::Edges));
        }

        let rec = EdgeRec {
            dirs: [
                HalfEdgeRec {
                    target: v.0,
                    next: NULL,
                    event: NULL,
                },
                HalfEdgeRec {
                    target: u.0,
                    next: NULL,
                    event: NULL,
                },
            ],
            obstacles,
        };
        self.edges.push(rec);
        let edge = EdgeId(self.edges.len() as u32 - 1);

        self.add_half_edge(u.0, edge.half_edge(0).0);
        self.add_half_edge(v.0, edge.half_edge(1).0);
        Ok(edge)
    }

    /// Creates an event and threads it onto `edge`: appended to the
    /// direction-0 list, prepended to the direction-1 list. Call in
    /// direction-0 traversal order. `sides` is (left, right) for
    /// direction 0.
    pub(crate) fn create_event(
        &mut self,
        pos: Coord,
        sides: [Coord; 2],
        edge: EdgeId,
    ) -> Result<EventId, BuildError> {
        if self.events.len() >= self.max_events {
            return Err(BuildError::PoolExhausted(Pool::Events));
        }
        self.events.push(EventRec {
            pos,
            next: [NULL; 2],
            sides,
        });
        let event = EventId(self.events.len() as u32 - 1);

        self.append_event(edge.half_edge(0).0, event.0);
        self.prepend_event(edge.half_edge(1).0, event.0);
        Ok(event)
    }

    #[inline]
    fn half_edge_rec(&self, h: u32) -> &HalfEdgeRec {
        &self.edges[(h >> 1) as usize].dirs[(h & 1) as usize]
    }

    #[inline]
    fn half_edge_rec_mut(&mut self, h: u32) -> &mut HalfEdgeRec {
        &mut self.edges[(h >> 1) as usize].dirs[(h & 1) as usize]
    }

    fn add_half_edge(&mut self, vert: u32, h: u32) {
        let head = self.vertices[vert as usize].half_edge;

        if head == NULL {
            self.vertices[vert as usize].half_edge = h;
            self.half_edge_rec_mut(h).next = h;
            return;
        }

        let u = self.vertices[vert as usize].pos;
        let v2 = self.vertices[self.half_edge_rec(h).target as usize].pos;

        // walk the ring while the existing targets stay CCW-before the new
        // one; the new half-edge splices in right after the last of those.
        let mut insert_after = NULL;
        let mut curr = head;
        loop {
            let curr_rec = *self.half_edge_rec(curr);
            let v1 = self.vertices[curr_rec.target as usize].pos;

            if !is_ccw(u, v1, v2) {
                break;
            }

            insert_after = curr;
            curr = curr_rec.next;
            if curr == head {
                break;
            }
        }

        if insert_after == NULL {
            // new ring head: find the tail so the circle stays closed.
            let mut tail = head;
            while self.half_edge_rec(tail).next != head {
                tail = self.half_edge_rec(tail).next;
            }
            self.vertices[vert as usize].half_edge = h;
            self.half_edge_rec_mut(h).next = head;
            self.half_edge_rec_mut(tail).next = h;
        } else {
            let next = self.half_edge_rec(insert_after).next;
            self.half_edge_rec_mut(insert_after).next = h;
            self.half_edge_rec_mut(h).next = next;
        }
    }

    fn append_event(&mut self, h: u32, evt: u32) {
        let dir = (h & 1) as usize;
        let head = self.half_edge_rec(h).event;

        if head == NULL {
            self.half_edge_rec_mut(h).event = evt;
            self.events[evt as usize].next[dir] = NULL;
            return;
        }

        let mut tail = head;
        while self.events[tail as usize].next[dir] != NULL {
            tail = self.events[tail as usize].next[dir];
        }
        self.events[tail as usize].next[dir] = evt;
        self.events[evt as usize].next[dir] = NULL;
    }

    fn prepend_event(&mut self, h: u32, evt: u32) {
        let dir = (h & 1) as usize;
        let head = self.half_edge_rec(h).event;
        self.events[evt as usize].next[dir] = head;
        self.half_edge_rec_mut(h).event = evt;
    }

    /// Vertex position.
    #[inline]
    pub fn vertex_pos(&self, v: VertexId) -> Coord {
        self.vertices[v.0 as usize].pos
    }

    /// One outgoing half-edge of `v`, or `None` for an isolated vertex.
    #[inline]
    pub fn vertex_half_edge(&self, v: VertexId) -> Option<HalfEdgeId> {
        let h = self.vertices[v.0 as usize].half_edge;
        (h != NULL).then_some(HalfEdgeId(h))
    }

    /// Number of edges incident to `v`.
    pub fn degree(&self, v: VertexId) -> usize {
        let Some(first) = self.vertex_half_edge(v) else {
            return 0;
        };
        let mut count = 1;
        let mut curr = self.next(first);
        while curr != first {
            count += 1;
            curr = self.next(curr);
        }
        count
    }

    /// Target vertex of `h`.
    #[inline]
    pub fn target(&self, h: HalfEdgeId) -> VertexId {
        VertexId(self.half_edge_rec(h.0).target)
    }

    /// Source vertex of `h` (the target of its opposite).
    #[inline]
    pub fn source(&self, h: HalfEdgeId) -> VertexId {
        self.target(h.opposite())
    }

    /// Next outgoing half-edge in CCW order around the source of `h`.
    #[inline]
    pub fn next(&self, h: HalfEdgeId) -> HalfEdgeId {
        HalfEdgeId(self.half_edge_rec(h.0).next)
    }

    /// First event met when travelling along `h`.
    #[inline]
    pub fn first_event(&self, h: HalfEdgeId) -> Option<EventId> {
        let e = self.half_edge_rec(h.0).event;
        (e != NULL).then_some(EventId(e))
    }

    /// Event after `e` along `h`.
    #[inline]
    pub fn next_event(&self, h: HalfEdgeId, e: EventId) -> Option<EventId> {
        let n = self.events[e.0 as usize].next[h.direction()];
        (n != NULL).then_some(EventId(n))
    }

    /// Iterates the events of `h` in traversal order.
    pub fn events(&self, h: HalfEdgeId) -> impl Iterator<Item = EventId> + '_ {
        let mut curr = self.first_event(h);
        std::iter::from_fn(move || {
            let e = curr?;
            curr = self.next_event(h, e);
            Some(e)
        })
    }

    /// Number of events threaded on `h`.
    #[inline]
    pub fn num_edge_events(&self, h: HalfEdgeId) -> usize {
        self.events(h).count()
    }

    /// Event position.
    #[inline]
    pub fn event_pos(&self, e: EventId) -> Coord {
        self.events[e.0 as usize].pos
    }

    /// Contact point on the left of the event, travelling along `h`.
    #[inline]
    pub fn event_left_side(&self, h: HalfEdgeId, e: EventId) -> Coord {
        self.events[e.0 as usize].sides[h.direction()]
    }

    /// Contact point on the right of the event, travelling along `h`.
    #[inline]
    pub fn event_right_side(&self, h: HalfEdgeId, e: EventId) -> Coord {
        self.events[e.0 as usize].sides[1 - h.direction()]
    }

    /// Obstacle id on the left when travelling along `h`.
    #[inline]
    pub fn left_obstacle(&self, h: HalfEdgeId) -> u32 {
        self.edges[h.edge().0 as usize].obstacles[h.direction()]
    }

    /// Obstacle id on the right when travelling along `h`.
    #[inline]
    pub fn right_obstacle(&self, h: HalfEdgeId) -> u32 {
        self.edges[h.edge().0 as usize].obstacles[1 - h.direction()]
    }

    /// Contact point of `v` on the given obstacle, if recorded.
    pub fn vertex_side(&self, v: VertexId, obstacle: u32) -> Option<Coord> {
        let rec = &self.vertices[v.0 as usize];
        rec.side_obstacles[..rec.num_sides]
            .iter()
            .position(|&o| o == obstacle)
            .map(|i| rec.side_contacts[i])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use corridormap_types::coord;

    fn space() -> WalkableSpace {
        WalkableSpace::with_capacity(16, 16, 16)
    }

    #[test]
    fn opposite_is_an_involution() {
        let h = HalfEdgeId(6);
        assert_eq!(h.opposite().opposite(), h);
        assert_eq!(h.edge(), h.opposite().edge());
        assert_ne!(h.direction(), h.opposite().direction());
    }

    #[test]
    fn edge_connects_sources_and_targets() {
        let mut s = space();
        let u = s.create_vertex(coord! { x: 0., y: 0. }).unwrap();
        let v = s.create_vertex(coord! { x: 1., y: 0. }).unwrap();
        let e = s.create_edge(u, v, [7, 9]).unwrap();

        let h0 = e.half_edge(0);
        let h1 = e.half_edge(1);
        assert_eq!(s.source(h0), u);
        assert_eq!(s.target(h0), v);
        assert_eq!(s.source(h1), v);
        assert_eq!(s.target(h1), u);
        assert_eq!(h0.opposite(), h1);

        // the obstacle pair flips with direction.
        assert_eq!(s.left_obstacle(h0), 7);
        assert_eq!(s.right_obstacle(h0), 9);
        assert_eq!(s.left_obstacle(h1), 9);
        assert_eq!(s.right_obstacle(h1), 7);
    }

    #[test]
    fn ring_is_ccw_sorted_regardless_of_insertion_order() {
        let mut s = space();
        let c = s.create_vertex(coord! { x: 0., y: 0. }).unwrap();

        // spokes at 0, 90, 180, 225 degrees inserted out of order.
        let east = s.create_vertex(coord! { x: 1., y: 0. }).unwrap();
        let north = s.create_vertex(coord! { x: 0., y: 1. }).unwrap();
        let west = s.create_vertex(coord! { x: -1., y: 0. }).unwrap();
        let south_west = s.create_vertex(coord! { x: -1., y: -1. }).unwrap();

        for other in [west, east, south_west, north] {
            s.create_edge(c, other, [0, 0]).unwrap();
        }

        assert_eq!(s.degree(c), 4);

        // collect one full ring walk and check pairwise CCW angles.
        let first = s.vertex_half_edge(c).unwrap();
        let mut ring = vec![first];
        let mut curr = s.next(first);
        while curr != first {
            ring.push(curr);
            curr = s.next(curr);
        }
        assert_eq!(ring.len(), 4);

        let angle = |h: HalfEdgeId| {
            let d = s.vertex_pos(s.target(h)) - s.vertex_pos(c);
            d.y.atan2(d.x)
        };
        let mut angles: Vec<f32> = ring.iter().map(|&h| angle(h)).collect();
        // rotate so the smallest angle comes first, then the walk must be
        // strictly increasing.
        let min_idx = angles
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        angles.rotate_left(min_idx);
        for w in angles.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn ring_closes_in_degree_steps() {
        let mut s = space();
        let c = s.create_vertex(coord! { x: 0., y: 0. }).unwrap();
        for i in 0..5 {
            let angle = i as f32;
            let v = s
                .create_vertex(coord! { x: angle.cos(), y: angle.sin() })
                .unwrap();
            s.create_edge(c, v, [0, 0]).unwrap();
        }

        let first = s.vertex_half_edge(c).unwrap();
        let mut curr = first;
        for _ in 0..s.degree(c) {
            assert_eq!(s.source(curr), c);
            curr = s.next(curr);
        }
        assert_eq!(curr, first);
    }

    #[test]
    fn events_iterate_in_traversal_order_both_ways() {
        let mut s = space();
        let u = s.create_vertex(coord! { x: 0., y: 0. }).unwrap();
        let v = s.create_vertex(coord! { x: 4., y: 0. }).unwrap();
        let e = s.create_edge(u, v, [1, 2]).unwrap();

        for x in [1., 2., 3.] {
            s.create_event(
                coord! { x: x, y: 0. },
                [coord! { x: x, y: 1. }, coord! { x: x, y: -1. }],
                e,
            )
            .unwrap();
        }

        let forward: Vec<f32> = s
            .events(e.half_edge(0))
            .map(|ev| s.event_pos(ev).x)
            .collect();
        assert_eq!(forward, vec![1., 2., 3.]);

        let backward: Vec<f32> = s
            .events(e.half_edge(1))
            .map(|ev| s.event_pos(ev).x)
            .collect();
        assert_eq!(backward, vec![3., 2., 1.]);

        // left when going forward is right when going backward.
        let ev = s.first_event(e.half_edge(0)).unwrap();
        assert_eq!(s.event_left_side(e.half_edge(0), ev).y, 1.);
        assert_eq!(s.event_right_side(e.half_edge(0), ev).y, -1.);
        assert_eq!(s.event_left_side(e.half_edge(1), ev).y, -1.);
        assert_eq!(s.event_right_side(e.half_edge(1), ev).y, 1.);
    }

    #[test]
    fn vertex_sides_deduplicate_by_obstacle() {
        let mut s = space();
        let v = s.create_vertex(coord! { x: 0., y: 0. }).unwrap();
        s.add_vertex_side(v, 3, coord! { x: 1., y: 0. });
        s.add_vertex_side(v, 3, coord! { x: 9., y: 9. });
        s.add_vertex_side(v, 5, coord! { x: 0., y: 1. });

        assert_eq!(s.vertex_side(v, 3), Some(coord! { x: 1., y: 0. }));
        assert_eq!(s.vertex_side(v, 5), Some(coord! { x: 0., y: 1. }));
        assert_eq!(s.vertex_side(v, 8), None);
    }

    #[test]
    fn pools_report_exhaustion() {
        let mut s = WalkableSpace::with_capacity(1, 0, 0);
        s.create_vertex(coord! { x: 0., y: 0. }).unwrap();
        assert!(matches!(
            s.create_vertex(coord! { x: 1., y: 0. }),
            Err(BuildError::PoolExhausted(Pool::Vertices))
        ));
    }
}
