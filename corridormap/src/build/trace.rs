//! Edge tracing: from classified pixels to the half-edge mesh.
//!
//! Adjacent Voronoi vertex pixels form one *cluster* per actual Voronoi
//! vertex; each cluster becomes a mesh vertex. The chains of edge pixels
//! connecting clusters become edges: a breadth-first search over the edge
//! grid is seeded at the edge pixels around a cluster and propagates until
//! a chain runs into a pixel of another cluster, at which point one edge
//! record connects the two. Chains are recovered by backtracking BFS
//! parents, and events are emitted where the closest-feature assignment of
//! either side changes along a chain.

use std::collections::HashSet;
use std::collections::VecDeque;

use corridormap_types::{Coord, Footprint, Rect};

use crate::build::csr::CsrGrid;
use crate::build::features::VoronoiFeatures;
use crate::build::normals::{closest_obstacle_point, EdgeNormalIndices};
use crate::build::{pixel_to_scene, BuildError};
use crate::space::{VertexId, WalkableSpace};

const NO_VERTEX: u32 = u32::MAX;
const NO_PARENT: u32 = u32::MAX;
const NO_CLUSTER: u32 = u32::MAX;

struct Tracer<'a> {
    footprint: &'a Footprint,
    scene: Rect,
    features: &'a VoronoiFeatures,
    normal_indices: &'a EdgeNormalIndices,
    vertex_grid: &'a CsrGrid,
    edge_grid: &'a CsrGrid,

    space: WalkableSpace,
    // vertex-pixel dense index -> cluster.
    cluster_of: Vec<u32>,
    // cluster -> member pixel linear indices.
    clusters: Vec<Vec<usize>>,
    // cluster -> mesh vertex, created when its first edge is traced.
    vertex_ids: Vec<u32>,
    discovered_cluster: Vec<bool>,
    discovered_edge: Vec<bool>,
    // edge-pixel dense index -> linear index of its BFS predecessor.
    parent: Vec<u32>,
    queue_cluster: VecDeque<u32>,
    queue_edge: VecDeque<usize>,
    // unordered cluster pairs with an edge record already; a chain of one
    // pixel is reachable from both of its endpoints and would otherwise be
    // traced twice.
    edge_pairs: HashSet<(u32, u32)>,
    chain: Vec<usize>,
}

/// Traces the feature grids into a [`WalkableSpace`].
///
/// The compacted feature arrays are ascending, so the dense index of a
/// pixel in its CSR grid equals its position in the corresponding feature
/// array; the tracer leans on that to find per-pixel obstacle annotations.
pub fn trace_diagram(
    footprint: &Footprint,
    scene: Rect,
    features: &VoronoiFeatures,
    normal_indices: &EdgeNormalIndices,
    vertex_grid: &CsrGrid,
    edge_grid: &CsrGrid,
) -> Result<WalkableSpace, BuildError> {
    let num_vert_pixels = vertex_grid.num_nz();
    let num_edge_pixels = edge_grid.num_nz();

    let (cluster_of, clusters) = find_clusters(features.verts(), vertex_grid);

    // conservative pool bounds: every cluster meets at most one chain per
    // boundary pixel side, and a chain emits at most one event per pixel.
    let max_vertices = clusters.len();
    let max_edges = 2 * num_vert_pixels;
    let max_events = num_edge_pixels;

    let mut tracer = Tracer {
        footprint,
        scene,
        features,
        normal_indices,
        vertex_grid,
        edge_grid,
        space: WalkableSpace::with_capacity(max_vertices, max_edges, max_events),
        vertex_ids: vec![NO_VERTEX; clusters.len()],
        discovered_cluster: vec![false; clusters.len()],
        cluster_of,
        clusters,
        discovered_edge: vec![false; num_edge_pixels],
        parent: vec![NO_PARENT; num_edge_pixels],
        queue_cluster: VecDeque::new(),
        queue_edge: VecDeque::new(),
        edge_pairs: HashSet::new(),
        chain: Vec::new(),
    };

    for cluster in 0..tracer.clusters.len() as u32 {
        if tracer.discovered_cluster[cluster as usize] {
            continue;
        }
        tracer.discovered_cluster[cluster as usize] = true;
        tracer.queue_cluster.push_back(cluster);

        while let Some(next) = tracer.queue_cluster.pop_front() {
            tracer.trace_from_cluster(next)?;
        }
    }

    debug!(
        "traced diagram: {} vertices, {} edges, {} events",
        tracer.space.num_vertices(),
        tracer.space.num_edges(),
        tracer.space.num_events()
    );

    Ok(tracer.space)
}

// groups 4-connected vertex pixels; each group is one Voronoi vertex.
fn find_clusters(verts: &[u32], vertex_grid: &CsrGrid) -> (Vec<u32>, Vec<Vec<usize>>) {
    let num_vert_pixels = vertex_grid.num_nz();
    let mut cluster_of = vec![NO_CLUSTER; num_vert_pixels];
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut stack = Vec::new();

    for (nz, &linear) in verts.iter().enumerate() {
        if cluster_of[nz] != NO_CLUSTER {
            continue;
        }

        let cluster = clusters.len() as u32;
        clusters.push(Vec::new());
        cluster_of[nz] = cluster;
        stack.push(linear as usize);

        while let Some(pixel) = stack.pop() {
            clusters[cluster as usize].push(pixel);
            for (row, col, nei_nz) in vertex_grid.cell_neis_linear(pixel).iter() {
                if cluster_of[nei_nz] == NO_CLUSTER {
                    cluster_of[nei_nz] = cluster;
                    stack.push(row * vertex_grid.num_cols() + col);
                }
            }
        }
    }

    (cluster_of, clusters)
}

impl<'a> Tracer<'a> {
    fn pixel_pos(&self, linear: usize) -> Coord {
        let cols = self.edge_grid.num_cols();
        pixel_to_scene(
            self.scene,
            cols,
            self.edge_grid.num_rows(),
            linear % cols,
            linear / cols,
        )
    }

    // centre of the cluster's pixel positions.
    fn cluster_pos(&self, cluster: u32) -> Coord {
        let pixels = &self.clusters[cluster as usize];
        let mut sum = Coord::zero();
        for &pixel in pixels {
            sum = sum + self.pixel_pos(pixel);
        }
        sum / pixels.len() as f32
    }

    /// Mesh vertex for a cluster, created on first use with one contact
    /// side per distinct obstacle in its member pixels' 2×2 blocks.
    fn vertex_for_cluster(&mut self, cluster: u32) -> Result<VertexId, BuildError> {
        if self.vertex_ids[cluster as usize] != NO_VERTEX {
            return Ok(VertexId(self.vertex_ids[cluster as usize]));
        }

        let pos = self.cluster_pos(cluster);
        let vertex = self.space.create_vertex(pos)?;
        self.vertex_ids[cluster as usize] = vertex.0;

        for i in 0..self.clusters[cluster as usize].len() {
            let pixel = self.clusters[cluster as usize][i];
            let nz = self
                .vertex_grid
                .nz_linear(pixel)
                .expect("cluster pixel is marked");
            for obstacle in self.features.vert_obstacle_ids(nz) {
                let contact = closest_obstacle_point(self.footprint, self.scene, obstacle, pos);
                self.space.add_vertex_side(vertex, obstacle, contact);
            }
        }

        Ok(vertex)
    }

    /// Closest-feature signature of an edge pixel, orientation-free: the
    /// obstacle pair of a chain is fixed, but the classifier's left/right
    /// naming is not part of what makes two pixels equivalent.
    fn side_signature(&self, edge_nz: usize) -> ((u32, usize), (u32, usize)) {
        let a = (
            self.features.edge_obstacle_left(edge_nz),
            self.normal_indices.left[edge_nz],
        );
        let b = (
            self.features.edge_obstacle_right(edge_nz),
            self.normal_indices.right[edge_nz],
        );
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn trace_from_cluster(&mut self, cluster: u32) -> Result<(), BuildError> {
        self.queue_edge.clear();
        // clusters already connected to during this trace.
        let mut seen: Vec<u32> = Vec::new();

        // seed with every edge pixel around the cluster, discovered or not:
        // a pixel that stopped an earlier chain next to this cluster is also
        // the first pixel of the chains leaving it, and propagation must be
        // able to continue from there.
        for i in 0..self.clusters[cluster as usize].len() {
            let pixel = self.clusters[cluster as usize][i];
            for (row, col, nz) in self.edge_grid.cell_neis_linear(pixel).iter() {
                self.discovered_edge[nz] = true;
                self.parent[nz] = NO_PARENT;
                self.queue_edge
                    .push_back(row * self.edge_grid.num_cols() + col);
            }
        }

        while let Some(pixel) = self.queue_edge.pop_front() {
            let mut stopped = false;

            for (_, _, vert_nz) in self.vertex_grid.cell_neis_linear(pixel).iter() {
                let other = self.cluster_of[vert_nz];
                if other == cluster {
                    continue;
                }
                stopped = true;

                if !self.discovered_cluster[other as usize] {
                    self.discovered_cluster[other as usize] = true;
                    self.queue_cluster.push_back(other);
                }

                if seen.contains(&other) {
                    continue;
                }
                seen.push(other);

                let key = (cluster.min(other), cluster.max(other));
                if !self.edge_pairs.insert(key) {
                    continue;
                }

                self.build_edge(cluster, other, pixel)?;
            }

            if stopped {
                continue;
            }

            for (row, col, nz) in self.edge_grid.cell_neis_linear(pixel).iter() {
                if !self.discovered_edge[nz] {
                    self.discovered_edge[nz] = true;
                    self.parent[nz] = pixel as u32;
                    self.queue_edge
                        .push_back(row * self.edge_grid.num_cols() + col);
                }
            }
        }

        Ok(())
    }

    fn build_edge(&mut self, from: u32, to: u32, stop_pixel: usize) -> Result<(), BuildError> {
        // recover the chain in from -> to order from the BFS parents.
        self.chain.clear();
        let mut curr = stop_pixel;
        loop {
            self.chain.push(curr);
            let nz = self
                .edge_grid
                .nz_linear(curr)
                .expect("chain pixel is marked");
            if self.parent[nz] == NO_PARENT {
                break;
            }
            curr = self.parent[nz] as usize;
        }
        self.chain.reverse();

        let u = self.vertex_for_cluster(from)?;
        let v = self.vertex_for_cluster(to)?;
        let u_pos = self.space.vertex_pos(u);
        let v_pos = self.space.vertex_pos(v);

        // orient the classifier's obstacle pair to the u -> v direction.
        let first_nz = self
            .edge_grid
            .nz_linear(self.chain[0])
            .expect("chain pixel is marked");
        let side_a = self.features.edge_obstacle_left(first_nz);
        let side_b = self.features.edge_obstacle_right(first_nz);

        let direction = v_pos - u_pos;
        let contact_a = closest_obstacle_point(
            self.footprint,
            self.scene,
            side_a,
            self.pixel_pos(self.chain[0]),
        );
        let (left, right) = if direction.wedge(contact_a - u_pos) >= 0. {
            (side_a, side_b)
        } else {
            (side_b, side_a)
        };

        let edge = self.space.create_edge(u, v, [left, right])?;
        trace!(
            "edge {:?} -> {:?} between obstacles {} | {}",
            u_pos,
            v_pos,
            left,
            right
        );

        // the endpoints need contact sides for this edge's obstacles even
        // when their own 2x2 blocks sampled other obstacles of the cluster.
        for (vertex, pos) in [(u, u_pos), (v, v_pos)] {
            for obstacle in [left, right] {
                let contact = closest_obstacle_point(self.footprint, self.scene, obstacle, pos);
                self.space.add_vertex_side(vertex, obstacle, contact);
            }
        }

        // events bracket every change of the closest-feature signature: one
        // on the last pixel of the old run and one on the first pixel of the
        // new run. a border wrapping an obstacle corner then has two
        // consecutive disks with the corner as a stationary contact, which
        // is what identifies the wrap as a convex arc downstream.
        let chain = std::mem::take(&mut self.chain);
        let mut prev_signature = self.side_signature(first_nz);
        let mut last_emitted = usize::MAX;
        for k in 1..chain.len() {
            let nz = self
                .edge_grid
                .nz_linear(chain[k])
                .expect("chain pixel is marked");
            let signature = self.side_signature(nz);
            if signature == prev_signature {
                continue;
            }
            prev_signature = signature;

            if last_emitted != chain[k - 1] {
                self.emit_event(chain[k - 1], left, right, edge)?;
            }
            self.emit_event(chain[k], left, right, edge)?;
            last_emitted = chain[k];
        }
        self.chain = chain;

        Ok(())
    }

    fn emit_event(
        &mut self,
        pixel: usize,
        left: u32,
        right: u32,
        edge: crate::space::EdgeId,
    ) -> Result<(), BuildError> {
        let pos = self.pixel_pos(pixel);
        let left_contact = closest_obstacle_point(self.footprint, self.scene, left, pos);
        let right_contact = closest_obstacle_point(self.footprint, self.scene, right, pos);
        self.space
            .create_event(pos, [left_contact, right_contact], edge)?;
        Ok(())
    }
}
