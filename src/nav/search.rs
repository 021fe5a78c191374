//! Face-graph shortest path search

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;

use super::mesh::{FaceId, NavMesh};
use crate::core::{DistanceMetric, NavError};

/// Per-face search state, reset for every query
#[derive(Debug, Clone, Copy)]
pub struct SearchNode {
    /// Tentative distance from the start face
    pub dist: f32,
    /// Face the best route arrived from
    pub prev: Option<FaceId>,
    /// Point where the best route entered this face (edge-midpoint metric)
    pub position: Option<Vec2>,
    /// Settled
    pub closed: bool,
}

impl SearchNode {
    const UNVISITED: Self = Self {
        dist: f32::INFINITY,
        prev: None,
        position: None,
        closed: false,
    };
}

/// Open list entry
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    face: FaceId,
    dist: f32,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.face == other.face && self.dist == other.dist
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.face.cmp(&self.face))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of a face search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// The goal face was reached
    pub reached: bool,
    /// Face the corridor ends in: the goal face, or the reachable face
    /// closest to the goal
    pub end_face: FaceId,
}

/// Reusable scratch buffers for face searches
///
/// One scratch per caller; queries through the same scratch must not overlap.
#[derive(Debug, Default)]
pub struct SearchScratch {
    nodes: Vec<SearchNode>,
    open: BinaryHeap<OpenNode>,
    corridor: Vec<FaceId>,
}

impl SearchScratch {
    /// Scratch sized for a mesh with `face_count` faces
    pub fn new(face_count: usize) -> Self {
        Self {
            nodes: vec![SearchNode::UNVISITED; face_count],
            open: BinaryHeap::with_capacity(64),
            corridor: Vec::with_capacity(64),
        }
    }

    fn reset(&mut self, face_count: usize) {
        self.nodes.clear();
        self.nodes.resize(face_count, SearchNode::UNVISITED);
        self.open.clear();
        self.corridor.clear();
    }

    /// Node state from the last search
    pub fn node(&self, face: FaceId) -> Option<&SearchNode> {
        self.nodes.get(face as usize)
    }

    /// Face corridor built by the last [`build_corridor`](Self::build_corridor)
    pub fn corridor(&self) -> &[FaceId] {
        &self.corridor
    }

    fn edge_cost(
        &self,
        mesh: &NavMesh,
        from: FaceId,
        to: FaceId,
        metric: DistanceMetric,
    ) -> (f32, Option<Vec2>) {
        match metric {
            DistanceMetric::FaceCenter => (mesh.center(from).distance(mesh.center(to)), None),
            DistanceMetric::EdgeMidpoint => {
                let entry = self.nodes[from as usize]
                    .position
                    .unwrap_or_else(|| mesh.center(from));
                let mid = mesh
                    .portal_midpoint(from, to)
                    .unwrap_or_else(|| mesh.center(to));
                (entry.distance(mid), Some(mid))
            }
        }
    }

    /// Dijkstra over face adjacency from `start_face` towards `end_face`
    ///
    /// While searching it remembers the settled face whose centre is closest
    /// to `end_pos`; if the goal is unreachable that face becomes the end of
    /// the corridor.
    pub fn search(
        &mut self,
        mesh: &NavMesh,
        start_face: FaceId,
        start_pos: Vec2,
        end_face: FaceId,
        end_pos: Vec2,
        metric: DistanceMetric,
    ) -> SearchResult {
        self.reset(mesh.face_count());

        let start = &mut self.nodes[start_face as usize];
        start.dist = 0.0;
        start.position = Some(start_pos);
        self.open.push(OpenNode {
            face: start_face,
            dist: 0.0,
        });

        let mut best_face = start_face;
        let mut best_cost = mesh.center(start_face).distance(end_pos);

        while let Some(OpenNode { face: u, dist }) = self.open.pop() {
            if self.nodes[u as usize].closed || dist > self.nodes[u as usize].dist {
                continue;
            }
            self.nodes[u as usize].closed = true;

            if u == end_face {
                return SearchResult {
                    reached: true,
                    end_face,
                };
            }

            let heuristic = mesh.center(u).distance(end_pos);
            if heuristic < best_cost {
                best_cost = heuristic;
                best_face = u;
            }

            for v in mesh.face(u).neighbours.into_iter().flatten() {
                if self.nodes[v as usize].closed {
                    continue;
                }
                let (cost, entry) = self.edge_cost(mesh, u, v, metric);
                let alt = dist + cost;
                let node = &mut self.nodes[v as usize];
                if alt < node.dist {
                    node.dist = alt;
                    node.prev = Some(u);
                    node.position = entry;
                    self.open.push(OpenNode { face: v, dist: alt });
                }
            }
        }

        log::debug!(
            "Nav: face {end_face} unreachable from {start_face}, ending at face {best_face}"
        );
        SearchResult {
            reached: false,
            end_face: best_face,
        }
    }

    /// Walk predecessor links back from `end_face` into an ordered corridor
    ///
    /// # Errors
    ///
    /// Returns [`NavError::CorridorTooLong`] if the corridor has more than
    /// `max_len` faces
    pub fn build_corridor(&mut self, end_face: FaceId, max_len: usize) -> Result<&[FaceId], NavError> {
        self.corridor.clear();
        let mut current = Some(end_face);
        while let Some(face) = current {
            if self.corridor.len() >= max_len {
                let mut len = self.corridor.len();
                let mut rest = Some(face);
                while let Some(f) = rest {
                    len += 1;
                    rest = self.nodes[f as usize].prev;
                }
                log::warn!("Nav: corridor of {len} faces exceeds limit {max_len}");
                self.corridor.clear();
                return Err(NavError::CorridorTooLong {
                    len,
                    limit: max_len,
                });
            }
            self.corridor.push(face);
            current = self.nodes[face as usize].prev;
        }
        self.corridor.reverse();
        Ok(&self.corridor)
    }
}
