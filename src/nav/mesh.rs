//! Navigation mesh arena
//!
//! Vertices and faces live in flat vectors and are addressed only by index.
//! Faces are counter-clockwise triangles; edge `e` of a face runs from
//! `vertices[e]` to `vertices[(e + 1) % 3]` and `neighbours[e]` is the face on
//! the other side of that edge.

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::core::{CapacityKind, NavConfig, NavError};
use crate::geometry::math::{closest_point_on_triangle, cross3, point_in_triangle};
use crate::geometry::{classify_contours, subdivide_region, triangulate_region, walkable_region};

/// Index of a face in the mesh
pub type FaceId = u32;

/// Index of a vertex in the mesh
pub type VertexId = u32;

/// Faces with twice-area below this are rejected as degenerate
pub(super) const MIN_FACE_AREA: f32 = 1e-6;

/// Face flag bits
pub mod face_flags {
    /// The face took part in an edge flip
    pub const FLIPPED: u32 = 1 << 0;
    /// The face was flipped by the sliver pass
    pub const SLIVER: u32 = 1 << 1;
}

/// A triangle of the navigation mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Vertex indices, counter-clockwise
    pub vertices: [VertexId; 3],
    /// Face across each edge, `None` on the mesh boundary
    pub neighbours: [Option<FaceId>; 3],
    /// Debug and refinement marks, see [`face_flags`]
    pub flags: u32,
}

impl Face {
    fn new(vertices: [VertexId; 3]) -> Self {
        Self {
            vertices,
            neighbours: [None; 3],
            flags: 0,
        }
    }

    /// Vertex pair of edge `e`
    #[inline]
    pub fn edge(&self, e: usize) -> (VertexId, VertexId) {
        (self.vertices[e], self.vertices[(e + 1) % 3])
    }

    /// Edge index whose endpoints are `v0` and `v1` in either order
    pub fn edge_index(&self, v0: VertexId, v1: VertexId) -> Option<usize> {
        (0..3).find(|&e| {
            let (a, b) = self.edge(e);
            (a == v0 && b == v1) || (a == v1 && b == v0)
        })
    }

    /// Edge index leading to `neighbour`
    pub fn edge_to(&self, neighbour: FaceId) -> Option<usize> {
        self.neighbours.iter().position(|n| *n == Some(neighbour))
    }
}

/// Triangulated walkable area of a level
#[derive(Debug, Clone)]
pub struct NavMesh {
    pub(super) vertices: Vec<Vec2>,
    pub(super) faces: Vec<Face>,
    pub(super) centers: Vec<Vec2>,
    half_width: f32,
    half_height: f32,
    max_vertices: usize,
    max_faces: usize,
    quantization: f32,
    vertex_lookup: FxHashMap<(i64, i64), VertexId>,
}

impl NavMesh {
    /// Create an empty mesh with the capacities from `config`
    pub fn new(half_width: f32, half_height: f32, config: &NavConfig) -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            centers: Vec::new(),
            half_width,
            half_height,
            max_vertices: config.max_vertices,
            max_faces: config.max_faces,
            quantization: config.vertex_quantization.max(1.0),
            vertex_lookup: FxHashMap::default(),
        }
    }

    /// Build the mesh for a rectangle with obstacle polygons cut out
    ///
    /// Runs clip, offset, contour classification, triangulation, adjacency and
    /// (when enabled) refinement.
    ///
    /// # Errors
    ///
    /// Fails if clipping or triangulation fails or an arena overflows
    pub fn from_obstacles(
        half_width: f32,
        half_height: f32,
        obstacles: &[Vec<Vec2>],
        config: &NavConfig,
    ) -> Result<Self, NavError> {
        let mut mesh = Self::new(half_width, half_height, config);

        let rings = walkable_region(half_width, half_height, obstacles, config.agent_radius)?;
        let regions = classify_contours(rings);
        log::debug!("NavMesh: {} solid regions", regions.len());

        for region in &regions {
            let dense = subdivide_region(region, config.steiner_step);
            let triangles = triangulate_region(&dense)?;

            let first = mesh.faces.len();
            for [a, b, c] in triangles {
                let ia = mesh.add_vertex(a)?;
                let ib = mesh.add_vertex(b)?;
                let ic = mesh.add_vertex(c)?;
                mesh.add_face(ia, ib, ic)?;
            }
            mesh.link_faces(first..mesh.faces.len());
        }

        if config.refine {
            let flips = mesh.refine_until_stable(config.max_refine_passes);
            let slivers = mesh.refine_slivers_until_stable(config.sliver_ratio, config.sliver_passes);
            log::debug!("NavMesh: {flips} edge flips, {slivers} sliver flips");
        }

        log::info!(
            "NavMesh: {} vertices, {} faces from {} obstacles",
            mesh.vertices.len(),
            mesh.faces.len(),
            obstacles.len()
        );
        Ok(mesh)
    }

    fn vertex_key(&self, p: Vec2) -> (i64, i64) {
        (
            (p.x * self.quantization).round() as i64,
            (p.y * self.quantization).round() as i64,
        )
    }

    /// Insert a vertex, reusing an existing one at the same quantised position
    ///
    /// # Errors
    ///
    /// Returns [`NavError::MeshCapacityExceeded`] when the vertex arena is full
    pub fn add_vertex(&mut self, p: Vec2) -> Result<VertexId, NavError> {
        let key = self.vertex_key(p);
        if let Some(&id) = self.vertex_lookup.get(&key) {
            return Ok(id);
        }
        if self.vertices.len() >= self.max_vertices {
            log::error!("NavMesh: vertex capacity {} exceeded", self.max_vertices);
            return Err(NavError::MeshCapacityExceeded {
                kind: CapacityKind::Vertices,
                limit: self.max_vertices,
            });
        }
        let id = self.vertices.len() as VertexId;
        self.vertices.push(p);
        self.vertex_lookup.insert(key, id);
        Ok(id)
    }

    /// Insert a face, fixing its winding to counter-clockwise
    ///
    /// Returns `Ok(None)` for degenerate faces, which are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::MeshCapacityExceeded`] when the face arena is full
    pub fn add_face(
        &mut self,
        a: VertexId,
        b: VertexId,
        c: VertexId,
    ) -> Result<Option<FaceId>, NavError> {
        if a == b || b == c || c == a {
            return Ok(None);
        }
        let (pa, pb, pc) = (
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        );
        let area = cross3(pa, pb, pc);
        if area.abs() <= MIN_FACE_AREA {
            return Ok(None);
        }
        if self.faces.len() >= self.max_faces {
            log::error!("NavMesh: face capacity {} exceeded", self.max_faces);
            return Err(NavError::MeshCapacityExceeded {
                kind: CapacityKind::Faces,
                limit: self.max_faces,
            });
        }

        let vertices = if area > 0.0 { [a, b, c] } else { [a, c, b] };
        let id = self.faces.len() as FaceId;
        self.faces.push(Face::new(vertices));
        self.centers.push((pa + pb + pc) / 3.0);
        Ok(Some(id))
    }

    /// Wire mutual neighbour links between faces in `range` sharing an edge
    pub fn link_faces(&mut self, range: std::ops::Range<usize>) {
        let mut open_edges: FxHashMap<(VertexId, VertexId), (FaceId, usize)> =
            FxHashMap::default();
        for f in range {
            for e in 0..3 {
                let (v0, v1) = self.faces[f].edge(e);
                let key = (v0.min(v1), v0.max(v1));
                match open_edges.remove(&key) {
                    Some((g, ge)) => {
                        self.faces[f].neighbours[e] = Some(g);
                        self.faces[g as usize].neighbours[ge] = Some(f as FaceId);
                    }
                    None => {
                        open_edges.insert(key, (f as FaceId, e));
                    }
                }
            }
        }
    }

    /// Number of faces
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True if the mesh has no faces
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// All faces
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// All vertex positions
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Face by index
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id as usize]
    }

    /// Vertex position by index
    #[inline]
    pub fn vertex(&self, id: VertexId) -> Vec2 {
        self.vertices[id as usize]
    }

    /// Corner positions of a face
    #[inline]
    pub fn face_points(&self, id: FaceId) -> [Vec2; 3] {
        let [a, b, c] = self.faces[id as usize].vertices;
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Centroid of a face
    #[inline]
    pub fn center(&self, id: FaceId) -> Vec2 {
        self.centers[id as usize]
    }

    /// Half extents of the navigable rectangle
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.half_width, self.half_height)
    }

    /// Twice the area of a face
    pub fn face_area2(&self, id: FaceId) -> f32 {
        let [a, b, c] = self.face_points(id);
        cross3(a, b, c)
    }

    /// Face containing `p`, if any
    pub fn find_face(&self, p: Vec2) -> Option<FaceId> {
        (0..self.faces.len() as FaceId).find(|&id| {
            let [a, b, c] = self.face_points(id);
            point_in_triangle(p, a, b, c)
        })
    }

    /// Closest point to `p` on or inside a face
    pub fn closest_point_on_face(&self, id: FaceId, p: Vec2) -> Vec2 {
        let [a, b, c] = self.face_points(id);
        closest_point_on_triangle(p, a, b, c)
    }

    /// Face containing `p`, or the nearest face and the closest point on it
    ///
    /// Returns `None` only for an empty mesh.
    pub fn clamped_face_index(&self, p: Vec2) -> Option<(FaceId, Vec2)> {
        if let Some(id) = self.find_face(p) {
            return Some((id, p));
        }
        let mut best: Option<(FaceId, Vec2, f32)> = None;
        for id in 0..self.faces.len() as FaceId {
            let q = self.closest_point_on_face(id, p);
            let d = q.distance_squared(p);
            if best.is_none_or(|(_, _, best_d)| d < best_d) {
                best = Some((id, q, d));
            }
        }
        best.map(|(id, q, _)| (id, q))
    }

    /// Portal endpoints `(left, right)` when stepping from `from` into `to`
    pub fn portal(&self, from: FaceId, to: FaceId) -> Option<(Vec2, Vec2)> {
        let face = self.face(from);
        let e = face.edge_to(to)?;
        let (v0, v1) = face.edge(e);
        Some((self.vertex(v1), self.vertex(v0)))
    }

    /// Midpoint of the edge shared by two adjacent faces
    pub fn portal_midpoint(&self, from: FaceId, to: FaceId) -> Option<Vec2> {
        self.portal(from, to).map(|(l, r)| (l + r) * 0.5)
    }

    /// Check mutual adjacency and counter-clockwise winding of every face
    pub fn is_consistent(&self) -> bool {
        self.faces.iter().enumerate().all(|(f, face)| {
            let f = f as FaceId;
            if self.face_area2(f) <= 0.0 {
                return false;
            }
            (0..3).all(|e| match face.neighbours[e] {
                None => true,
                Some(g) => {
                    let (v0, v1) = face.edge(e);
                    let other = self.face(g);
                    match other.edge_index(v0, v1) {
                        Some(ge) => {
                            other.neighbours[ge] == Some(f)
                                && other.neighbours.iter().filter(|n| **n == Some(f)).count() == 1
                        }
                        None => false,
                    }
                }
            })
        })
    }
}
