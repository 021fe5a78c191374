//! Edge-flip refinement
//!
//! Adjacent triangle pairs whose shared edge is the long diagonal of their quad
//! get the short diagonal instead. Boundary edges have no neighbour and are
//! never flipped, so obstacle outlines survive untouched.

use super::mesh::{FaceId, MIN_FACE_AREA, NavMesh, face_flags};
use crate::geometry::math::cross3;

/// A flip must shorten the shared edge by more than this
const FLIP_EPSILON: f32 = 1e-4;

/// Vertex and neighbour layout of the quad around one shared edge
///
/// `f = (a, b, c)` and `g = (b, a, d)`; the neighbour names give the edge each
/// outer face sits on.
#[derive(Debug, Clone, Copy)]
struct Quad {
    f: FaceId,
    g: FaceId,
    a: u32,
    b: u32,
    c: u32,
    d: u32,
    n_bc: Option<FaceId>,
    n_ca: Option<FaceId>,
    n_ad: Option<FaceId>,
    n_db: Option<FaceId>,
}

impl NavMesh {
    fn quad(&self, f: FaceId, e: usize) -> Option<Quad> {
        let face = self.faces[f as usize];
        let g = face.neighbours[e]?;
        let other = self.faces[g as usize];

        let a = face.vertices[e];
        let b = face.vertices[(e + 1) % 3];
        let c = face.vertices[(e + 2) % 3];

        let ge = other.edge_to(f)?;
        // Shared edge appears reversed in g
        if other.vertices[ge] != b || other.vertices[(ge + 1) % 3] != a {
            return None;
        }
        let d = other.vertices[(ge + 2) % 3];

        Some(Quad {
            f,
            g,
            a,
            b,
            c,
            d,
            n_bc: face.neighbours[(e + 1) % 3],
            n_ca: face.neighbours[(e + 2) % 3],
            n_ad: other.neighbours[(ge + 1) % 3],
            n_db: other.neighbours[(ge + 2) % 3],
        })
    }

    /// Both triangles after a flip keep positive area
    fn flip_is_valid(&self, q: &Quad) -> bool {
        let (a, b, c, d) = (
            self.vertex(q.a),
            self.vertex(q.b),
            self.vertex(q.c),
            self.vertex(q.d),
        );
        cross3(c, a, d) > MIN_FACE_AREA && cross3(d, b, c) > MIN_FACE_AREA
    }

    fn redirect_neighbour(&mut self, face: Option<FaceId>, v0: u32, v1: u32, to: FaceId) {
        let Some(h) = face else {
            return;
        };
        let h = &mut self.faces[h as usize];
        if let Some(k) = h.edge_index(v0, v1) {
            h.neighbours[k] = Some(to);
        }
    }

    /// Replace the shared edge `ab` of the quad with `cd`
    ///
    /// New faces are `f = (c, a, d)` and `g = (d, b, c)`.
    fn flip(&mut self, q: &Quad, flag: u32) {
        {
            let f = &mut self.faces[q.f as usize];
            f.vertices = [q.c, q.a, q.d];
            f.neighbours = [q.n_ca, q.n_ad, Some(q.g)];
            f.flags |= flag;
        }
        {
            let g = &mut self.faces[q.g as usize];
            g.vertices = [q.d, q.b, q.c];
            g.neighbours = [q.n_db, q.n_bc, Some(q.f)];
            g.flags |= flag;
        }
        // Edge ad moved from g to f, edge bc from f to g
        self.redirect_neighbour(q.n_ad, q.a, q.d, q.f);
        self.redirect_neighbour(q.n_bc, q.b, q.c, q.g);

        for id in [q.f, q.g] {
            let [p0, p1, p2] = self.face_points(id);
            self.centers[id as usize] = (p0 + p1 + p2) / 3.0;
        }
    }

    /// One pass of shortest-diagonal flips over every face
    ///
    /// Returns the number of flips performed. Every flip strictly shortens the
    /// total edge length, so repeated calls reach zero.
    pub fn refine(&mut self) -> usize {
        let mut flips = 0;
        for f in 0..self.faces.len() as FaceId {
            for e in 0..3 {
                let Some(q) = self.quad(f, e) else {
                    continue;
                };
                let current = self.vertex(q.a).distance(self.vertex(q.b));
                let alternative = self.vertex(q.c).distance(self.vertex(q.d));
                if alternative + FLIP_EPSILON < current && self.flip_is_valid(&q) {
                    self.flip(&q, face_flags::FLIPPED);
                    flips += 1;
                }
            }
        }
        flips
    }

    /// One pass flipping adjacent pairs whose area ratio exceeds `max_ratio`
    ///
    /// A pair is only flipped when the flip lowers its ratio.
    pub fn refine_slivers(&mut self, max_ratio: f32) -> usize {
        let mut flips = 0;
        for f in 0..self.faces.len() as FaceId {
            for e in 0..3 {
                let Some(q) = self.quad(f, e) else {
                    continue;
                };
                let before = area_ratio(self.face_area2(q.f), self.face_area2(q.g));
                if before <= max_ratio || !self.flip_is_valid(&q) {
                    continue;
                }
                let (a, b, c, d) = (
                    self.vertex(q.a),
                    self.vertex(q.b),
                    self.vertex(q.c),
                    self.vertex(q.d),
                );
                let after = area_ratio(cross3(c, a, d), cross3(d, b, c));
                if after < before {
                    self.flip(&q, face_flags::SLIVER);
                    flips += 1;
                }
            }
        }
        flips
    }

    /// Run [`refine`](Self::refine) until it performs no flips
    pub fn refine_until_stable(&mut self, max_passes: usize) -> usize {
        let mut total = 0;
        for pass in 0..max_passes {
            let flips = self.refine();
            total += flips;
            if flips == 0 {
                log::debug!("NavMesh: refinement settled after {} passes", pass + 1);
                return total;
            }
        }
        log::warn!("NavMesh: refinement still flipping after {max_passes} passes");
        total
    }

    /// Run [`refine_slivers`](Self::refine_slivers) for at most `max_passes`
    pub fn refine_slivers_until_stable(&mut self, max_ratio: f32, max_passes: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_passes {
            let flips = self.refine_slivers(max_ratio);
            total += flips;
            if flips == 0 {
                break;
            }
        }
        total
    }
}

fn area_ratio(a: f32, b: f32) -> f32 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if lo <= 0.0 {
        return f32::INFINITY;
    }
    hi / lo
}
