//! Contour classification and triangulation
//!
//! Turns the unordered rings produced by the clip step into solid regions with
//! their holes, densifies long boundary edges and earclips each region.

use glam::Vec2;

use super::math::{cross3, point_in_polygon, polygon_signed_area};
use crate::core::NavError;

/// Rings with less area than this are dropped as degenerate
const MIN_RING_AREA: f32 = 1e-4;

/// Earclipped triangles with less twice-area than this are dropped
const MIN_TRIANGLE_AREA: f32 = 1e-6;

/// Offset of subdivision points off their edge
pub const STEINER_NUDGE: f32 = 1e-3;

/// A solid walkable region and the holes cut into it
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Outer boundary, counter-clockwise
    pub outer: Vec<Vec2>,
    /// Holes, clockwise
    pub holes: Vec<Vec<Vec2>>,
}

impl Region {
    /// Region with no holes
    pub fn solid(outer: Vec<Vec2>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Total vertex count over the outer ring and all holes
    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }
}

/// Split rings into solids and holes and attach each hole to its solid
///
/// The orientation of the largest ring decides which sign means "solid", so
/// the result does not depend on the orientation convention of the clipper.
/// A hole goes to the smallest solid containing its first vertex.
pub fn classify_contours(rings: Vec<Vec<Vec2>>) -> Vec<Region> {
    let mut measured: Vec<(Vec<Vec2>, f32)> = rings
        .into_iter()
        .filter(|r| r.len() >= 3)
        .map(|r| {
            let area = polygon_signed_area(&r);
            (r, area)
        })
        .filter(|(_, area)| area.abs() > MIN_RING_AREA)
        .collect();

    let Some(largest) = measured
        .iter()
        .map(|(_, area)| *area)
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
    else {
        return Vec::new();
    };
    let solid_sign = largest.signum();

    let mut solids: Vec<(Region, f32)> = Vec::new();
    let mut holes: Vec<Vec<Vec2>> = Vec::new();
    for (mut ring, area) in measured.drain(..) {
        if area.signum() == solid_sign {
            if area < 0.0 {
                ring.reverse();
            }
            solids.push((Region::solid(ring), area.abs()));
        } else {
            if area > 0.0 {
                ring.reverse();
            }
            holes.push(ring);
        }
    }

    for hole in holes {
        let probe = hole[0];
        let owner = solids
            .iter_mut()
            .filter(|(region, _)| point_in_polygon(probe, &region.outer))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match owner {
            Some((region, _)) => region.holes.push(hole),
            None => log::warn!("Dropping hole at {probe} with no enclosing solid"),
        }
    }

    solids.into_iter().map(|(region, _)| region).collect()
}

/// Insert evenly spaced points on every edge longer than `step`
///
/// The walkable side must be on the left of the ring. Every other inserted
/// point sits [`STEINER_NUDGE`] towards that side, since earcut drops
/// collinear vertices.
pub fn subdivide_ring(ring: &[Vec2], step: f32) -> Vec<Vec2> {
    if step <= 0.0 {
        return ring.to_vec();
    }
    let mut out = Vec::with_capacity(ring.len());
    for (i, &p0) in ring.iter().enumerate() {
        let p1 = ring[(i + 1) % ring.len()];
        out.push(p0);
        let edge = p1 - p0;
        let count = (edge.length() / step) as usize;
        if count > 1 {
            let delta = edge / count as f32;
            let nudge = edge.perp().normalize_or_zero() * STEINER_NUDGE;
            for k in 1..count {
                let offset = if k % 2 == 1 { nudge } else { Vec2::ZERO };
                out.push(p0 + delta * k as f32 + offset);
            }
        }
    }
    out
}

/// Densify the boundary of a region
pub fn subdivide_region(region: &Region, step: f32) -> Region {
    Region {
        outer: subdivide_ring(&region.outer, step),
        holes: region
            .holes
            .iter()
            .map(|h| subdivide_ring(h, step))
            .collect(),
    }
}

/// Earclip a region into counter-clockwise triangles
///
/// Degenerate triangles are skipped and clockwise ones are flipped.
///
/// # Errors
///
/// Returns [`NavError::TriangulationFailed`] if earcut rejects the input
pub fn triangulate_region(region: &Region) -> Result<Vec<[Vec2; 3]>, NavError> {
    let mut points: Vec<Vec2> = Vec::with_capacity(region.vertex_count());
    let mut coords: Vec<f64> = Vec::with_capacity(region.vertex_count() * 2);
    let mut hole_indices: Vec<usize> = Vec::with_capacity(region.holes.len());

    for &p in &region.outer {
        points.push(p);
        coords.extend([f64::from(p.x), f64::from(p.y)]);
    }
    for hole in &region.holes {
        hole_indices.push(points.len());
        for &p in hole {
            points.push(p);
            coords.extend([f64::from(p.x), f64::from(p.y)]);
        }
    }

    let indices = earcutr::earcut(&coords, &hole_indices, 2)
        .map_err(|e| NavError::TriangulationFailed(format!("{e:?}")))?;

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (a, mut b, mut c) = (points[tri[0]], points[tri[1]], points[tri[2]]);
        let area = cross3(a, b, c);
        if area.abs() <= MIN_TRIANGLE_AREA {
            continue;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }
        triangles.push([a, b, c]);
    }
    Ok(triangles)
}
