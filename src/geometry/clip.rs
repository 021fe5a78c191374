//! Walkable region extraction
//!
//! Subtracts static obstacle polygons from the level rectangle and shrinks the
//! result by the agent radius. Clipper2 works in a fixed-point integer domain
//! internally, so the boolean step is robust against nearly coincident edges.

use clipper2::{EndType, FillRule, JoinType, Paths, difference};
use glam::Vec2;

use crate::core::NavError;

/// Miter limit used when shrinking the walkable region
const MITER_LIMIT: f64 = 2.0;

fn to_clipper_paths(rings: &[Vec<Vec2>]) -> Paths {
    let coords: Vec<Vec<(f64, f64)>> = rings
        .iter()
        .filter(|ring| ring.len() >= 3)
        .map(|ring| {
            ring.iter()
                .map(|p| (f64::from(p.x), f64::from(p.y)))
                .collect()
        })
        .collect();
    coords.into()
}

fn from_clipper_paths(paths: Paths) -> Vec<Vec<Vec2>> {
    let output: Vec<Vec<(f64, f64)>> = paths.into();
    output
        .into_iter()
        .filter(|path| path.len() >= 3)
        .map(|path| {
            path.into_iter()
                .map(|(x, y)| Vec2::new(x as f32, y as f32))
                .collect()
        })
        .collect()
}

/// Axis aligned rectangle centred on the origin, counter-clockwise
pub fn bounds_ring(half_width: f32, half_height: f32) -> Vec<Vec2> {
    vec![
        Vec2::new(-half_width, -half_height),
        Vec2::new(half_width, -half_height),
        Vec2::new(half_width, half_height),
        Vec2::new(-half_width, half_height),
    ]
}

/// Compute the walkable contours of a level
///
/// Returns unclassified closed rings: outer boundaries and holes mixed, in
/// whatever orientation Clipper2 produced them.
///
/// # Errors
///
/// Returns [`NavError::ClipFailed`] if the boolean difference fails
pub fn walkable_region(
    half_width: f32,
    half_height: f32,
    obstacles: &[Vec<Vec2>],
    agent_radius: f32,
) -> Result<Vec<Vec<Vec2>>, NavError> {
    let subject = to_clipper_paths(&[bounds_ring(half_width, half_height)]);

    let region = if obstacles.iter().any(|o| o.len() >= 3) {
        let clip = to_clipper_paths(obstacles);
        difference(subject, clip, FillRule::NonZero)
            .map_err(|e| NavError::ClipFailed(format!("{e:?}")))?
    } else {
        subject
    };

    let region = if agent_radius > 0.0 {
        region.inflate(
            -f64::from(agent_radius),
            JoinType::Miter,
            EndType::Polygon,
            MITER_LIMIT,
        )
    } else {
        region
    };

    let rings = from_clipper_paths(region);
    log::debug!(
        "Walkable region: {} obstacles -> {} contours",
        obstacles.len(),
        rings.len()
    );
    Ok(rings)
}
