//! String pulling through a face corridor
//!
//! Simple stupid funnel algorithm: keep an apex and the left/right edges of a
//! funnel, narrow it portal by portal and emit a waypoint whenever one side
//! crosses the other.

use glam::Vec2;
use smallvec::SmallVec;

use super::mesh::{FaceId, NavMesh};
use super::path::NavPath;
use crate::geometry::math::triarea2;

type Portals = SmallVec<[(Vec2, Vec2); 32]>;

fn corridor_portals(mesh: &NavMesh, corridor: &[FaceId], start: Vec2, end: Vec2) -> Portals {
    let mut portals = Portals::with_capacity(corridor.len() + 1);
    portals.push((start, start));
    for pair in corridor.windows(2) {
        if let Some(portal) = mesh.portal(pair[0], pair[1]) {
            portals.push(portal);
        }
    }
    portals.push((end, end));
    portals
}

/// Shortest polyline from `start` to `end` inside `corridor`
///
/// The path is rebuilt from scratch and starts with `start`. Returns false if
/// the path ran out of capacity and was cut short.
pub fn string_pull(
    mesh: &NavMesh,
    corridor: &[FaceId],
    start: Vec2,
    end: Vec2,
    epsilon: f32,
    path: &mut NavPath,
) -> bool {
    let portals = corridor_portals(mesh, corridor, start, end);
    let same = |a: Vec2, b: Vec2| a.distance_squared(b) <= epsilon;

    path.clear();
    let mut complete = path.append_vertex(start);

    let mut apex = start;
    let mut left = start;
    let mut right = start;
    let (mut left_index, mut right_index) = (0usize, 0usize);

    let mut emit = |path: &mut NavPath, p: Vec2| {
        if path.destination().is_some_and(|last| same(last, p)) {
            return;
        }
        if !path.append_vertex(p) {
            complete = false;
        }
    };

    let mut i = 1;
    while i < portals.len() {
        let (portal_left, portal_right) = portals[i];

        // Narrow the right side
        if triarea2(apex, right, portal_right) <= 0.0 {
            if same(apex, right) || triarea2(apex, left, portal_right) > 0.0 {
                right = portal_right;
                right_index = i;
            } else {
                // Right crossed over left, left becomes the new apex
                emit(path, left);
                apex = left;
                let apex_index = left_index;
                right = apex;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        // Narrow the left side
        if triarea2(apex, left, portal_left) >= 0.0 {
            if same(apex, left) || triarea2(apex, right, portal_left) < 0.0 {
                left = portal_left;
                left_index = i;
            } else {
                // Left crossed over right, right becomes the new apex
                emit(path, right);
                apex = right;
                let apex_index = right_index;
                left = apex;
                left_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    emit(path, end);
    if !complete {
        log::warn!("Nav: path truncated at {} waypoints", path.len());
    }
    complete
}

/// Length of the naive route through consecutive face centres
pub fn center_path_length(mesh: &NavMesh, corridor: &[FaceId], start: Vec2, end: Vec2) -> f32 {
    let mut length = 0.0;
    let mut prev = start;
    for &face in corridor {
        let c = mesh.center(face);
        length += prev.distance(c);
        prev = c;
    }
    length + prev.distance(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NavConfig;

    /// L-shaped corridor: a 1x1 cell at the origin, one to its right and one
    /// above the right cell
    fn l_mesh() -> NavMesh {
        let mut mesh = NavMesh::new(4.0, 4.0, &NavConfig::default());
        let cells = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        for (x, y) in cells {
            let a = mesh.add_vertex(Vec2::new(x, y)).unwrap();
            let b = mesh.add_vertex(Vec2::new(x + 1.0, y)).unwrap();
            let c = mesh.add_vertex(Vec2::new(x + 1.0, y + 1.0)).unwrap();
            let d = mesh.add_vertex(Vec2::new(x, y + 1.0)).unwrap();
            mesh.add_face(a, b, c).unwrap();
            mesh.add_face(a, c, d).unwrap();
        }
        mesh.link_faces(0..mesh.face_count());
        mesh
    }

    fn corridor(mesh: &NavMesh, start: Vec2, end: Vec2) -> Vec<FaceId> {
        let mut scratch = crate::nav::search::SearchScratch::new(mesh.face_count());
        let sf = mesh.find_face(start).unwrap();
        let ef = mesh.find_face(end).unwrap();
        let result = scratch.search(
            mesh,
            sf,
            start,
            ef,
            end,
            crate::core::DistanceMetric::FaceCenter,
        );
        assert!(result.reached);
        scratch.build_corridor(result.end_face, 64).unwrap().to_vec()
    }

    #[test]
    fn test_straight_corridor_gives_two_points() {
        let mesh = l_mesh();
        let start = Vec2::new(0.2, 0.5);
        let end = Vec2::new(1.8, 0.5);
        let faces = corridor(&mesh, start, end);

        let mut path = NavPath::new();
        assert!(string_pull(&mesh, &faces, start, end, 1e-6, &mut path));
        assert_eq!(path.points(), &[start, end]);
    }

    #[test]
    fn test_corner_is_pulled_tight() {
        let mesh = l_mesh();
        let start = Vec2::new(0.2, 0.2);
        let end = Vec2::new(1.2, 1.8);
        let faces = corridor(&mesh, start, end);

        let mut path = NavPath::new();
        assert!(string_pull(&mesh, &faces, start, end, 1e-6, &mut path));
        // Bends once around the inner corner at (1, 1)
        assert_eq!(path.len(), 3);
        assert!((path.points()[1] - Vec2::new(1.0, 1.0)).length() < 1e-5);
        assert!(path.total_length() <= center_path_length(&mesh, &faces, start, end) + 1e-4);
    }

    #[test]
    fn test_single_face_corridor() {
        let mesh = l_mesh();
        let start = Vec2::new(0.9, 0.1);
        let end = Vec2::new(0.95, 0.5);
        let face = mesh.find_face(start).unwrap();

        let mut path = NavPath::new();
        assert!(string_pull(&mesh, &[face], start, end, 1e-6, &mut path));
        assert_eq!(path.points(), &[start, end]);
    }

    #[test]
    fn test_coincident_start_and_end() {
        let mesh = l_mesh();
        let p = Vec2::new(0.5, 0.2);
        let face = mesh.find_face(p).unwrap();

        let mut path = NavPath::new();
        assert!(string_pull(&mesh, &[face], p, p, 1e-6, &mut path));
        assert_eq!(path.len(), 1);
    }
}
