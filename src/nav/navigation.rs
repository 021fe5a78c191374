//! Navigation facade
//!
//! Owns the mesh, the search scratch buffer and the path pool. Built once per
//! level; afterwards only queries touch it.

use glam::Vec2;

use super::funnel::string_pull;
use super::mesh::{FaceId, NavMesh};
use super::path::NavPath;
use super::pool::{PathHandle, PathPool};
use super::search::SearchScratch;
use crate::core::{DebugConfig, DebugDraw, NavConfig, NavError, QueryConfig, RandomSource};
use crate::physics::{BodyHandle, CollisionWorld};

/// Attempts at a uniform sample before falling back to clamping
const RANDOM_POINT_TRIES: usize = 8;

/// Path queries over a level's navigation mesh
#[derive(Debug)]
pub struct Navigation {
    mesh: NavMesh,
    scratch: SearchScratch,
    pool: PathPool,
    config: NavConfig,
}

impl Navigation {
    /// Build navigation for the static geometry of `world`
    ///
    /// # Errors
    ///
    /// Fails if the mesh build fails; see [`NavMesh::from_obstacles`]
    pub fn build(
        world: &dyn CollisionWorld,
        half_width: f32,
        half_height: f32,
        config: NavConfig,
    ) -> Result<Self, NavError> {
        let obstacles = world.static_polygons();
        Self::from_obstacles(half_width, half_height, &obstacles, config)
    }

    /// Build navigation for explicit obstacle polygons
    ///
    /// # Errors
    ///
    /// Fails if the mesh build fails; see [`NavMesh::from_obstacles`]
    pub fn from_obstacles(
        half_width: f32,
        half_height: f32,
        obstacles: &[Vec<Vec2>],
        config: NavConfig,
    ) -> Result<Self, NavError> {
        let mesh = NavMesh::from_obstacles(half_width, half_height, obstacles, &config)?;
        Ok(Self::from_mesh(mesh, config))
    }

    /// Wrap an already built mesh
    pub fn from_mesh(mesh: NavMesh, config: NavConfig) -> Self {
        Self {
            scratch: SearchScratch::new(mesh.face_count()),
            pool: PathPool::new(config.path_pool_size),
            mesh,
            config,
        }
    }

    /// The navigation mesh
    pub fn mesh(&self) -> &NavMesh {
        &self.mesh
    }

    /// Build configuration
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Replace query behaviour
    pub fn set_query_config(&mut self, query: QueryConfig) {
        self.config.query = query;
    }

    /// Claim a path from the pool
    ///
    /// # Errors
    ///
    /// Returns [`NavError::PoolExhausted`] if every path is in use
    pub fn obtain_path(&mut self) -> Result<PathHandle, NavError> {
        self.pool.obtain()
    }

    /// Give a path back to the pool
    pub fn return_path(&mut self, handle: PathHandle) {
        self.pool.release(handle);
    }

    /// Path behind a handle
    pub fn path(&self, handle: &PathHandle) -> Option<&NavPath> {
        self.pool.get(handle)
    }

    /// Mutable path behind a handle
    pub fn path_mut(&mut self, handle: &PathHandle) -> Option<&mut NavPath> {
        self.pool.get_mut(handle)
    }

    /// The path pool
    pub fn pool(&self) -> &PathPool {
        &self.pool
    }

    /// Plan from `start` to `end` into a pooled path
    ///
    /// `Ok(true)` means the literal destination is reached. `Ok(false)` means
    /// the path ends at the reachable point closest to it.
    ///
    /// # Errors
    ///
    /// [`NavError::InvalidPath`] for a stale handle, otherwise as
    /// [`navigate_into`](Self::navigate_into)
    pub fn navigate(&mut self, start: Vec2, end: Vec2, handle: &PathHandle) -> Result<bool, NavError> {
        let Some(path) = self.pool.get_mut(handle) else {
            return Err(NavError::InvalidPath);
        };
        plan(&self.mesh, &mut self.scratch, &self.config, start, end, path)
    }

    /// Plan from `start` to `end` into any path
    ///
    /// # Errors
    ///
    /// [`NavError::EmptyMesh`] if there is nothing to walk on and
    /// [`NavError::CorridorTooLong`] if the face corridor overflows
    pub fn navigate_into(&mut self, start: Vec2, end: Vec2, path: &mut NavPath) -> Result<bool, NavError> {
        plan(&self.mesh, &mut self.scratch, &self.config, start, end, path)
    }

    /// Faces of the corridor found by the last query
    pub fn last_corridor(&self) -> &[FaceId] {
        self.scratch.corridor()
    }

    /// Face containing `p`, or the nearest face and the closest point on it
    pub fn clamped_face_index(&self, p: Vec2) -> Option<(FaceId, Vec2)> {
        self.mesh.clamped_face_index(p)
    }

    /// Closest point to `p` on a face
    pub fn closest_point_on_face(&self, face: FaceId, p: Vec2) -> Vec2 {
        self.mesh.closest_point_on_face(face, p)
    }

    /// Segment query against the physics world
    pub fn ray_cast(
        &self,
        world: &dyn CollisionWorld,
        start: Vec2,
        end: Vec2,
        mask: u32,
        ignore_mask: u32,
    ) -> Option<BodyHandle> {
        world.ray_cast(start, end, mask, ignore_mask)
    }

    /// Uniformly sampled point on the mesh
    ///
    /// Falls back to clamping the last sample onto the nearest face.
    pub fn random_navigable_point(&self, rng: &mut dyn RandomSource) -> Vec2 {
        let half = self.mesh.half_extents();
        let mut p = Vec2::ZERO;
        for _ in 0..RANDOM_POINT_TRIES {
            p = Vec2::new(rng.real(-half.x, half.x), rng.real(-half.y, half.y));
            if self.mesh.find_face(p).is_some() {
                return p;
            }
        }
        self.mesh.clamped_face_index(p).map_or(p, |(_, q)| q)
    }

    /// Draw the mesh, last corridor and an optional path
    pub fn debug_render(&self, draw: &mut dyn DebugDraw, config: &DebugConfig, path: Option<&NavPath>) {
        if config.draw_mesh {
            for face in 0..self.mesh.face_count() as FaceId {
                draw.polygon(&self.mesh.face_points(face), config.mesh_color);
            }
        }
        if config.draw_corridor {
            for &face in self.last_corridor() {
                draw.polygon(&self.mesh.face_points(face), config.corridor_color);
            }
        }
        if config.draw_search {
            for &face in self.last_corridor() {
                draw.circle(self.mesh.center(face), config.waypoint_radius, config.corridor_color);
            }
        }
        if config.draw_paths {
            if let Some(path) = path {
                render_path(draw, config, path);
            }
        }
    }
}

/// Draw one path with waypoint markers
pub fn render_path(draw: &mut dyn DebugDraw, config: &DebugConfig, path: &NavPath) {
    draw.polyline(path.points(), config.path_color);
    for &p in path.points() {
        draw.circle(p, config.waypoint_radius, config.path_color);
    }
}

fn plan(
    mesh: &NavMesh,
    scratch: &mut SearchScratch,
    config: &NavConfig,
    start: Vec2,
    end: Vec2,
    path: &mut NavPath,
) -> Result<bool, NavError> {
    path.clear();
    let (Some((start_face, start_pos)), Some((end_face, end_pos))) =
        (mesh.clamped_face_index(start), mesh.clamped_face_index(end))
    else {
        return Err(NavError::EmptyMesh);
    };
    let query = &config.query;
    let end_clamped = end_pos.distance(end) > query.clamp_tolerance;

    let result = scratch.search(mesh, start_face, start_pos, end_face, end_pos, query.metric);
    let goal = if result.reached {
        end_pos
    } else {
        mesh.closest_point_on_face(result.end_face, end)
    };

    let corridor = scratch.build_corridor(result.end_face, config.max_corridor_len)?;
    string_pull(mesh, corridor, start_pos, goal, query.funnel_epsilon, path);

    let found = result.reached && !end_clamped;
    log::debug!(
        "Nav: {start} -> {end}: faces {start_face} -> {}, corridor {}, {} waypoints, found={found}",
        result.end_face,
        corridor.len(),
        path.len()
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::core::{DebugLines, DistanceMetric};
    use crate::physics::{Physics, category};

    fn world_with_box(center: Vec2, half: Vec2) -> Physics {
        let mut physics = Physics::new();
        physics.create_static_box(center, 0.0, half);
        physics
    }

    fn inside_mesh(mesh: &NavMesh, p: Vec2) -> bool {
        mesh.find_face(p).is_some()
            || mesh
                .clamped_face_index(p)
                .is_some_and(|(_, q)| q.distance(p) < 1e-3)
    }

    #[test]
    fn test_empty_world_straight_line() {
        let physics = Physics::new();
        let mut nav = Navigation::build(&physics, 50.0, 50.0, NavConfig::default()).unwrap();
        let handle = nav.obtain_path().unwrap();

        let found = nav
            .navigate(Vec2::ZERO, Vec2::new(10.0, 10.0), &handle)
            .unwrap();
        assert!(found);
        let path = nav.path(&handle).unwrap();
        assert_eq!(path.len(), 2);
        assert!(path.vertex(0).unwrap().length() < 1e-4);
        assert!((path.vertex(1).unwrap() - Vec2::new(10.0, 10.0)).length() < 1e-4);

        nav.return_path(handle);
        assert_eq!(nav.pool().active_count(), 0);
    }

    #[test]
    fn test_path_bends_around_obstacle() {
        let physics = world_with_box(Vec2::ZERO, Vec2::new(2.0, 8.0));
        let mut nav = Navigation::build(&physics, 30.0, 30.0, NavConfig::default()).unwrap();
        let start = Vec2::new(-10.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        assert!(physics.ray_cast(start, end, category::STATIC, 0).is_some());

        for metric in [DistanceMetric::FaceCenter, DistanceMetric::EdgeMidpoint] {
            nav.set_query_config(QueryConfig::default().with_metric(metric));
            let mut path = NavPath::new();
            assert!(nav.navigate_into(start, end, &mut path).unwrap());
            assert!(path.len() >= 3, "expected a bend, got {:?}", path.points());
            for pair in path.points().windows(2) {
                assert!(
                    nav.ray_cast(&physics, pair[0], pair[1], category::STATIC, 0).is_none(),
                    "segment {pair:?} hits the obstacle"
                );
            }
            for &p in path.points() {
                assert!(inside_mesh(nav.mesh(), p));
            }
            let corridor = nav.last_corridor().to_vec();
            let naive = crate::nav::funnel::center_path_length(nav.mesh(), &corridor, start, end);
            assert!(path.total_length() <= naive + 1e-3);
        }
    }

    #[test]
    fn test_destination_inside_obstacle_is_partial() {
        let physics = world_with_box(Vec2::new(10.0, 0.0), Vec2::new(3.0, 3.0));
        let mut nav = Navigation::build(&physics, 30.0, 30.0, NavConfig::default()).unwrap();
        let target = Vec2::new(10.0, 0.0);

        let mut path = NavPath::new();
        let found = nav.navigate_into(Vec2::new(-10.0, 0.0), target, &mut path).unwrap();
        assert!(!found);

        let last = path.destination().unwrap();
        assert!(last.distance(target) > 1.0);
        // Ends on the mesh boundary, outside the inflated obstacle
        assert!(inside_mesh(nav.mesh(), last));
        assert!(!physics.is_point_blocked(last));
    }

    #[test]
    fn test_unreachable_island_is_partial() {
        // A ring of walls encloses the right side of the level
        let mut physics = Physics::new();
        physics.create_static_box(Vec2::new(15.0, 10.0), 0.0, Vec2::new(10.0, 1.0));
        physics.create_static_box(Vec2::new(15.0, -10.0), 0.0, Vec2::new(10.0, 1.0));
        physics.create_static_box(Vec2::new(6.0, 0.0), 0.0, Vec2::new(1.0, 11.0));
        physics.create_static_box(Vec2::new(24.0, 0.0), 0.0, Vec2::new(1.0, 11.0));
        let mut nav = Navigation::build(&physics, 30.0, 30.0, NavConfig::default()).unwrap();

        let target = Vec2::new(15.0, 0.0);
        assert!(nav.mesh().find_face(target).is_some());

        let mut path = NavPath::new();
        let found = nav.navigate_into(Vec2::new(-20.0, 0.0), target, &mut path).unwrap();
        assert!(!found);
        assert!(path.len() >= 2);
        for pair in path.points().windows(2) {
            assert!(physics.ray_cast(pair[0], pair[1], category::STATIC, 0).is_none());
        }
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let physics = Physics::new();
        let config = NavConfig::default().with_path_pool_size(1);
        let mut nav = Navigation::build(&physics, 10.0, 10.0, config).unwrap();

        let handle = nav.obtain_path().unwrap();
        assert!(matches!(nav.obtain_path(), Err(NavError::PoolExhausted { capacity: 1 })));
        nav.return_path(handle);
        assert!(nav.obtain_path().is_ok());
    }

    #[test]
    fn test_empty_mesh_is_an_error() {
        let mesh = NavMesh::new(10.0, 10.0, &NavConfig::default());
        let mut nav = Navigation::from_mesh(mesh, NavConfig::default());
        let mut path = NavPath::new();
        assert_eq!(
            nav.navigate_into(Vec2::ZERO, Vec2::ONE, &mut path),
            Err(NavError::EmptyMesh)
        );
    }

    #[test]
    fn test_random_points_are_walkable() {
        let physics = world_with_box(Vec2::ZERO, Vec2::new(5.0, 5.0));
        let nav = Navigation::build(&physics, 20.0, 20.0, NavConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let p = nav.random_navigable_point(&mut rng);
            assert!(inside_mesh(nav.mesh(), p));
            assert!(!physics.is_point_blocked(p));
        }
    }

    #[test]
    fn test_debug_render_draws_mesh_and_path() {
        let physics = Physics::new();
        let mut nav = Navigation::build(&physics, 10.0, 10.0, NavConfig::default()).unwrap();
        let mut path = NavPath::new();
        nav.navigate_into(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0), &mut path)
            .unwrap();

        let mut lines = DebugLines::new();
        nav.debug_render(&mut lines, &DebugConfig::default(), Some(&path));
        assert!(lines.line_count() >= nav.mesh().face_count() * 3 + 1);

        lines.clear();
        nav.debug_render(&mut lines, &DebugConfig::disabled(), Some(&path));
        assert!(lines.shapes().is_empty());
    }
}
