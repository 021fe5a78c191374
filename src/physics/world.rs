//! Physics simulation using rapier2d

use glam::Vec2;
use rapier2d::prelude::*;
use smallvec::SmallVec;

use super::{CollisionWorld, category};
use crate::core::{EventQueue, GameEvent};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub rapier2d::dynamics::RigidBodyHandle);

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub rapier2d::geometry::ColliderHandle);

/// Identifier of a sensor registered with [`Physics::add_sensor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(pub u32);

/// Shape of a sensor collider, in body-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum SensorShape {
    /// Box centred on `offset`
    Box {
        /// Half extents
        half_extents: Vec2,
        /// Local centre
        offset: Vec2,
    },
    /// Convex polygon
    Polygon(Vec<Vec2>),
}

/// Body currently overlapping a sensor
#[derive(Debug, Clone, Copy)]
struct Overlap {
    collider: rapier2d::geometry::ColliderHandle,
    body: BodyHandle,
    category: u32,
}

#[derive(Debug)]
struct SensorEntry {
    id: SensorId,
    collider: rapier2d::geometry::ColliderHandle,
    touching: SmallVec<[Overlap; 4]>,
}

/// Segments circles are approximated with in static outlines
const CIRCLE_SEGMENTS: usize = 12;

fn groups(memberships: u32, filter: u32) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(memberships),
        Group::from_bits_truncate(filter),
    )
}

/// Physics world manager
pub struct Physics {
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Query pipeline for ray casts
    query_pipeline: QueryPipeline,
    integration_parameters: IntegrationParameters,
    sensors: Vec<SensorEntry>,
    next_sensor: u32,
}

impl Physics {
    /// Create an empty top-down world (no gravity)
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            sensors: Vec::new(),
            next_sensor: 0,
        }
    }

    /// Step the physics simulation
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &vector![0.0, 0.0],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Rebuild ray cast acceleration after adding bodies outside of `step`
    pub fn sync_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Create a static box obstacle
    pub fn create_static_box(&mut self, center: Vec2, angle: f32, half_extents: Vec2) -> BodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![center.x, center.y])
            .rotation(angle)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .collision_groups(groups(category::STATIC, category::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.sync_queries();

        BodyHandle(handle)
    }

    /// Create a static convex obstacle from world-space points
    ///
    /// Returns `None` if the points do not span a convex hull.
    pub fn create_static_polygon(&mut self, points: &[Vec2]) -> Option<BodyHandle> {
        let hull: Vec<Point<Real>> = points.iter().map(|p| point![p.x, p.y]).collect();
        let collider = ColliderBuilder::convex_hull(&hull)?
            .collision_groups(groups(category::STATIC, category::ALL))
            .build();

        let handle = self.rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.sync_queries();

        Some(BodyHandle(handle))
    }

    /// Create a circular agent body that is steered by velocity
    pub fn create_agent(
        &mut self,
        position: Vec2,
        angle: f32,
        radius: f32,
        member: u32,
    ) -> BodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y])
            .rotation(angle)
            .lock_rotations()
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .density(1.0)
            .collision_groups(groups(member, category::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.sync_queries();

        BodyHandle(handle)
    }

    /// Attach a sensor to a body
    ///
    /// The sensor reports overlaps with colliders whose category is in
    /// `mask` through [`drain_sensor_events`](Self::drain_sensor_events).
    pub fn add_sensor(&mut self, body: BodyHandle, shape: &SensorShape, mask: u32) -> Option<SensorId> {
        let builder = match shape {
            SensorShape::Box {
                half_extents,
                offset,
            } => ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                .translation(vector![offset.x, offset.y]),
            SensorShape::Polygon(points) => {
                let hull: Vec<Point<Real>> = points.iter().map(|p| point![p.x, p.y]).collect();
                ColliderBuilder::convex_hull(&hull)?
            }
        };
        let collider = builder
            .sensor(true)
            .collision_groups(groups(category::SENSOR, mask))
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body.0, &mut self.rigid_body_set);

        let id = SensorId(self.next_sensor);
        self.next_sensor += 1;
        self.sensors.push(SensorEntry {
            id,
            collider,
            touching: SmallVec::new(),
        });
        Some(id)
    }

    /// Compare sensor overlaps with the previous call and push the changes
    ///
    /// Call once per frame after [`step`](Self::step).
    pub fn drain_sensor_events(&mut self, events: &mut EventQueue) {
        for sensor in &mut self.sensors {
            let mut current: SmallVec<[Overlap; 4]> = SmallVec::new();
            for (c1, c2, intersecting) in self.narrow_phase.intersection_pairs_with(sensor.collider) {
                if !intersecting {
                    continue;
                }
                let other = if c1 == sensor.collider { c2 } else { c1 };
                let Some(collider) = self.collider_set.get(other) else {
                    continue;
                };
                let Some(parent) = collider.parent() else {
                    continue;
                };
                current.push(Overlap {
                    collider: other,
                    body: BodyHandle(parent),
                    category: collider.collision_groups().memberships.bits(),
                });
            }

            for overlap in &current {
                if !sensor.touching.iter().any(|o| o.collider == overlap.collider) {
                    events.push(GameEvent::ContactBegan {
                        sensor: sensor.id,
                        other: overlap.body,
                        other_category: overlap.category,
                    });
                }
            }
            for overlap in &sensor.touching {
                if !current.iter().any(|o| o.collider == overlap.collider) {
                    events.push(GameEvent::ContactEnded {
                        sensor: sensor.id,
                        other: overlap.body,
                        other_category: overlap.category,
                    });
                }
            }
            sensor.touching = current;
        }
    }

    /// Get the position of a body
    pub fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let pos = rb.translation();
            Vec2::new(pos.x, pos.y)
        })
    }

    /// Get the rotation angle of a body
    pub fn angle(&self, body: BodyHandle) -> Option<f32> {
        self.rigid_body_set.get(body.0).map(|rb| rb.rotation().angle())
    }

    /// Get the linear velocity of a body
    pub fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let vel = rb.linvel();
            Vec2::new(vel.x, vel.y)
        })
    }

    /// Set the linear velocity of a body
    pub fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    /// Set the rotation angle of a body
    pub fn set_angle(&mut self, body: BodyHandle, angle: f32) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_rotation(Rotation::new(angle), true);
        }
    }

    /// Teleport a body
    pub fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_translation(vector![position.x, position.y], true);
        }
    }

    /// Cast a segment and return the first hit
    pub fn raycast(&self, start: Vec2, end: Vec2, filter_bits: u32) -> Option<RaycastHit> {
        let dir = end - start;
        if dir.length_squared() <= f32::EPSILON {
            return None;
        }
        let ray = Ray::new(point![start.x, start.y], vector![dir.x, dir.y]);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(groups(category::ALL, filter_bits));

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                1.0,
                true,
                filter,
            )
            .and_then(|(handle, toi)| {
                let body = self.collider_set.get(handle)?.parent()?;
                let point = ray.point_at(toi);
                Some(RaycastHit {
                    body: BodyHandle(body),
                    collider: ColliderHandle(handle),
                    point: Vec2::new(point.x, point.y),
                    fraction: toi,
                })
            })
    }

    /// Remove a body together with its colliders and sensors
    pub fn remove_body(&mut self, body: BodyHandle) {
        self.rigid_body_set.remove(
            body.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        let colliders = &self.collider_set;
        self.sensors.retain(|s| colliders.contains(s.collider));
        self.sync_queries();
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld for Physics {
    fn static_polygons(&self) -> Vec<Vec<Vec2>> {
        let mut polygons = Vec::new();
        for (_, rb) in self.rigid_body_set.iter() {
            if !rb.is_fixed() {
                continue;
            }
            for handle in rb.colliders() {
                let Some(collider) = self.collider_set.get(*handle) else {
                    continue;
                };
                if collider.is_sensor() {
                    continue;
                }
                let iso = collider.position();
                let shape = collider.shape();
                let local: Vec<Point<Real>> = if let Some(cuboid) = shape.as_cuboid() {
                    let h = cuboid.half_extents;
                    vec![
                        point![-h.x, -h.y],
                        point![h.x, -h.y],
                        point![h.x, h.y],
                        point![-h.x, h.y],
                    ]
                } else if let Some(poly) = shape.as_convex_polygon() {
                    poly.points().to_vec()
                } else if let Some(ball) = shape.as_ball() {
                    (0..CIRCLE_SEGMENTS)
                        .map(|i| {
                            let a = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
                            point![ball.radius * a.cos(), ball.radius * a.sin()]
                        })
                        .collect()
                } else {
                    log::debug!("Physics: unsupported static shape skipped");
                    continue;
                };
                polygons.push(
                    local
                        .iter()
                        .map(|p| {
                            let w = iso * p;
                            Vec2::new(w.x, w.y)
                        })
                        .collect(),
                );
            }
        }
        polygons
    }

    fn ray_cast(&self, start: Vec2, end: Vec2, mask: u32, ignore_mask: u32) -> Option<BodyHandle> {
        self.raycast(start, end, mask & !ignore_mask).map(|hit| hit.body)
    }

    fn is_point_blocked(&self, p: Vec2) -> bool {
        let pt = point![p.x, p.y];
        self.collider_set.iter().any(|(_, collider)| {
            !collider.is_sensor()
                && collider.collision_groups().memberships.bits() & category::STATIC != 0
                && collider.shape().contains_point(collider.position(), &pt)
        })
    }
}

/// Result of a raycast
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// Body owning the hit collider
    pub body: BodyHandle,
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// The point of intersection
    pub point: Vec2,
    /// Fraction of the segment travelled before the hit
    pub fraction: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_box_outline_is_world_space() {
        let mut physics = Physics::new();
        physics.create_static_box(Vec2::new(5.0, 0.0), 0.0, Vec2::new(1.0, 2.0));

        let polygons = physics.static_polygons();
        assert_eq!(polygons.len(), 1);
        let xs: Vec<f32> = polygons[0].iter().map(|p| p.x).collect();
        assert!(xs.iter().all(|x| (*x - 4.0).abs() < 1e-5 || (*x - 6.0).abs() < 1e-5));
    }

    #[test]
    fn test_static_polygon_is_convex_hull() {
        let mut physics = Physics::new();
        let triangle = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0)];
        assert!(physics.create_static_polygon(&triangle).is_some());

        let polygons = physics.static_polygons();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 3);
        assert!(physics.is_point_blocked(Vec2::new(1.0, 1.0)));
        assert!(!physics.is_point_blocked(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_agents_are_not_static_geometry() {
        let mut physics = Physics::new();
        physics.create_agent(Vec2::ZERO, 0.0, 1.0, category::GUARD);
        assert!(physics.static_polygons().is_empty());
    }

    #[test]
    fn test_ray_cast_respects_masks() {
        let mut physics = Physics::new();
        let wall = physics.create_static_box(Vec2::ZERO, 0.0, Vec2::new(1.0, 5.0));
        let guard = physics.create_agent(Vec2::new(5.0, 0.0), 0.0, 1.0, category::GUARD);

        let start = Vec2::new(-10.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        assert_eq!(physics.ray_cast(start, end, category::ALL, 0), Some(wall));
        assert_eq!(physics.ray_cast(start, end, category::GUARD, 0), Some(guard));
        assert_eq!(
            physics.ray_cast(start, end, category::ALL, category::STATIC | category::GUARD),
            None
        );
        assert!(physics.is_segment_clear(Vec2::new(-10.0, 8.0), Vec2::new(10.0, 8.0), category::ALL));
    }

    #[test]
    fn test_point_blocked() {
        let mut physics = Physics::new();
        physics.create_static_box(Vec2::ZERO, 0.5, Vec2::new(1.0, 1.0));
        assert!(physics.is_point_blocked(Vec2::ZERO));
        assert!(!physics.is_point_blocked(Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_sensor_reports_begin_and_end() {
        let mut physics = Physics::new();
        let guard = physics.create_agent(Vec2::ZERO, 0.0, 0.5, category::GUARD);
        let sensor = physics
            .add_sensor(
                guard,
                &SensorShape::Box {
                    half_extents: Vec2::new(0.5, 2.0),
                    offset: Vec2::new(0.0, 2.0),
                },
                category::STATIC,
            )
            .unwrap();
        physics.create_static_box(Vec2::new(0.0, 3.0), 0.0, Vec2::new(2.0, 0.5));

        let mut events = EventQueue::new();
        physics.step(1.0 / 60.0);
        physics.drain_sensor_events(&mut events);
        events.swap();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::ContactBegan { sensor: s, other_category, .. }
                if *s == sensor && other_category & category::STATIC != 0
        )));

        physics.set_position(guard, Vec2::new(20.0, 0.0));
        physics.step(1.0 / 60.0);
        physics.drain_sensor_events(&mut events);
        events.swap();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::ContactEnded { sensor: s, .. } if *s == sensor)));
    }
}
