//! Frame-stepped level runtime
//!
//! Wires the physics world, the navigation mesh, agent brains and the event
//! queue together. One [`Level::update`] call is one frame:
//!
//! 1. swap the event queue and dispatch last frame's events
//! 2. copy agent kinematics out of physics
//! 3. run every brain against the read-only mesh
//! 4. write velocities and headings back
//! 5. step physics and drain sensor contacts for the next frame

use glam::Vec2;
use hecs::Entity;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use super::components::{Body, Name, Obstacle, Sensors};
use crate::ai::{
    AgentBody, AgentState, Brain, BrainContext, GuardBrain, GuardSensors, GuardState, PlayerBrain,
    PlayerInput, PlayerSighting,
};
use crate::core::{Color, DebugConfig, DebugDraw, EventQueue, GameEvent, LevelConfig, NavError};
use crate::nav::Navigation;
use crate::physics::{BodyHandle, CollisionWorld, Physics, SensorId, SensorShape, category};

const AGENT_COLOR: Color = Color::rgb(0.9, 0.2, 0.2);
const OBSTACLE_COLOR: Color = Color::rgb(0.6, 0.6, 0.6);

/// A running level
pub struct Level {
    config: LevelConfig,
    world: hecs::World,
    physics: Physics,
    navigation: Option<Navigation>,
    events: EventQueue,
    rng: StdRng,
    bodies: FxHashMap<BodyHandle, Entity>,
    sensors: FxHashMap<SensorId, Entity>,
    player: Option<Entity>,
    captures: u32,
    debug: DebugConfig,
}

impl Level {
    /// Empty level; `seed` drives every random decision
    pub fn new(config: LevelConfig, seed: u64) -> Self {
        Self {
            config,
            world: hecs::World::new(),
            physics: Physics::new(),
            navigation: None,
            events: EventQueue::new(),
            rng: StdRng::seed_from_u64(seed),
            bodies: FxHashMap::default(),
            sensors: FxHashMap::default(),
            player: None,
            captures: 0,
            debug: DebugConfig::default(),
        }
    }

    /// Level configuration
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Physics world
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Navigation, once built
    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    /// Debug overlay settings
    pub fn debug_config_mut(&mut self) -> &mut DebugConfig {
        &mut self.debug
    }

    /// Add a static box
    ///
    /// Static geometry is only picked up by the next
    /// [`build_navigation`](Self::build_navigation).
    pub fn spawn_static_box(&mut self, center: Vec2, angle: f32, half_extents: Vec2) -> Entity {
        if self.navigation.is_some() {
            log::warn!("Level: static box added after navigation was built");
        }
        let handle = self.physics.create_static_box(center, angle, half_extents);
        let entity = self.world.spawn((
            Body(handle),
            Obstacle {
                center,
                angle,
                half_extents,
            },
        ));
        self.bodies.insert(handle, entity);
        entity
    }

    /// Build the navigation mesh from the current static geometry
    ///
    /// # Errors
    ///
    /// Propagates mesh build failures
    pub fn build_navigation(&mut self) -> Result<(), NavError> {
        let navigation = Navigation::build(
            &self.physics,
            self.config.half_width,
            self.config.half_height,
            self.config.nav.clone(),
        )?;
        log::info!(
            "Level: navigation ready, {} faces over {} vertices",
            navigation.mesh().face_count(),
            navigation.mesh().vertex_count()
        );
        self.navigation = Some(navigation);
        Ok(())
    }

    /// Spawn a guard facing +Y
    ///
    /// # Errors
    ///
    /// [`NavError::EmptyMesh`] before [`build_navigation`](Self::build_navigation)
    /// and [`NavError::InvalidSensorShape`] for a degenerate vision cone
    pub fn spawn_guard(&mut self, position: Vec2) -> Result<Entity, NavError> {
        if self.navigation.is_none() {
            return Err(NavError::EmptyMesh);
        }
        let config = self.config.guard.clone();
        let body = self
            .physics
            .create_agent(position, 0.0, config.body_radius, category::GUARD);

        let (bx, by) = config.bump_half_extents;
        let (ox, oy) = config.bump_offset;
        let bump = |offset: Vec2| SensorShape::Box {
            half_extents: Vec2::new(bx, by),
            offset,
        };
        let vision = SensorShape::Polygon(vec![
            Vec2::ZERO,
            Vec2::new(config.vision_half_width, config.vision_range),
            Vec2::new(-config.vision_half_width, config.vision_range),
        ]);
        let bump_mask = category::STATIC | category::GUARD;
        let ids = (
            self.physics.add_sensor(body, &bump(Vec2::new(-ox, oy)), bump_mask),
            self.physics.add_sensor(body, &bump(Vec2::new(ox, oy)), bump_mask),
            self.physics.add_sensor(body, &vision, category::PLAYER),
        );
        let (Some(left), Some(right), Some(vision)) = ids else {
            log::error!("Level: guard sensor rejected by physics, check the vision cone");
            self.physics.remove_body(body);
            return Err(NavError::InvalidSensorShape);
        };

        let brain = Brain::Guard(GuardBrain::new(config, GuardSensors::new(left, right, vision)));
        let entity = self.spawn_agent(body, position, brain, "Guard", &[left, right, vision]);
        log::debug!("Level: guard {entity:?} spawned at {position}");
        Ok(entity)
    }

    /// Spawn the player, replacing any previous one
    pub fn spawn_player(&mut self, position: Vec2) -> Entity {
        if let Some(old) = self.player.take() {
            log::warn!("Level: replacing player {old:?}");
            self.despawn(old);
        }
        let body = self.physics.create_agent(
            position,
            0.0,
            self.config.player.body_radius,
            category::PLAYER,
        );
        let brain = Brain::Player(PlayerBrain::new(self.config.player.clone()));
        let entity = self.spawn_agent(body, position, brain, "Player", &[]);
        self.player = Some(entity);
        entity
    }

    fn spawn_agent(
        &mut self,
        body: BodyHandle,
        position: Vec2,
        mut brain: Brain,
        name: &str,
        sensors: &[SensorId],
    ) -> Entity {
        let state = AgentState::new(position, 0.0);
        let entity = self.world.reserve_entity();

        if let Some(navigation) = self.navigation.as_mut() {
            let player = player_sighting(&self.world, self.player);
            let mut ctx = BrainContext {
                dt: 0.0,
                entity,
                navigation,
                world: &self.physics,
                rng: &mut self.rng,
                events: &mut self.events,
                player,
            };
            brain.on_initialize(&state, &mut ctx);
        } else if let Brain::Player(player) = &mut brain {
            player.on_initialize(entity);
        }

        self.world.spawn_at(
            entity,
            (
                Body(body),
                state,
                brain,
                Sensors(sensors.to_vec()),
                Name::new(name),
            ),
        );
        self.bodies.insert(body, entity);
        for &id in sensors {
            self.sensors.insert(id, entity);
        }
        entity
    }

    /// The player entity
    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// Feed the player brain
    pub fn set_player_input(&mut self, input: PlayerInput) -> bool {
        let Some(player) = self.player else {
            return false;
        };
        self.world
            .get::<&mut Brain>(player)
            .is_ok_and(|mut brain| brain.set_player_input(input))
    }

    /// Broadcast a sound to every guard next frame
    pub fn emit_sound(&mut self, position: Vec2, volume: f32) {
        self.events.push(GameEvent::SoundEmitted {
            position,
            volume,
            source: None,
        });
    }

    /// Report a sound straight to one guard
    pub fn report_sound(&mut self, guard: Entity, position: Vec2, volume: f32) -> bool {
        self.world
            .get::<&mut Brain>(guard)
            .ok()
            .and_then(|mut brain| brain.as_guard_mut().map(|g| g.report_sound(position, volume)))
            .unwrap_or(false)
    }

    /// Remove an entity, its body and its sensors, and return its path
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.world.contains(entity) {
            return false;
        }
        if let Ok(name) = self.world.get::<&Name>(entity) {
            log::debug!("Level: despawning {} {entity:?}", name.0);
        }
        if let (Ok(mut brain), Some(navigation)) =
            (self.world.get::<&mut Brain>(entity), self.navigation.as_mut())
        {
            brain.release(navigation);
        }
        if let Ok(sensors) = self.world.get::<&Sensors>(entity) {
            for id in &sensors.0 {
                self.sensors.remove(id);
            }
        }
        let body = self.world.get::<&Body>(entity).ok().map(|b| b.0);
        if let Some(body) = body {
            self.bodies.remove(&body);
            self.physics.remove_body(body);
        }
        if self.player == Some(entity) {
            self.player = None;
        }
        self.world.despawn(entity).is_ok()
    }

    /// Advance one frame
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        self.events.swap();
        let events: Vec<GameEvent> = self.events.drain().collect();
        for event in &events {
            self.dispatch(event);
        }

        for (_, (&Body(body), state)) in self.world.query_mut::<(&Body, &mut AgentState)>() {
            if let Some(p) = self.physics.position(body) {
                state.position = p;
            }
            if let Some(angle) = self.physics.angle(body) {
                state.angle = angle;
            }
            if let Some(v) = self.physics.linear_velocity(body) {
                state.linear_velocity = v;
            }
        }

        let player = player_sighting(&self.world, self.player);
        if let Some(navigation) = self.navigation.as_mut() {
            for (entity, (state, brain)) in self.world.query_mut::<(&mut AgentState, &mut Brain)>() {
                let mut ctx = BrainContext {
                    dt,
                    entity,
                    navigation: &mut *navigation,
                    world: &self.physics,
                    rng: &mut self.rng,
                    events: &mut self.events,
                    player,
                };
                brain.update(state, &mut ctx);
                state.integrate_rotation(dt);
            }
        } else {
            // Guards wait for a mesh; the player can already walk around
            for (entity, (state, brain)) in self.world.query_mut::<(&mut AgentState, &mut Brain)>() {
                if let Brain::Player(player) = brain {
                    player.update(state, dt, entity, &mut self.events);
                    state.integrate_rotation(dt);
                }
            }
        }

        for (_, (&Body(body), state)) in self.world.query_mut::<(&Body, &AgentState)>() {
            self.physics.set_linear_velocity(body, state.linear_velocity);
            self.physics.set_angle(body, state.angle);
        }

        self.physics.step(dt);
        self.physics.drain_sensor_events(&mut self.events);
    }

    fn dispatch(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::ContactBegan { sensor, .. } | GameEvent::ContactEnded { sensor, .. } => {
                let Some(&entity) = self.sensors.get(&sensor) else {
                    return;
                };
                if let Ok(mut brain) = self.world.get::<&mut Brain>(entity) {
                    brain.on_event(event);
                }
            }
            GameEvent::SoundEmitted { source, .. } => {
                for (entity, brain) in self.world.query_mut::<&mut Brain>() {
                    if source != Some(entity) {
                        brain.on_event(event);
                    }
                }
            }
            GameEvent::PlayerCaptured { guard, position } => {
                self.captures += 1;
                log::info!("Level: player captured by {guard:?} at {position}");
            }
            GameEvent::StateChanged { entity, state } => {
                log::trace!("Level: {entity:?} is now {state}");
            }
        }
    }

    /// First entity hit by the segment `start -> end`
    ///
    /// Only bodies whose category intersects `mask` and not `ignore_mask`
    /// count.
    pub fn ray_cast(&self, start: Vec2, end: Vec2, mask: u32, ignore_mask: u32) -> Option<Entity> {
        let body = self.physics.ray_cast(start, end, mask, ignore_mask)?;
        self.bodies.get(&body).copied()
    }

    /// Behaviour state of a guard
    pub fn guard_state(&self, entity: Entity) -> Option<GuardState> {
        self.world
            .get::<&Brain>(entity)
            .ok()
            .and_then(|brain| brain.guard_state())
    }

    /// Position of an agent as of the last update
    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.world
            .get::<&AgentState>(entity)
            .ok()
            .map(|state| state.position)
    }

    /// Captures seen so far
    pub fn captures(&self) -> u32 {
        self.captures
    }

    /// Number of live entities
    pub fn entity_count(&self) -> u32 {
        self.world.len()
    }

    /// Draw navigation, obstacles, agents and brain state
    pub fn debug_render(&self, draw: &mut dyn DebugDraw) {
        if let Some(navigation) = &self.navigation {
            navigation.debug_render(draw, &self.debug, None);
        }
        for obstacle in self.world.query::<&Obstacle>().iter().map(|(_, o)| *o) {
            draw.polygon(&obstacle.corners(), OBSTACLE_COLOR);
        }
        for (_, (state, brain)) in self.world.query::<(&AgentState, &Brain)>().iter() {
            let radius = match brain {
                Brain::Guard(guard) => guard.config().body_radius,
                Brain::Player(_) => self.config.player.body_radius,
            };
            draw.circle(state.position, radius, AGENT_COLOR);
            draw.line(state.position, state.position + state.forward() * radius, AGENT_COLOR);
            if let Some(navigation) = &self.navigation {
                brain.debug_render(draw, navigation, &self.debug);
            }
        }
    }
}

fn player_sighting(world: &hecs::World, player: Option<Entity>) -> Option<PlayerSighting> {
    let player = player?;
    let body = world.get::<&Body>(player).ok()?.0;
    let position = world.get::<&AgentState>(player).ok()?.position;
    Some(PlayerSighting { body, position })
}
