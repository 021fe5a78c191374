//! Guard behaviour state machine
//!
//! Five states (Watch, Patrol, Suspect, Inspect, Chase) driven once per frame.
//! The guard reads the world through its bump and vision sensors, sound
//! reports and static ray casts, and moves only by setting velocities on its
//! [`AgentBody`].
//!
//! A partial path is walked like a full one. End-of-path and stuck handling
//! recover from unreachable destinations without special cases, and a failed
//! query simply leaves the guard with an exhausted path.

use std::fmt;

use glam::Vec2;

use super::body::AgentBody;
use super::brain::BrainContext;
use super::sensors::{LocalSensor, VisionSensor};
use super::steering::{Arrive, Face, Seek, SteeringBehavior};
use crate::core::{DebugConfig, DebugDraw, GameEvent, GuardConfig};
use crate::nav::{Navigation, PathHandle, render_path};
use crate::physics::{SensorId, category};

// ============================================================================
// States
// ============================================================================

/// Guard behaviour state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GuardState {
    /// Standing still, sweeping left and right
    #[default]
    Watch,
    /// Walking to a random destination
    Patrol,
    /// Turning towards a sound
    Suspect,
    /// Walking to where a sound came from
    Inspect,
    /// Following the player
    Chase,
}

impl GuardState {
    /// State name for logging and events
    pub fn name(self) -> &'static str {
        match self {
            GuardState::Watch => "Watch",
            GuardState::Patrol => "Patrol",
            GuardState::Suspect => "Suspect",
            GuardState::Inspect => "Inspect",
            GuardState::Chase => "Chase",
        }
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Sensors
// ============================================================================

/// The sensors a guard carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSensors {
    /// Bump box in front of the left shoulder
    pub left: LocalSensor,
    /// Bump box in front of the right shoulder
    pub right: LocalSensor,
    /// Vision cone
    pub vision: VisionSensor,
}

impl GuardSensors {
    /// Sensors listening to the given physics sensor ids
    pub fn new(left: SensorId, right: SensorId, vision: SensorId) -> Self {
        Self {
            left: LocalSensor::new(left),
            right: LocalSensor::new(right),
            vision: VisionSensor::new(vision),
        }
    }

    fn on_event(&mut self, event: &GameEvent) -> bool {
        self.left.on_event(event) || self.right.on_event(event) || self.vision.on_event(event)
    }
}

// ============================================================================
// Guard Brain
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathProgress {
    Moving,
    Arrived,
}

/// Per-guard behaviour state
#[derive(Debug)]
pub struct GuardBrain {
    config: GuardConfig,
    sensors: GuardSensors,
    state: GuardState,
    /// Time left in the current state
    state_timer: f32,
    /// Time left in the current sweep direction
    sweep_timer: f32,
    /// +1 turns left, -1 turns right
    sweep_direction: f32,
    path: Option<PathHandle>,
    /// Index of the waypoint being walked to
    waypoint: usize,
    last_known_player: Option<Vec2>,
    stuck_meter: f32,
    /// Distance the last velocity command should have covered
    expected_step: f32,
    previous_position: Option<Vec2>,
    position: Vec2,
    /// Latched sound report, consumed by the next update
    heard: Option<Vec2>,
    suspect_point: Vec2,
    capture_cooldown: f32,
    captures: u32,
}

impl GuardBrain {
    /// Guard in the Watch state with no path yet
    pub fn new(config: GuardConfig, sensors: GuardSensors) -> Self {
        Self {
            config,
            sensors,
            state: GuardState::Watch,
            state_timer: 0.0,
            sweep_timer: 0.0,
            sweep_direction: 1.0,
            path: None,
            waypoint: 0,
            last_known_player: None,
            stuck_meter: 0.0,
            expected_step: 0.0,
            previous_position: None,
            position: Vec2::ZERO,
            heard: None,
            suspect_point: Vec2::ZERO,
            capture_cooldown: 0.0,
            captures: 0,
        }
    }

    /// Current behaviour state
    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Captures reported so far
    pub fn captures(&self) -> u32 {
        self.captures
    }

    /// Where the player was last confirmed
    pub fn last_known_player(&self) -> Option<Vec2> {
        self.last_known_player
    }

    /// Accumulated stuck distance
    pub fn stuck_meter(&self) -> f32 {
        self.stuck_meter
    }

    /// The guard's pooled path
    pub fn path_handle(&self) -> Option<&PathHandle> {
        self.path.as_ref()
    }

    /// The guard's sensors
    pub fn sensors(&self) -> &GuardSensors {
        &self.sensors
    }

    /// Guard configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Claim a path and start watching
    pub fn on_initialize(&mut self, body: &dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.position = body.position();
        self.previous_position = Some(self.position);
        match ctx.navigation.obtain_path() {
            Ok(handle) => self.path = Some(handle),
            Err(err) => log::error!("Guard {:?}: no path available: {err}", ctx.entity),
        }
        self.state = GuardState::Watch;
        self.state_timer = ctx.rng.real_in(self.config.initial_watch_time);
        self.sweep_timer = ctx.rng.real_in(self.config.sweep_time);
        self.sweep_direction = if ctx.rng.chance() { 1.0 } else { -1.0 };
    }

    /// Return the pooled path
    pub fn release(&mut self, navigation: &mut Navigation) {
        if let Some(handle) = self.path.take() {
            navigation.return_path(handle);
        }
    }

    /// Hear a sound at `position`
    ///
    /// Accepted only if `volume > k * distance^2` and the guard is not
    /// chasing. An accepted sound sends the guard into Suspect on its next
    /// update.
    pub fn report_sound(&mut self, position: Vec2, volume: f32) -> bool {
        if self.state == GuardState::Chase {
            return false;
        }
        let threshold = self.config.hearing_factor * self.position.distance_squared(position);
        if volume <= threshold {
            return false;
        }
        log::debug!("Guard heard a sound at {position} (volume {volume})");
        self.heard = Some(position);
        true
    }

    /// Feed a contact or sound event
    pub fn on_event(&mut self, event: &GameEvent) {
        if self.sensors.on_event(event) {
            return;
        }
        if let GameEvent::SoundEmitted {
            position, volume, ..
        } = *event
        {
            self.report_sound(position, volume);
        }
    }

    /// Advance one frame
    pub fn update(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.track_movement(body);
        self.state_timer -= ctx.dt;
        self.capture_cooldown = (self.capture_cooldown - ctx.dt).max(0.0);
        body.set_angular_velocity(0.0);

        let heard = self.heard.take();
        if self.state != GuardState::Chase {
            if let Some(target) = self.confirm_sighting(ctx) {
                self.enter_chase(target, ctx);
            } else if let Some(sound) = heard {
                self.enter_suspect(sound, body, ctx);
            }
        }

        match self.state {
            GuardState::Watch => self.update_watch(body, ctx),
            GuardState::Patrol => self.update_patrol(body, ctx),
            GuardState::Suspect => self.update_suspect(body, ctx),
            GuardState::Inspect => self.update_inspect(body, ctx),
            GuardState::Chase => self.update_chase(body, ctx),
        }
    }

    /// Draw the current path and what the guard is reacting to
    pub fn debug_render(&self, draw: &mut dyn DebugDraw, navigation: &Navigation, config: &DebugConfig) {
        if config.draw_paths {
            if let Some(path) = self.path.as_ref().and_then(|h| navigation.path(h)) {
                render_path(draw, config, path);
            }
        }
        if let Some(p) = self.last_known_player {
            draw.circle(p, config.waypoint_radius * 2.0, config.path_color);
        }
        if self.state == GuardState::Suspect {
            draw.line(self.position, self.suspect_point, config.corridor_color);
        }
    }

    // ------------------------------------------------------------------------
    // Per-state updates
    // ------------------------------------------------------------------------

    fn update_watch(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.stop(body);

        self.sweep_timer -= ctx.dt;
        let blocked = if self.sweep_direction > 0.0 {
            self.sensors.left.has_wall()
        } else {
            self.sensors.right.has_wall()
        };
        if blocked || self.sweep_timer <= 0.0 {
            self.sweep_direction = -self.sweep_direction;
            self.sweep_timer = ctx.rng.real_in(self.config.sweep_time);
        }
        body.set_angular_velocity(self.sweep_direction * self.config.sweep_speed);

        if self.state_timer <= 0.0 {
            self.enter_patrol(ctx);
        }
    }

    fn update_patrol(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.avoid_obstacles(body, ctx);

        if self.follow_path(self.config.patrol_speed, body, ctx) == PathProgress::Arrived {
            self.enter_watch(body, ctx);
            return;
        }
        if self.stuck_meter > self.config.stuck_threshold {
            log::debug!("Guard {:?}: stuck while patrolling, re-planning", ctx.entity);
            self.enter_patrol(ctx);
        }
    }

    fn update_suspect(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.stop(body);

        let face = Face::new(self.suspect_point - self.position, self.config.turn_speed);
        if face.remaining(body).abs() <= self.config.facing_tolerance {
            let scatter = ctx.rng.direction() * ctx.rng.real(0.0, self.config.inspect_offset);
            self.plan(self.suspect_point + scatter, ctx);
            self.set_state(GuardState::Inspect, ctx);
            return;
        }
        face.calculate(body).apply(body);

        if self.state_timer <= 0.0 {
            self.enter_patrol(ctx);
        }
    }

    fn update_inspect(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        if self.follow_path(self.config.inspect_speed, body, ctx) == PathProgress::Arrived {
            self.enter_watch(body, ctx);
        } else if self.stuck_meter > self.config.stuck_threshold {
            log::debug!("Guard {:?}: stuck while inspecting", ctx.entity);
            self.enter_patrol(ctx);
        }
    }

    fn update_chase(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        let sighting = self.confirm_sighting(ctx);
        if let Some(p) = sighting {
            self.last_known_player = Some(p);
            if self.position.distance(p) <= self.config.catch_distance && self.capture_cooldown <= 0.0 {
                self.capture_cooldown = self.config.capture_cooldown;
                self.captures += 1;
                log::info!("Guard {:?} caught the player at {p}", ctx.entity);
                ctx.events.push(GameEvent::PlayerCaptured {
                    guard: ctx.entity,
                    position: p,
                });
            }
        }

        if self.state_timer <= 0.0 {
            self.state_timer = self.config.chase_refresh;
            if let (Some(_), Some(target)) = (sighting, self.last_known_player) {
                self.plan(target, ctx);
            }
        }

        if self.follow_path(self.config.chase_speed, body, ctx) == PathProgress::Arrived {
            match sighting {
                Some(p) => body.set_rotation(p - self.position),
                None => {
                    log::debug!("Guard {:?}: lost the trail", ctx.entity);
                    self.last_known_player = None;
                    self.enter_watch(body, ctx);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn set_state(&mut self, state: GuardState, ctx: &mut BrainContext<'_>) {
        if self.state != state {
            log::debug!("Guard {:?}: {} -> {}", ctx.entity, self.state, state);
            ctx.events.push(GameEvent::StateChanged {
                entity: ctx.entity,
                state: state.name(),
            });
        }
        self.state = state;
        self.stuck_meter = 0.0;
    }

    fn enter_watch(&mut self, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.set_state(GuardState::Watch, ctx);
        self.state_timer = ctx.rng.real_in(self.config.watch_time);
        self.sweep_timer = ctx.rng.real_in(self.config.sweep_time);
        self.sweep_direction = if ctx.rng.chance() { 1.0 } else { -1.0 };
        self.stop(body);
    }

    fn enter_patrol(&mut self, ctx: &mut BrainContext<'_>) {
        let destination = ctx.navigation.random_navigable_point(ctx.rng);
        self.plan(destination, ctx);
        self.set_state(GuardState::Patrol, ctx);
    }

    fn enter_suspect(&mut self, sound: Vec2, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) {
        self.suspect_point = sound;
        self.set_state(GuardState::Suspect, ctx);
        self.state_timer = self.config.suspect_time;
        self.stop(body);
    }

    fn enter_chase(&mut self, target: Vec2, ctx: &mut BrainContext<'_>) {
        self.last_known_player = Some(target);
        self.set_state(GuardState::Chase, ctx);
        // Re-plan on the first chase tick
        self.state_timer = 0.0;
    }

    // ------------------------------------------------------------------------
    // Perception and movement
    // ------------------------------------------------------------------------

    /// Player position if the cone sees the player and no wall is in between
    fn confirm_sighting(&self, ctx: &BrainContext<'_>) -> Option<Vec2> {
        let player = ctx.player?;
        if self.sensors.vision.sighted() != Some(player.body) {
            return None;
        }
        if ctx
            .world
            .ray_cast(self.position, player.position, category::STATIC, 0)
            .is_some()
        {
            return None;
        }
        Some(player.position)
    }

    fn track_movement(&mut self, body: &dyn AgentBody) {
        let position = body.position();
        if let Some(previous) = self.previous_position {
            let actual = position.distance(previous);
            self.stuck_meter = (self.stuck_meter + self.expected_step - actual).max(0.0);
        }
        self.previous_position = Some(position);
        self.position = position;
        self.expected_step = 0.0;
    }

    fn stop(&mut self, body: &mut dyn AgentBody) {
        body.set_linear_velocity(Vec2::ZERO);
        self.expected_step = 0.0;
    }

    /// Navigate into the guard's path; the path is left empty on failure
    fn plan(&mut self, destination: Vec2, ctx: &mut BrainContext<'_>) {
        let Some(handle) = self.path.as_ref() else {
            return;
        };
        match ctx.navigation.navigate(self.position, destination, handle) {
            Ok(found) => {
                if !found {
                    log::debug!(
                        "Guard {:?}: {destination} unreachable, walking a partial path",
                        ctx.entity
                    );
                }
            }
            Err(err) => log::warn!("Guard {:?}: navigation failed: {err}", ctx.entity),
        }
        // Waypoint 0 is the start position
        self.waypoint = 1;
    }

    fn follow_path(&mut self, speed: f32, body: &mut dyn AgentBody, ctx: &mut BrainContext<'_>) -> PathProgress {
        let Some(path) = self.path.as_ref().and_then(|h| ctx.navigation.path(h)) else {
            self.stop(body);
            return PathProgress::Arrived;
        };

        let position = body.position();
        let target = loop {
            let Some(target) = path.vertex(self.waypoint) else {
                body.set_linear_velocity(Vec2::ZERO);
                self.expected_step = 0.0;
                return PathProgress::Arrived;
            };
            if position.distance(target) > self.config.waypoint_radius {
                break target;
            }
            self.waypoint += 1;
        };

        let output = if self.waypoint + 1 >= path.len() {
            Arrive::new(target, speed).calculate(body)
        } else {
            Seek::new(target, speed).calculate(body)
        };
        body.set_linear_velocity(output.linear);
        body.set_rotation(target - position);
        self.expected_step = output.linear.length() * ctx.dt;
        PathProgress::Moving
    }

    /// Side-step whatever the bump sensors touch
    ///
    /// The detour waypoint goes in front of the current target, merging with
    /// it when close. A full path falls back to re-planning to the
    /// destination.
    fn avoid_obstacles(&mut self, body: &dyn AgentBody, ctx: &mut BrainContext<'_>) {
        let left = self.sensors.left.has_obstacle();
        let right = self.sensors.right.has_obstacle();
        let side = match (left, right) {
            (false, false) => return,
            (true, false) | (true, true) => body.right(),
            (false, true) => -body.right(),
        };
        let detour = body.position()
            + body.forward() * self.config.avoid_ahead_offset
            + side * self.config.avoid_side_offset;
        if ctx.navigation.mesh().find_face(detour).is_none() {
            return;
        }

        let Some(path) = self.path.as_ref().and_then(|h| ctx.navigation.path_mut(h)) else {
            return;
        };
        // Never merge into the destination itself
        let inserted = if self.waypoint + 1 < path.len() {
            path.try_insert_vertex(self.waypoint, detour, self.config.avoid_merge_distance)
        } else {
            path.insert_vertex(self.waypoint, detour)
        };
        if inserted {
            return;
        }
        if let Some(destination) = path.destination() {
            log::debug!("Guard {:?}: path full, re-planning around obstacle", ctx.entity);
            self.plan(destination, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AgentState, PlayerSighting};
    use crate::core::{EventQueue, NavConfig};
    use crate::nav::MAX_PATH_LEN;
    use crate::physics::{BodyHandle, Physics};
    use hecs::Entity;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const LEFT: SensorId = SensorId(10);
    const RIGHT: SensorId = SensorId(11);
    const VISION: SensorId = SensorId(12);
    const DT: f32 = 0.05;

    struct Harness {
        physics: Physics,
        navigation: Navigation,
        rng: StdRng,
        events: EventQueue,
        body: AgentState,
        brain: GuardBrain,
        player: Option<PlayerSighting>,
    }

    impl Harness {
        fn new(physics: Physics, guard: Vec2) -> Self {
            let navigation = Navigation::build(&physics, 30.0, 30.0, NavConfig::default()).unwrap();
            let mut harness = Self {
                physics,
                navigation,
                rng: StdRng::seed_from_u64(7),
                events: EventQueue::new(),
                body: AgentState::new(guard, 0.0),
                brain: GuardBrain::new(GuardConfig::default(), GuardSensors::new(LEFT, RIGHT, VISION)),
                player: None,
            };
            let mut ctx = BrainContext {
                dt: DT,
                entity: Entity::DANGLING,
                navigation: &mut harness.navigation,
                world: &harness.physics,
                rng: &mut harness.rng,
                events: &mut harness.events,
                player: None,
            };
            harness.brain.on_initialize(&harness.body, &mut ctx);
            harness
        }

        fn open(guard: Vec2) -> Self {
            Self::new(Physics::new(), guard)
        }

        fn tick(&mut self) {
            let mut ctx = BrainContext {
                dt: DT,
                entity: Entity::DANGLING,
                navigation: &mut self.navigation,
                world: &self.physics,
                rng: &mut self.rng,
                events: &mut self.events,
                player: self.player,
            };
            self.brain.update(&mut self.body, &mut ctx);
            self.body.position += self.body.linear_velocity * DT;
            self.body.integrate_rotation(DT);
        }

        /// Update with the body pinned in place, as if blocked
        fn tick_frozen(&mut self) {
            let mut ctx = BrainContext {
                dt: DT,
                entity: Entity::DANGLING,
                navigation: &mut self.navigation,
                world: &self.physics,
                rng: &mut self.rng,
                events: &mut self.events,
                player: self.player,
            };
            self.brain.update(&mut self.body, &mut ctx);
        }

        fn run(&mut self, ticks: usize) {
            for _ in 0..ticks {
                self.tick();
            }
        }

        fn show_player(&mut self, position: Vec2) -> BodyHandle {
            let body = self
                .physics
                .create_agent(position, 0.0, 1.0, category::PLAYER);
            self.player = Some(PlayerSighting { body, position });
            self.brain.on_event(&GameEvent::ContactBegan {
                sensor: VISION,
                other: body,
                other_category: category::PLAYER,
            });
            body
        }

        fn captures_reported(&self) -> usize {
            self.events
                .pending()
                .filter(|e| matches!(e, GameEvent::PlayerCaptured { .. }))
                .count()
        }

        fn destination(&self) -> Option<Vec2> {
            self.brain
                .path_handle()
                .and_then(|h| self.navigation.path(h))
                .and_then(|p| p.destination())
        }

        fn state_changes(&self) -> Vec<&'static str> {
            self.events
                .pending()
                .filter_map(|e| match e {
                    GameEvent::StateChanged { state, .. } => Some(*state),
                    _ => None,
                })
                .collect()
        }

        fn patrol(&mut self) {
            while self.brain.state() != GuardState::Patrol {
                self.tick();
            }
        }

        fn path_len(&self) -> usize {
            self.brain
                .path_handle()
                .and_then(|h| self.navigation.path(h))
                .map_or(0, |p| p.len())
        }
    }

    #[test]
    fn test_quiet_sound_is_ignored_while_watching() {
        let mut guard = Harness::open(Vec2::ZERO);
        // Threshold at distance 10 is 0.01 * 100 = 1
        assert!(!guard.brain.report_sound(Vec2::new(10.0, 0.0), 0.5));
        guard.tick();
        assert_eq!(guard.brain.state(), GuardState::Watch);
    }

    #[test]
    fn test_loud_sound_leads_to_inspection() {
        let mut guard = Harness::open(Vec2::ZERO);
        let sound = Vec2::new(10.0, 0.0);
        assert!(guard.brain.report_sound(sound, 5.0));

        guard.tick();
        assert_eq!(guard.brain.state(), GuardState::Suspect);

        for _ in 0..40 {
            guard.tick();
            if guard.brain.state() == GuardState::Inspect {
                break;
            }
        }
        assert_eq!(guard.brain.state(), GuardState::Inspect);
        // Turned to face the sound before walking off
        assert!(guard.body.forward().dot(Vec2::X) > 0.9);

        let handle = guard.brain.path_handle().unwrap();
        let destination = guard.navigation.path(handle).unwrap().destination().unwrap();
        assert!(destination.distance(sound) <= guard.brain.config().inspect_offset + 1e-3);
    }

    #[test]
    fn test_sound_event_is_heard() {
        let mut guard = Harness::open(Vec2::ZERO);
        guard.brain.on_event(&GameEvent::SoundEmitted {
            position: Vec2::new(0.0, 5.0),
            volume: 2.0,
            source: None,
        });
        guard.tick();
        assert_eq!(guard.brain.state(), GuardState::Suspect);
    }

    #[test]
    fn test_watch_times_out_into_patrol() {
        let mut guard = Harness::open(Vec2::ZERO);
        let mut patrolled = false;
        // Initial watch lasts at most three seconds
        for _ in 0..70 {
            guard.tick();
            if guard.brain.state() == GuardState::Patrol {
                patrolled = true;
                break;
            }
        }
        assert!(patrolled);
        assert!(guard.path_len() >= 2);
        assert!(guard.events.pending().any(|e| matches!(
            e,
            GameEvent::StateChanged {
                state: "Patrol",
                ..
            }
        )));
    }

    #[test]
    fn test_bump_contact_inserts_detour() {
        let mut guard = Harness::open(Vec2::ZERO);
        while guard.brain.state() != GuardState::Patrol {
            guard.tick();
        }
        let before = guard.path_len();

        guard.brain.on_event(&GameEvent::ContactBegan {
            sensor: LEFT,
            other: guard.physics.create_static_box(Vec2::new(20.0, 20.0), 0.0, Vec2::ONE),
            other_category: category::STATIC,
        });
        guard.tick();
        assert_eq!(guard.path_len(), before + 1);
    }

    #[test]
    fn test_chase_captures_once_per_cooldown() {
        let mut guard = Harness::open(Vec2::ZERO);
        guard.show_player(Vec2::new(0.0, 1.5));

        guard.tick();
        assert_eq!(guard.brain.state(), GuardState::Chase);

        // Half a cooldown window of continuous sight
        guard.run(9);
        assert_eq!(guard.brain.captures(), 1);
        assert_eq!(guard.captures_reported(), 1);

        // One more window
        guard.run(20);
        assert_eq!(guard.brain.captures(), 2);
        assert_eq!(guard.captures_reported(), 2);
    }

    #[test]
    fn test_chase_ignores_sounds() {
        let mut guard = Harness::open(Vec2::ZERO);
        guard.show_player(Vec2::new(0.0, 5.0));
        guard.tick();
        assert_eq!(guard.brain.state(), GuardState::Chase);
        assert!(!guard.brain.report_sound(Vec2::new(1.0, 0.0), 100.0));
    }

    #[test]
    fn test_lost_trail_returns_to_watch() {
        let mut guard = Harness::open(Vec2::ZERO);
        let player = guard.show_player(Vec2::new(0.0, 6.0));
        guard.tick();
        assert_eq!(guard.brain.state(), GuardState::Chase);

        guard.brain.on_event(&GameEvent::ContactEnded {
            sensor: VISION,
            other: player,
            other_category: category::PLAYER,
        });
        for _ in 0..60 {
            guard.tick();
            if guard.brain.state() == GuardState::Watch {
                break;
            }
        }
        assert_eq!(guard.brain.state(), GuardState::Watch);
        assert_eq!(guard.brain.last_known_player(), None);
        assert!(guard.body.position.distance(Vec2::new(0.0, 6.0)) <= 1.0 + 1e-3);
    }

    #[test]
    fn test_wall_blocks_sight() {
        let mut physics = Physics::new();
        physics.create_static_box(Vec2::new(0.0, 5.0), 0.0, Vec2::new(4.0, 0.5));
        let mut guard = Harness::new(physics, Vec2::ZERO);

        guard.show_player(Vec2::new(0.0, 10.0));
        guard.tick();
        assert_ne!(guard.brain.state(), GuardState::Chase);
    }

    #[test]
    fn test_release_returns_path() {
        let mut guard = Harness::open(Vec2::ZERO);
        assert_eq!(guard.navigation.pool().active_count(), 1);
        guard.brain.release(&mut guard.navigation);
        assert_eq!(guard.navigation.pool().active_count(), 0);

        // A guard without a path just stands still
        guard.brain.report_sound(Vec2::new(3.0, 0.0), 10.0);
        guard.run(40);
        assert_eq!(guard.body.linear_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_stuck_patrol_replans() {
        let mut guard = Harness::open(Vec2::ZERO);
        guard.patrol();
        let before = guard.destination().unwrap();

        let mut peak = 0.0f32;
        let mut replanned = false;
        for _ in 0..200 {
            guard.tick_frozen();
            peak = peak.max(guard.brain.stuck_meter());
            if guard.destination() != Some(before) {
                replanned = true;
                break;
            }
        }
        assert!(replanned);
        // Expected 0.25 per tick at patrol speed against a threshold of 10
        assert!(peak > 9.0);
        assert_eq!(guard.brain.state(), GuardState::Patrol);
        assert_eq!(guard.brain.stuck_meter(), 0.0);
    }

    #[test]
    fn test_stuck_inspection_falls_back_to_patrol() {
        let mut guard = Harness::open(Vec2::ZERO);
        assert!(guard.brain.report_sound(Vec2::new(10.0, 0.0), 5.0));
        for _ in 0..40 {
            guard.tick();
            if guard.brain.state() == GuardState::Inspect {
                break;
            }
        }
        assert_eq!(guard.brain.state(), GuardState::Inspect);

        for _ in 0..80 {
            guard.tick_frozen();
            if guard.brain.state() != GuardState::Inspect {
                break;
            }
        }
        assert_eq!(guard.brain.state(), GuardState::Patrol);
    }

    #[test]
    fn test_suspect_times_out_when_unable_to_turn() {
        let mut guard = Harness::open(Vec2::ZERO);
        // Behind the guard, which faces +Y and never turns
        assert!(guard.brain.report_sound(Vec2::new(0.0, -10.0), 5.0));

        guard.tick_frozen();
        assert_eq!(guard.brain.state(), GuardState::Suspect);

        // Four seconds to face the sound
        for _ in 0..100 {
            guard.tick_frozen();
            if guard.brain.state() != GuardState::Suspect {
                break;
            }
        }
        assert_eq!(guard.brain.state(), GuardState::Patrol);
        assert_eq!(guard.state_changes(), vec!["Suspect", "Patrol"]);
    }

    #[test]
    fn test_full_path_replans_around_obstacle() {
        let mut guard = Harness::open(Vec2::ZERO);
        guard.patrol();
        let destination = guard.destination().unwrap();

        let here = guard.body.position;
        let handle = guard.brain.path_handle().unwrap();
        let path = guard.navigation.path_mut(handle).unwrap();
        while path.insert_vertex(1, here) {}
        assert_eq!(guard.path_len(), MAX_PATH_LEN);

        guard.brain.on_event(&GameEvent::ContactBegan {
            sensor: RIGHT,
            other: guard.physics.create_static_box(Vec2::new(-20.0, -20.0), 0.0, Vec2::ONE),
            other_category: category::STATIC,
        });
        guard.tick();

        assert!(guard.path_len() < MAX_PATH_LEN);
        let replanned = guard.destination().unwrap();
        assert!(replanned.distance(destination) < 1e-3);
    }
}
