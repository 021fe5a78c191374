//! Tuning and build configuration
//!
//! Every knob that used to be a global toggle lives in one of these structs so
//! that mesh building, queries and agent behaviour are pure functions of their
//! inputs. `LevelConfig` can be persisted as RON or JSON.

use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Edge weight used by the face-graph search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Distance between the centroids of adjacent faces
    #[default]
    FaceCenter,
    /// Distance from the point where the search entered a face to the
    /// midpoint of the shared edge being crossed
    EdgeMidpoint,
}

/// Per-query behaviour of the navigation engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Search edge weight strategy
    pub metric: DistanceMetric,
    /// Squared distance under which two funnel points count as the same
    pub funnel_epsilon: f32,
    /// A destination moved further than this by clamping is not "reached"
    pub clamp_tolerance: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::FaceCenter,
            funnel_epsilon: 1e-6,
            clamp_tolerance: 1e-3,
        }
    }
}

impl QueryConfig {
    /// Set the search metric
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// Navigation mesh build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Clearance obstacles are inflated by
    pub agent_radius: f32,
    /// Boundary edges longer than this are split before triangulation
    pub steiner_step: f32,
    /// Spatial hash cells per world unit used to merge vertices
    pub vertex_quantization: f32,
    /// Run edge-flip refinement after triangulation
    pub refine: bool,
    /// Upper bound on refinement passes
    pub max_refine_passes: usize,
    /// Area ratio above which an adjacent pair is treated as a sliver
    pub sliver_ratio: f32,
    /// Sliver passes run after edge-length refinement settles
    pub sliver_passes: usize,
    /// Face arena size
    pub max_faces: usize,
    /// Vertex arena size
    pub max_vertices: usize,
    /// Longest face corridor a single query may produce
    pub max_corridor_len: usize,
    /// Number of pooled paths handed out to agents
    pub path_pool_size: usize,
    /// Query behaviour
    pub query: QueryConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            agent_radius: 1.0,
            steiner_step: 4.0,
            vertex_quantization: 1000.0,
            refine: true,
            max_refine_passes: 64,
            sliver_ratio: 8.0,
            sliver_passes: 4,
            max_faces: 1024 * 64,
            max_vertices: 1024 * 64,
            max_corridor_len: 1024,
            path_pool_size: 16,
            query: QueryConfig::default(),
        }
    }
}

impl NavConfig {
    /// Set the agent clearance radius
    pub fn with_agent_radius(mut self, radius: f32) -> Self {
        self.agent_radius = radius;
        self
    }

    /// Set the boundary subdivision step
    pub fn with_steiner_step(mut self, step: f32) -> Self {
        self.steiner_step = step;
        self
    }

    /// Enable or disable refinement
    pub fn with_refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    /// Set arena capacities
    pub fn with_capacity(mut self, max_vertices: usize, max_faces: usize) -> Self {
        self.max_vertices = max_vertices;
        self.max_faces = max_faces;
        self
    }

    /// Set the number of pooled paths
    pub fn with_path_pool_size(mut self, size: usize) -> Self {
        self.path_pool_size = size;
        self
    }

    /// Set query behaviour
    pub fn with_query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }
}

/// Guard behaviour tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Walking speed while patrolling
    pub patrol_speed: f32,
    /// Walking speed while inspecting a sound
    pub inspect_speed: f32,
    /// Running speed while chasing
    pub chase_speed: f32,
    /// Angular speed of the watch sweep (rad/s)
    pub sweep_speed: f32,
    /// Angular speed when turning towards a sound (rad/s)
    pub turn_speed: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_radius: f32,
    /// Stuck meter level that triggers a re-plan
    pub stuck_threshold: f32,
    /// Watch duration range for a freshly spawned guard
    pub initial_watch_time: (f32, f32),
    /// Watch duration range after a patrol leg
    pub watch_time: (f32, f32),
    /// Duration range of one sweep direction
    pub sweep_time: (f32, f32),
    /// Sideways offset of an avoidance waypoint
    pub avoid_side_offset: f32,
    /// Forward offset of an avoidance waypoint
    pub avoid_ahead_offset: f32,
    /// An avoidance waypoint closer than this replaces the current target
    pub avoid_merge_distance: f32,
    /// Time allowed to turn towards a sound
    pub suspect_time: f32,
    /// Angle under which the guard counts as facing the sound (rad)
    pub facing_tolerance: f32,
    /// Random scatter around an inspected sound
    pub inspect_offset: f32,
    /// Interval between chase re-plans
    pub chase_refresh: f32,
    /// Capture distance
    pub catch_distance: f32,
    /// Minimum time between two captures by one guard
    pub capture_cooldown: f32,
    /// Hearing constant `k` in `volume > k * distance^2`
    pub hearing_factor: f32,
    /// Length of the vision cone
    pub vision_range: f32,
    /// Half width of the far end of the vision cone
    pub vision_half_width: f32,
    /// Half extents of each bump sensor box
    pub bump_half_extents: (f32, f32),
    /// Local offset of the right bump sensor (mirrored for the left one)
    pub bump_offset: (f32, f32),
    /// Radius of the guard body
    pub body_radius: f32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 5.0,
            inspect_speed: 4.0,
            chase_speed: 7.0,
            sweep_speed: PI * 0.5,
            turn_speed: PI,
            waypoint_radius: 1.0,
            stuck_threshold: 10.0,
            initial_watch_time: (1.0, 3.0),
            watch_time: (2.0, 5.0),
            sweep_time: (1.0, 2.0),
            avoid_side_offset: 1.0,
            avoid_ahead_offset: 2.0,
            avoid_merge_distance: 2.0,
            suspect_time: 4.0,
            facing_tolerance: 0.2,
            inspect_offset: 1.5,
            chase_refresh: 0.5,
            catch_distance: 2.0,
            capture_cooldown: 1.0,
            hearing_factor: 0.01,
            vision_range: 12.0,
            vision_half_width: 5.0,
            bump_half_extents: (0.5, 2.0),
            bump_offset: (0.5, 2.0),
            body_radius: 1.0,
        }
    }
}

impl GuardConfig {
    /// Set the hearing constant
    pub fn with_hearing_factor(mut self, k: f32) -> Self {
        self.hearing_factor = k;
        self
    }

    /// Set capture distance and cooldown
    pub fn with_capture(mut self, distance: f32, cooldown: f32) -> Self {
        self.catch_distance = distance;
        self.capture_cooldown = cooldown;
        self
    }
}

/// Player movement tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Walking speed
    pub walk_speed: f32,
    /// Sprinting speed
    pub sprint_speed: f32,
    /// Seconds between footstep sounds while sprinting
    pub footstep_interval: f32,
    /// Volume of a sprint footstep
    pub footstep_volume: f32,
    /// Radius of the player body
    pub body_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            sprint_speed: 8.0,
            footstep_interval: 0.4,
            footstep_volume: 2.0,
            body_radius: 1.0,
        }
    }
}

/// Complete level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Half width of the navigable rectangle
    pub half_width: f32,
    /// Half height of the navigable rectangle
    pub half_height: f32,
    /// Mesh build and query settings
    pub nav: NavConfig,
    /// Guard tuning
    pub guard: GuardConfig,
    /// Player tuning
    pub player: PlayerConfig,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            half_width: 48.0,
            half_height: 36.0,
            nav: NavConfig::default(),
            guard: GuardConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl LevelConfig {
    /// Set the navigable half extents
    pub fn with_half_size(mut self, half_width: f32, half_height: f32) -> Self {
        self.half_width = half_width;
        self.half_height = half_height;
        self
    }

    /// Set the navigation config
    pub fn with_nav(mut self, nav: NavConfig) -> Self {
        self.nav = nav;
        self
    }

    /// Set the guard config
    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Save the config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_config_ron_roundtrip_keeps_metric() {
        let config = LevelConfig::default().with_nav(
            NavConfig::default()
                .with_query(QueryConfig::default().with_metric(DistanceMetric::EdgeMidpoint)),
        );

        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("EdgeMidpoint"));

        let loaded: LevelConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.nav.query.metric, DistanceMetric::EdgeMidpoint);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_level_config_json_file() {
        let path = std::env::temp_dir().join("stealth_nav_config_test.json");
        let config = LevelConfig::default().with_half_size(30.0, 20.0);

        config.save_json(&path).unwrap();
        let loaded = LevelConfig::load_json(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.half_width, 30.0);
        assert_eq!(loaded.half_height, 20.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = LevelConfig::load_ron("/definitely/not/here.ron");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_default_metric_is_face_center() {
        assert_eq!(QueryConfig::default().metric, DistanceMetric::FaceCenter);
    }
}
