//! Debug drawing seam and overlay configuration
//!
//! The navigation core never renders anything itself. Anything that wants to
//! visualise the mesh, the last search corridor or agent paths implements
//! [`DebugDraw`] and hands it to `debug_render`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// RGBA colour in linear 0..1 space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque colour
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Colour with alpha
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Immediate-mode line drawing sink
pub trait DebugDraw {
    /// Draw a line segment
    fn line(&mut self, from: Vec2, to: Vec2, color: Color);

    /// Draw a circle outline
    fn circle(&mut self, center: Vec2, radius: f32, color: Color);

    /// Draw a closed polygon outline
    fn polygon(&mut self, points: &[Vec2], color: Color) {
        for (i, &p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            self.line(p, q, color);
        }
    }

    /// Draw an open polyline
    fn polyline(&mut self, points: &[Vec2], color: Color) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
    }
}

/// Which debug layers to draw and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Draw every mesh face outline
    pub draw_mesh: bool,
    /// Highlight the faces of the last query corridor
    pub draw_corridor: bool,
    /// Draw agent paths
    pub draw_paths: bool,
    /// Draw search node centres for the last query
    pub draw_search: bool,
    /// Mesh outline colour
    pub mesh_color: Color,
    /// Corridor colour
    pub corridor_color: Color,
    /// Path colour
    pub path_color: Color,
    /// Radius of waypoint markers
    pub waypoint_radius: f32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            draw_mesh: true,
            draw_corridor: true,
            draw_paths: true,
            draw_search: false,
            mesh_color: Color::rgba(0.3, 0.3, 0.8, 0.5),
            corridor_color: Color::rgba(0.9, 0.8, 0.2, 0.6),
            path_color: Color::rgb(0.1, 0.9, 0.2),
            waypoint_radius: 0.25,
        }
    }
}

impl DebugConfig {
    /// Config with every layer turned off
    pub fn disabled() -> Self {
        Self {
            draw_mesh: false,
            draw_corridor: false,
            draw_paths: false,
            draw_search: false,
            ..Self::default()
        }
    }

    /// Toggle mesh drawing
    pub fn toggle_mesh(&mut self) {
        self.draw_mesh = !self.draw_mesh;
    }
}

/// A recorded draw command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugShape {
    /// Line segment
    Line {
        /// Start
        from: Vec2,
        /// End
        to: Vec2,
        /// Colour
        color: Color,
    },
    /// Circle outline
    Circle {
        /// Centre
        center: Vec2,
        /// Radius
        radius: f32,
        /// Colour
        color: Color,
    },
}

/// [`DebugDraw`] sink that records shapes for a renderer to consume later
#[derive(Debug, Default)]
pub struct DebugLines {
    shapes: Vec<DebugShape>,
}

impl DebugLines {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded shapes in draw order
    pub fn shapes(&self) -> &[DebugShape] {
        &self.shapes
    }

    /// Number of recorded line segments
    pub fn line_count(&self) -> usize {
        self.shapes
            .iter()
            .filter(|s| matches!(s, DebugShape::Line { .. }))
            .count()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl DebugDraw for DebugLines {
    fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.shapes.push(DebugShape::Line { from, to, color });
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.shapes.push(DebugShape::Circle {
            center,
            radius,
            color,
        });
    }
}
