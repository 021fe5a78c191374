//! Fixed-capacity waypoint polyline

use glam::Vec2;

/// Most waypoints a single path can hold
pub const MAX_PATH_LEN: usize = 128;

/// Walkable polyline from a start point to a destination
///
/// Storage is inline so a path can be reused every frame without allocating.
#[derive(Debug, Clone)]
pub struct NavPath {
    points: [Vec2; MAX_PATH_LEN],
    len: usize,
}

impl Default for NavPath {
    fn default() -> Self {
        Self::new()
    }
}

impl NavPath {
    /// Create an empty path
    pub const fn new() -> Self {
        Self {
            points: [Vec2::ZERO; MAX_PATH_LEN],
            len: 0,
        }
    }

    /// Remove every waypoint
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Number of waypoints
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the path has no waypoints
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if no more waypoints fit
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == MAX_PATH_LEN
    }

    /// Waypoints in order
    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.len]
    }

    /// Waypoint at `index`
    #[inline]
    pub fn vertex(&self, index: usize) -> Option<Vec2> {
        self.points().get(index).copied()
    }

    /// Last waypoint
    #[inline]
    pub fn destination(&self) -> Option<Vec2> {
        self.points().last().copied()
    }

    /// Add a waypoint at the end, returning false when full
    #[must_use]
    pub fn append_vertex(&mut self, p: Vec2) -> bool {
        if self.is_full() {
            return false;
        }
        self.points[self.len] = p;
        self.len += 1;
        true
    }

    /// Overwrite the waypoint at `index`, returning false if out of range
    #[must_use]
    pub fn replace_vertex(&mut self, index: usize, p: Vec2) -> bool {
        match self.points[..self.len].get_mut(index) {
            Some(slot) => {
                *slot = p;
                true
            }
            None => false,
        }
    }

    /// Insert a waypoint before `index`, shifting the tail
    ///
    /// `index == len()` appends. Returns false when full or out of range.
    #[must_use]
    pub fn insert_vertex(&mut self, index: usize, p: Vec2) -> bool {
        if self.is_full() || index > self.len {
            return false;
        }
        self.points.copy_within(index..self.len, index + 1);
        self.points[index] = p;
        self.len += 1;
        true
    }

    /// Detour helper: replace the waypoint at `index` if it lies within
    /// `max_replace_dist` of `p`, otherwise insert `p` before it
    ///
    /// Returns false when neither is possible because the path is full or
    /// `index` is out of range.
    #[must_use]
    pub fn try_insert_vertex(&mut self, index: usize, p: Vec2, max_replace_dist: f32) -> bool {
        if let Some(existing) = self.vertex(index) {
            if existing.distance_squared(p) < max_replace_dist * max_replace_dist {
                return self.replace_vertex(index, p);
            }
        }
        self.insert_vertex(index, p)
    }

    /// Sum of segment lengths
    pub fn total_length(&self) -> f32 {
        self.points()
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Replace the contents with `points`, truncating at capacity
    ///
    /// Returns false if anything was dropped.
    pub fn set_points(&mut self, points: &[Vec2]) -> bool {
        let n = points.len().min(MAX_PATH_LEN);
        self.points[..n].copy_from_slice(&points[..n]);
        self.len = n;
        n == points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(points: &[Vec2]) -> NavPath {
        let mut path = NavPath::new();
        assert!(path.set_points(points));
        path
    }

    #[test]
    fn test_append_and_destination() {
        let mut path = NavPath::new();
        assert!(path.destination().is_none());
        assert!(path.append_vertex(Vec2::ZERO));
        assert!(path.append_vertex(Vec2::new(3.0, 4.0)));
        assert_eq!(path.len(), 2);
        assert_eq!(path.destination(), Some(Vec2::new(3.0, 4.0)));
        assert!((path.total_length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_insert_shifts_tail() {
        let mut path = path_of(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        assert!(path.insert_vertex(1, Vec2::new(5.0, 2.0)));
        assert_eq!(
            path.points(),
            &[Vec2::ZERO, Vec2::new(5.0, 2.0), Vec2::new(10.0, 0.0)]
        );
        assert!(!path.insert_vertex(5, Vec2::ONE));
    }

    #[test]
    fn test_try_insert_merges_when_close() {
        let mut path = path_of(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);

        // Close to the target: replaced in place
        assert!(path.try_insert_vertex(1, Vec2::new(9.0, 1.0), 2.0));
        assert_eq!(path.len(), 2);
        assert_eq!(path.vertex(1), Some(Vec2::new(9.0, 1.0)));

        // Far from the target: inserted before it
        assert!(path.try_insert_vertex(1, Vec2::new(3.0, 1.0), 2.0));
        assert_eq!(path.len(), 3);
        assert_eq!(path.vertex(2), Some(Vec2::new(9.0, 1.0)));
    }

    #[test]
    fn test_full_path_rejects_growth() {
        let mut path = NavPath::new();
        for i in 0..MAX_PATH_LEN {
            assert!(path.append_vertex(Vec2::new(i as f32, 0.0)));
        }
        assert!(path.is_full());
        assert!(!path.append_vertex(Vec2::ZERO));
        assert!(!path.try_insert_vertex(1, Vec2::new(50.0, 50.0), 1.0));
        // Replacement still works at capacity
        assert!(path.try_insert_vertex(1, Vec2::new(1.0, 0.5), 1.0));
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut path = path_of(&[Vec2::ZERO]);
        assert!(!path.replace_vertex(1, Vec2::ONE));
        path.clear();
        assert!(path.is_empty());
    }
}
