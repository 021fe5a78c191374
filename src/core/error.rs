//! Error types for mesh building and navigation queries

use std::fmt;

/// Which fixed-capacity arena overflowed during a mesh build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    /// Vertex arena
    Vertices,
    /// Face arena
    Faces,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertices => write!(f, "vertices"),
            Self::Faces => write!(f, "faces"),
        }
    }
}

/// Errors that can occur while building or querying the navigation mesh
#[derive(Debug, Clone, PartialEq)]
pub enum NavError {
    /// The level produced more vertices or faces than the mesh can hold
    MeshCapacityExceeded {
        /// Arena that overflowed
        kind: CapacityKind,
        /// Configured limit
        limit: usize,
    },
    /// The boolean clip step failed
    ClipFailed(String),
    /// Earclipping a region failed
    TriangulationFailed(String),
    /// A query was issued against a mesh with no faces
    EmptyMesh,
    /// The face corridor of a query was longer than allowed
    CorridorTooLong {
        /// Corridor length in faces
        len: usize,
        /// Configured limit
        limit: usize,
    },
    /// Every pooled path is checked out
    PoolExhausted {
        /// Pool size
        capacity: usize,
    },
    /// A path handle does not refer to a live pooled path
    InvalidPath,
    /// The physics world rejected an agent sensor shape
    InvalidSensorShape,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeshCapacityExceeded { kind, limit } => {
                write!(f, "Mesh capacity exceeded: more than {limit} {kind}")
            }
            Self::ClipFailed(e) => write!(f, "Polygon clipping failed: {e}"),
            Self::TriangulationFailed(e) => write!(f, "Triangulation failed: {e}"),
            Self::EmptyMesh => write!(f, "Navigation mesh has no faces"),
            Self::CorridorTooLong { len, limit } => {
                write!(f, "Face corridor of {len} faces exceeds limit of {limit}")
            }
            Self::PoolExhausted { capacity } => {
                write!(f, "All {capacity} pooled navigation paths are in use")
            }
            Self::InvalidPath => write!(f, "Invalid navigation path handle"),
            Self::InvalidSensorShape => write!(f, "Sensor shape rejected by the physics world"),
        }
    }
}

impl std::error::Error for NavError {}

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// Serialization error
    Serialize(String),
    /// Deserialization error
    Deserialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Serialize(e) => write!(f, "Serialization error: {e}"),
            Self::Deserialize(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_arena() {
        let err = NavError::MeshCapacityExceeded {
            kind: CapacityKind::Faces,
            limit: 16,
        };
        assert_eq!(err.to_string(), "Mesh capacity exceeded: more than 16 faces");
    }

    #[test]
    fn test_pool_exhausted_message() {
        let err = NavError::PoolExhausted { capacity: 4 };
        assert!(err.to_string().contains("4 pooled"));
    }
}
