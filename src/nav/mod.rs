//! Navigation module
//!
//! Navigation mesh construction and refinement, face-graph search, funnel
//! string pulling, bounded paths and the pool that hands them out.

pub mod funnel;
mod mesh;
mod navigation;
mod path;
mod pool;
mod refine;
pub mod search;

pub use funnel::{center_path_length, string_pull};
pub use mesh::{Face, FaceId, NavMesh, VertexId, face_flags};
pub use navigation::{Navigation, render_path};
pub use path::{MAX_PATH_LEN, NavPath};
pub use pool::{PathHandle, PathPool};
pub use search::{SearchNode, SearchResult, SearchScratch};
