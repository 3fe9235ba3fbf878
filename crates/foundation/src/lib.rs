pub mod error;
pub mod fov;
pub mod offset;
pub mod pov;

// Foundation crate: small, well-tested primitives only.
pub use error::*;
pub use fov::*;
pub use offset::*;
pub use pov::*;
