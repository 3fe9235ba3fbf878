pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod surface;

pub use adapter::*;
pub use config::*;
pub use coordinator::*;
pub use surface::*;
