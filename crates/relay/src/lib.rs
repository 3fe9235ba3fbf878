pub mod channel;
pub mod loopback;
pub mod protocol;

pub use channel::*;
pub use loopback::*;
pub use protocol::*;
