//! Server orchestration: the accept loop, the background room sweep and
//! graceful shutdown.

mod core;

pub use self::core::{GameServer, ServerStats};
