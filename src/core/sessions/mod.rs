pub mod registry;
pub mod types;

pub use registry::{SessionHandle, SessionRegistry};
pub use types::SessionState;
