//! Session identity and the process-scoped session registry

mod id;
mod registry;

pub use id::SessionId;
pub use registry::{SessionRegistry, SessionState};
