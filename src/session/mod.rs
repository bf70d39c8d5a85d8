//! Session refresh core: published state, single-flight coordinator,
//! background renewer and the read-only view handed to callers.

pub mod coordinator;
pub mod error;
pub mod reader;
pub mod renewer;
pub mod state;
pub mod token;

pub use coordinator::{CoordinatorSettings, RefreshCoordinator};
pub use error::SessionError;
pub use reader::SessionReader;
pub use renewer::{BackgroundRenewer, RenewerHandle, RenewerPhase, RenewerSettings};
pub use state::{SessionSnapshot, SessionState};
pub use token::TokenId;
