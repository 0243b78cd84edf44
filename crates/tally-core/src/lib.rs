//! Tally Core Library
//!
//! Framework layout, agent discovery and bundle naming shared by the
//! token engine and the CLI.

pub mod agent;
pub mod bundle;
pub mod discovery;
pub mod error;
pub mod layout;

pub use agent::AgentRecord;
pub use discovery::{Discovery, FsDiscovery, StaticDiscovery};
pub use error::{CoreError, CoreResult};
