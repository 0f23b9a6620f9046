//! Shared plumbing for setup-swift: the install [`platform`] model, the
//! GitHub Actions [`workflow`] environment, and the workflow-command
//! [`logger`].

pub mod logger;
pub mod platform;
pub mod workflow;

pub use platform::{Os, Platform, UnknownOs};
pub use workflow::{Environment, WorkflowChange, WorkflowEnvironment, WorkflowError, WorkflowFiles};
