//! Core abstractions for notebook error remediation.
//!
//! This crate provides the fundamental building blocks:
//! - `Resolver` / `FrameResolver` - Bounded polling for resources that appear later
//! - `FrameQueue` / `IntervalFrames` - Render-loop schedulers
//! - Host collaborator traits (sessions, notebooks, cells, editors, commands)
//! - Kernel execute request/reply message types
//! - `RemediationConfig` - Remediation options and timing budgets

pub mod config;
pub mod frame;
pub mod message;
pub mod metadata;
pub mod resolver;
pub mod traits;
pub mod types;

pub use config::{ConfigError, ExpressionBinding, FollowOnCommand, RemediationConfig};
pub use frame::{FrameQueue, IntervalFrames};
pub use message::{ExecuteReply, ExecuteRequest, IopubMessage, UserExpressionResult};
pub use metadata::CellMetadata;
pub use resolver::{FrameResolution, FrameResolver, PollPolicy, Resolver};
pub use traits::{
    Activation, Cell, CommandRegistry, ComputeSession, ExecuteHandle, FrameCallback,
    FrameScheduler, HostError, Notebook, RenderedOutput, SessionDirectory, TextEditor,
};
pub use types::{CellId, ContentKind, ControlSpec, RemediationOption, SessionId, SessionModel};
