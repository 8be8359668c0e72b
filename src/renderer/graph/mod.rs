//! Render Graph Organization
//!
//! Provides:
//! - FrameContext: per-frame blackboard shared by all tasks
//! - RenderTask / TaskGraph: task lifecycle and ordering
//! - RenderStage: standard stage ordering
//! - AovBinding: output channel bindings
//! - PassRenderState: fixed-function state of a pass
//! - RenderSetupTask: publishes the frame's AOV bindings

pub mod aov;
pub mod context;
pub mod graph;
pub mod node;
pub mod render_state;
pub mod setup;
pub mod stage;

pub use aov::{AovBinding, RenderBufferId};
pub use context::{ContextKey, ContextValue, FrameContext};
pub use graph::TaskGraph;
pub use node::{DirtyBits, RenderTask};
pub use render_state::PassRenderState;
pub use setup::RenderSetupTask;
pub use stage::RenderStage;
