#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Frame-scoped coordination of order-independent transparency (OIT) buffers
//! for a multi-pass `wgpu` renderer.
//!
//! Any number of producer tasks append translucent fragments into shared
//! per-pixel buffers; a single resolve task sizes those buffers to the output
//! resolution and composites them in a full-screen pass. Tasks never call each
//! other: they communicate through flags and buffer handles published in a
//! per-frame [`FrameContext`].
//!
//! ```rust,ignore
//! use myth_oit::{HeadlessBackend, FrameContext, TaskGraph, OitSettings};
//! use myth_oit::{OitRenderTask, OitResolveTask, RenderSetupTask};
//!
//! let settings = OitSettings::from_env();
//! let mut graph = TaskGraph::new()
//!     .with_task(Box::new(RenderSetupTask::new("setup", aovs)))
//!     .with_task(Box::new(OitRenderTask::new("glass", settings, writer)))
//!     .with_task(Box::new(OitResolveTask::new("oitResolve", settings)));
//!
//! let mut ctx = FrameContext::new();
//! let mut backend = HeadlessBackend::new();
//! graph.run_frame(&mut ctx, &mut backend);
//! ```

pub mod errors;
pub mod renderer;
pub mod utils;

pub use errors::{OitError, Result};
pub use renderer::OitSettings;
pub use renderer::core::{
    BufferHandle, BufferRole, CommandSink, GpuFrame, GpuResourceRegistry, HeadlessBackend,
    RecordedOp, RegistryFeatures, ResourceRegistry,
};
pub use renderer::graph::{
    AovBinding, ContextKey, ContextValue, DirtyBits, FrameContext, PassRenderState,
    RenderBufferId, RenderSetupTask, RenderStage, RenderTask, TaskGraph,
};
pub use renderer::oit::{
    FragmentWriter, OitBufferAccessor, OitBufferBindings, OitBufferBundle, OitFrameState,
    OitRenderTask, OitResolveTask, SAMPLES_PER_PIXEL,
};
pub use utils::interner;
