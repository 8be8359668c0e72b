//! Backend Layer
//!
//! Buffer vocabulary, the registry / command-sink capabilities tasks are
//! written against, and the two implementations shipped with the crate:
//! a recording [`HeadlessBackend`] and the `wgpu`-backed [`GpuResourceRegistry`].

pub mod buffer;
pub mod gpu;
pub mod headless;
pub mod registry;

pub use buffer::{
    BufferHandle, BufferKind, BufferRole, BufferSource, BufferSpec, ElementType, UsageHint,
};
pub use gpu::{GpuFrame, GpuResourceRegistry};
pub use headless::{HeadlessBackend, RecordedOp};
pub use registry::{
    BufferAccess, BufferBinding, BufferBindings, CommandSink, FullscreenDraw, RegistryFeatures,
    ResourceRegistry,
};
