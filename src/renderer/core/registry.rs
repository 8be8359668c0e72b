//! Backend Capabilities
//!
//! Two narrow traits separate what a task may do in each lifecycle phase:
//!
//! - [`ResourceRegistry`] (**prepare** phase): allocate, grow, upload into and
//!   destroy structured buffers.
//! - [`CommandSink`] (**execute** phase): record buffer fills and draws.
//!
//! Resizes only ever happen through the registry, which tasks only see during
//! prepare, so a buffer is never reallocated while GPU work recorded in the
//! same frame still references it.

use bitflags::bitflags;
use smallvec::SmallVec;

use super::buffer::{BufferHandle, BufferKind, BufferRole, BufferSource, BufferSpec, UsageHint};
use crate::errors::Result;
use crate::renderer::graph::{AovBinding, PassRenderState};
use crate::renderer::pipeline::ShaderProgram;

bitflags! {
    /// Capabilities exposed by a registry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegistryFeatures: u32 {
        /// Fragment shaders may bind (at least four) storage buffers.
        const FRAGMENT_STORAGE_BUFFERS = 1 << 0;
    }
}

/// Allocation and update of structured buffers.
pub trait ResourceRegistry {
    /// Capabilities of this registry.
    fn features(&self) -> RegistryFeatures;

    /// Allocates a buffer with one element per slot of the given fields.
    ///
    /// Storage buffers start with zero elements; uniform buffers are sized
    /// for exactly one element.
    fn allocate_buffer(
        &mut self,
        role: BufferRole,
        specs: &[BufferSpec],
        kind: BufferKind,
        hint: UsageHint,
    ) -> Result<BufferHandle>;

    /// Grows a buffer to hold at least `num_elements` elements.
    ///
    /// Requests at or below the current capacity leave the buffer untouched.
    /// Contents are not preserved across a grow.
    fn resize_buffer(&mut self, buffer: &BufferHandle, num_elements: usize) -> Result<()>;

    /// Writes `source` at offset zero.
    fn upload(&mut self, buffer: &BufferHandle, source: &BufferSource) -> Result<()>;

    /// Releases the buffer. Unknown handles are ignored.
    fn destroy_buffer(&mut self, buffer: &BufferHandle);

    /// Current capacity in elements, or `None` for unknown handles.
    fn buffer_capacity(&self, buffer: &BufferHandle) -> Option<usize>;
}

/// Shader-side access of a bound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferAccess {
    ReadOnlyStorage,
    ReadWriteStorage,
    Uniform,
}

/// One buffer bound at a binding slot of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBinding {
    pub binding: u32,
    pub buffer: BufferHandle,
    pub access: BufferAccess,
}

/// Binding list of a pass; OIT passes bind exactly five buffers.
pub type BufferBindings = SmallVec<[BufferBinding; 5]>;

/// A full-screen draw: one triangle covering the targets, shaded by `shader`.
#[derive(Debug, Clone, Copy)]
pub struct FullscreenDraw<'a> {
    pub label: &'a str,
    pub shader: &'a ShaderProgram,
    pub state: &'a PassRenderState,
    pub buffers: &'a [BufferBinding],
    /// Render targets in binding order. A `Some` clear value clears the
    /// target before drawing; `None` blends onto the existing content.
    pub targets: &'a [AovBinding],
}

/// Recording of execute-phase GPU work.
pub trait CommandSink {
    /// Sets every element of an `i32` buffer to `value`.
    fn fill_buffer_i32(&mut self, buffer: &BufferHandle, value: i32) -> Result<()>;

    /// Records a full-screen draw.
    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) -> Result<()>;
}
