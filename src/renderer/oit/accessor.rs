//! Producer-side view of the OIT frame protocol.
//!
//! [`OitBufferAccessor`] wraps the [`FrameContext`] for tasks that write OIT
//! fragments: signal demand during prepare, clear the buffers once per frame
//! and look up the published handles during execute.

use log::trace;

use super::{COUNTER_BINDING, DATA_BINDING, DEPTH_BINDING, INDEX_BINDING, UNIFORM_BINDING};
use crate::errors::{OitError, Result};
use crate::renderer::core::{BufferAccess, BufferBinding, BufferBindings, BufferHandle, CommandSink};
use crate::renderer::graph::{ContextKey, FrameContext};

/// Value every counter element is reset to: empty list head, and an
/// allocator whose first `atomicAdd + 1` yields slot 0.
pub const COUNTER_CLEAR_VALUE: i32 = -1;

/// Where the current frame stands in the OIT protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OitFrameState {
    /// No producer requested OIT this frame.
    Idle,
    /// A producer requested OIT; the buffers have not been cleared yet.
    Requested,
    /// Buffers were cleared and producers are appending fragments.
    Accumulating,
}

/// The five published OIT buffers of the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OitBufferBindings {
    pub counter: BufferHandle,
    pub indices: BufferHandle,
    pub data: BufferHandle,
    pub depth: BufferHandle,
    pub uniforms: BufferHandle,
}

impl OitBufferBindings {
    /// Reads all five handles from `ctx`; `None` if any is missing.
    #[must_use]
    pub fn from_context(ctx: &FrameContext) -> Option<Self> {
        Some(Self {
            counter: ctx.buffer(ContextKey::OitCounterBuffer)?.clone(),
            indices: ctx.buffer(ContextKey::OitIndexBuffer)?.clone(),
            data: ctx.buffer(ContextKey::OitDataBuffer)?.clone(),
            depth: ctx.buffer(ContextKey::OitDepthBuffer)?.clone(),
            uniforms: ctx.buffer(ContextKey::OitUniformBuffer)?.clone(),
        })
    }

    /// Pass bindings with read-write storage access (producers).
    #[must_use]
    pub fn for_writing(&self) -> BufferBindings {
        self.pass_bindings(BufferAccess::ReadWriteStorage)
    }

    /// Pass bindings with read-only storage access (resolve).
    #[must_use]
    pub fn for_reading(&self) -> BufferBindings {
        self.pass_bindings(BufferAccess::ReadOnlyStorage)
    }

    fn pass_bindings(&self, storage: BufferAccess) -> BufferBindings {
        let bind = |binding, buffer: &BufferHandle, access| BufferBinding {
            binding,
            buffer: buffer.clone(),
            access,
        };
        BufferBindings::from_iter([
            bind(COUNTER_BINDING, &self.counter, storage),
            bind(INDEX_BINDING, &self.indices, storage),
            bind(DATA_BINDING, &self.data, storage),
            bind(DEPTH_BINDING, &self.depth, storage),
            bind(UNIFORM_BINDING, &self.uniforms, BufferAccess::Uniform),
        ])
    }
}

/// Producer-side accessor over the frame context.
pub struct OitBufferAccessor<'a> {
    ctx: &'a mut FrameContext,
}

impl<'a> OitBufferAccessor<'a> {
    pub fn new(ctx: &'a mut FrameContext) -> Self {
        Self { ctx }
    }

    /// Signals that this frame has OIT fragments to resolve.
    pub fn request_oit_buffers(&mut self) {
        self.ctx.set_flag(ContextKey::OitRequestFlag);
    }

    /// Clears the counter buffer unless another task already did this frame.
    pub fn initialize_oit_buffers_if_necessary(&mut self, sink: &mut dyn CommandSink) -> Result<()> {
        if self.ctx.has_flag(ContextKey::OitClearedFlag) {
            return Ok(());
        }
        let counter = self
            .ctx
            .buffer(ContextKey::OitCounterBuffer)
            .ok_or_else(|| OitError::MissingBuffers("OIT buffer initialization".into()))?;

        sink.fill_buffer_i32(counter, COUNTER_CLEAR_VALUE)?;
        self.ctx.set_flag(ContextKey::OitClearedFlag);
        trace!("Cleared OIT counter buffer");
        Ok(())
    }

    /// The published buffers, or `None` unless all five are present.
    #[must_use]
    pub fn buffer_bindings(&self) -> Option<OitBufferBindings> {
        OitBufferBindings::from_context(&*self.ctx)
    }

    #[must_use]
    pub fn frame_state(&self) -> OitFrameState {
        match (
            self.ctx.has_flag(ContextKey::OitRequestFlag),
            self.ctx.has_flag(ContextKey::OitClearedFlag),
        ) {
            (false, _) => OitFrameState::Idle,
            (true, false) => OitFrameState::Requested,
            (true, true) => OitFrameState::Accumulating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::{BufferKind, BufferRole, HeadlessBackend, RecordedOp};

    fn publish_all(ctx: &mut FrameContext) {
        for (key, role) in ContextKey::OIT_BUFFERS.into_iter().zip([
            BufferRole::OitCounter,
            BufferRole::OitIndices,
            BufferRole::OitData,
            BufferRole::OitDepth,
            BufferRole::OitUniforms,
        ]) {
            ctx.set_buffer(key, BufferHandle::new(role, BufferKind::Storage, &[]));
        }
    }

    #[test]
    fn frame_state_follows_flags() {
        let mut ctx = FrameContext::new();
        let mut accessor = OitBufferAccessor::new(&mut ctx);
        assert_eq!(accessor.frame_state(), OitFrameState::Idle);

        accessor.request_oit_buffers();
        assert_eq!(accessor.frame_state(), OitFrameState::Requested);

        ctx.set_flag(ContextKey::OitClearedFlag);
        assert_eq!(OitBufferAccessor::new(&mut ctx).frame_state(), OitFrameState::Accumulating);
    }

    #[test]
    fn bindings_require_all_five_buffers() {
        let mut ctx = FrameContext::new();
        publish_all(&mut ctx);
        ctx.remove(ContextKey::OitDepthBuffer);
        assert!(OitBufferAccessor::new(&mut ctx).buffer_bindings().is_none());

        publish_all(&mut ctx);
        let bindings = OitBufferAccessor::new(&mut ctx).buffer_bindings().unwrap();
        let pass = bindings.for_reading();
        assert_eq!(pass.len(), 5);
        assert_eq!(pass[4].access, BufferAccess::Uniform);
        assert!(
            bindings
                .for_writing()
                .iter()
                .take(4)
                .all(|b| b.access == BufferAccess::ReadWriteStorage)
        );
    }

    #[test]
    fn initialization_without_counter_is_an_error() {
        let mut ctx = FrameContext::new();
        let mut sink = HeadlessBackend::new();
        let result = OitBufferAccessor::new(&mut ctx).initialize_oit_buffers_if_necessary(&mut sink);

        assert!(matches!(result, Err(OitError::MissingBuffers(_))));
        assert!(!ctx.has_flag(ContextKey::OitClearedFlag));
        assert_eq!(sink.count_ops(|op| matches!(op, RecordedOp::Fill { .. })), 0);
    }
}
