//! Headless Backend
//!
//! CPU-only implementation of [`ResourceRegistry`] and [`CommandSink`].
//! Buffers are tracked logically (capacity plus last uploaded bytes) and every
//! call is appended to an operation log, which makes the backend suitable for
//! running the task graph without a GPU and for asserting on exactly which
//! allocations, resizes, uploads and draws a frame produced.

use rustc_hash::FxHashMap;

use super::buffer::{BufferHandle, BufferKind, BufferRole, BufferSource, BufferSpec, UsageHint};
use super::registry::{CommandSink, FullscreenDraw, RegistryFeatures, ResourceRegistry};
use crate::errors::{OitError, Result};
use crate::renderer::graph::{AovBinding, PassRenderState};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    Allocate {
        role: BufferRole,
        kind: BufferKind,
        capacity: usize,
    },
    Resize {
        role: BufferRole,
        from: usize,
        to: usize,
    },
    Upload {
        role: BufferRole,
        bytes: Vec<u8>,
    },
    Destroy {
        role: BufferRole,
    },
    Fill {
        role: BufferRole,
        value: i32,
        elements: usize,
    },
    DrawFullscreen {
        label: String,
        shader_hash: u128,
        state: PassRenderState,
        buffers: Vec<BufferRole>,
        targets: Vec<AovBinding>,
    },
}

#[derive(Debug)]
struct HeadlessBuffer {
    role: BufferRole,
    capacity: usize,
    contents: Vec<u8>,
}

/// CPU-only registry and command sink that records every operation.
#[derive(Debug)]
pub struct HeadlessBackend {
    features: RegistryFeatures,
    buffers: FxHashMap<u64, HeadlessBuffer>,
    ops: Vec<RecordedOp>,
    fail_allocations: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Creates a backend exposing every feature.
    #[must_use]
    pub fn new() -> Self {
        Self::with_features(RegistryFeatures::all())
    }

    #[must_use]
    pub fn with_features(features: RegistryFeatures) -> Self {
        Self {
            features,
            buffers: FxHashMap::default(),
            ops: Vec::new(),
            fail_allocations: false,
        }
    }

    /// Makes subsequent allocations fail (simulates device exhaustion).
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Drains the operation log.
    pub fn take_ops(&mut self) -> Vec<RecordedOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of live buffers.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Last bytes uploaded into a buffer.
    #[must_use]
    pub fn contents(&self, buffer: &BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.id()).map(|b| b.contents.as_slice())
    }

    #[must_use]
    pub fn count_ops(&self, pred: impl Fn(&RecordedOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    #[must_use]
    pub fn resize_count(&self) -> usize {
        self.count_ops(|op| matches!(op, RecordedOp::Resize { .. }))
    }

    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.count_ops(|op| matches!(op, RecordedOp::Upload { .. }))
    }

    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.count_ops(|op| matches!(op, RecordedOp::Allocate { .. }))
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.count_ops(|op| matches!(op, RecordedOp::DrawFullscreen { .. }))
    }

    #[must_use]
    pub fn fill_count(&self) -> usize {
        self.count_ops(|op| matches!(op, RecordedOp::Fill { .. }))
    }

    fn get_mut(&mut self, buffer: &BufferHandle) -> Result<&mut HeadlessBuffer> {
        self.buffers
            .get_mut(&buffer.id())
            .ok_or(OitError::UnknownBuffer(buffer.role()))
    }
}

impl ResourceRegistry for HeadlessBackend {
    fn features(&self) -> RegistryFeatures {
        self.features
    }

    fn allocate_buffer(
        &mut self,
        role: BufferRole,
        specs: &[BufferSpec],
        kind: BufferKind,
        _hint: UsageHint,
    ) -> Result<BufferHandle> {
        if self.fail_allocations {
            return Err(OitError::AllocationFailed(role));
        }

        let handle = BufferHandle::new(role, kind, specs);
        let capacity = match kind {
            BufferKind::Storage => 0,
            BufferKind::Uniform => 1,
        };
        self.buffers.insert(
            handle.id(),
            HeadlessBuffer {
                role,
                capacity,
                contents: Vec::new(),
            },
        );
        self.ops.push(RecordedOp::Allocate {
            role,
            kind,
            capacity,
        });
        Ok(handle)
    }

    fn resize_buffer(&mut self, buffer: &BufferHandle, num_elements: usize) -> Result<()> {
        let entry = self.get_mut(buffer)?;
        if num_elements <= entry.capacity {
            return Ok(());
        }
        let from = entry.capacity;
        entry.capacity = num_elements;
        entry.contents.clear();
        let role = entry.role;
        self.ops.push(RecordedOp::Resize {
            role,
            from,
            to: num_elements,
        });
        Ok(())
    }

    fn upload(&mut self, buffer: &BufferHandle, source: &BufferSource) -> Result<()> {
        let entry = self.get_mut(buffer)?;
        entry.contents.clone_from(&source.bytes);
        let role = entry.role;
        self.ops.push(RecordedOp::Upload {
            role,
            bytes: source.bytes.clone(),
        });
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: &BufferHandle) {
        if let Some(entry) = self.buffers.remove(&buffer.id()) {
            self.ops.push(RecordedOp::Destroy { role: entry.role });
        }
    }

    fn buffer_capacity(&self, buffer: &BufferHandle) -> Option<usize> {
        self.buffers.get(&buffer.id()).map(|b| b.capacity)
    }
}

impl CommandSink for HeadlessBackend {
    fn fill_buffer_i32(&mut self, buffer: &BufferHandle, value: i32) -> Result<()> {
        let entry = self.get_mut(buffer)?;
        let elements = entry.capacity;
        entry.contents = bytemuck::cast_slice(&vec![value; elements]).to_vec();
        let role = entry.role;
        self.ops.push(RecordedOp::Fill {
            role,
            value,
            elements,
        });
        Ok(())
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) -> Result<()> {
        for binding in draw.buffers {
            if !self.buffers.contains_key(&binding.buffer.id()) {
                return Err(OitError::UnknownBuffer(binding.buffer.role()));
            }
        }
        self.ops.push(RecordedOp::DrawFullscreen {
            label: draw.label.to_string(),
            shader_hash: draw.shader.hash,
            state: *draw.state,
            buffers: draw.buffers.iter().map(|b| b.buffer.role()).collect(),
            targets: draw.targets.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::ElementType;

    fn storage(backend: &mut HeadlessBackend) -> BufferHandle {
        backend
            .allocate_buffer(
                BufferRole::OitDepth,
                &[BufferSpec::new("oitDepth", ElementType::Float32)],
                BufferKind::Storage,
                UsageHint::SIZE_VARYING,
            )
            .unwrap()
    }

    #[test]
    fn resize_never_shrinks() {
        let mut backend = HeadlessBackend::new();
        let buf = storage(&mut backend);

        backend.resize_buffer(&buf, 64).unwrap();
        backend.resize_buffer(&buf, 16).unwrap();

        assert_eq!(backend.buffer_capacity(&buf), Some(64));
        assert_eq!(backend.resize_count(), 1);
    }

    #[test]
    fn destroyed_handles_are_unknown() {
        let mut backend = HeadlessBackend::new();
        let buf = storage(&mut backend);
        backend.destroy_buffer(&buf);

        assert_eq!(backend.buffer_capacity(&buf), None);
        assert!(backend.resize_buffer(&buf, 4).is_err());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn failing_allocations_create_nothing() {
        let mut backend = HeadlessBackend::new();
        backend.set_fail_allocations(true);
        let result = backend.allocate_buffer(
            BufferRole::OitCounter,
            &[],
            BufferKind::Storage,
            UsageHint::empty(),
        );

        assert!(matches!(result, Err(OitError::AllocationFailed(BufferRole::OitCounter))));
        assert!(backend.ops().is_empty());
    }
}
