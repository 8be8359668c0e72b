//! OIT Buffer Bundle
//!
//! Owns the five OIT buffers across frames. The bundle moves from
//! `Unallocated` to `Allocated` exactly once (until [`OitBufferBundle::release`])
//! and grows with the screen size, never shrinking.
//!
//! Per frame, [`OitBufferBundle::prepare`]:
//! 1. rejects negative sizes before touching anything,
//! 2. allocates the buffers on first use,
//! 3. republishes all five handles into the [`FrameContext`] (the engine may
//!    have cleared it since the last frame),
//! 4. grows the storage buffers and uploads the new screen size when the
//!    request exceeds the recorded size on either axis.

use glam::IVec2;
use log::debug;

use super::sizing::{self, OitCapacities, SizingDecision};
use crate::errors::{OitError, Result};
use crate::renderer::core::{
    BufferHandle, BufferKind, BufferRole, BufferSource, BufferSpec, ElementType, ResourceRegistry,
    UsageHint,
};
use crate::renderer::graph::{ContextKey, FrameContext};

/// Handles of an allocated bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OitBuffers {
    pub counter: BufferHandle,
    pub indices: BufferHandle,
    pub data: BufferHandle,
    pub depth: BufferHandle,
    pub uniforms: BufferHandle,
}

impl OitBuffers {
    /// The four storage buffers, in binding order.
    #[must_use]
    pub fn storage(&self) -> [&BufferHandle; 4] {
        [&self.counter, &self.indices, &self.data, &self.depth]
    }

    /// Context keys paired with the handles published under them.
    #[must_use]
    pub fn entries(&self) -> [(ContextKey, &BufferHandle); 5] {
        [
            (ContextKey::OitCounterBuffer, &self.counter),
            (ContextKey::OitIndexBuffer, &self.indices),
            (ContextKey::OitDataBuffer, &self.data),
            (ContextKey::OitDepthBuffer, &self.depth),
            (ContextKey::OitUniformBuffer, &self.uniforms),
        ]
    }
}

#[derive(Debug, Default)]
enum AllocationState {
    #[default]
    Unallocated,
    Allocated(OitBuffers),
}

/// Persistent owner of the OIT buffers.
#[derive(Debug, Default)]
pub struct OitBufferBundle {
    state: AllocationState,
    screen_size: IVec2,
}

struct PendingBuffer {
    role: BufferRole,
    spec: (&'static str, ElementType),
    kind: BufferKind,
    hint: UsageHint,
}

const PENDING: [PendingBuffer; 5] = [
    PendingBuffer {
        role: BufferRole::OitCounter,
        spec: ("oitCounter", ElementType::Int32),
        kind: BufferKind::Storage,
        hint: UsageHint::SIZE_VARYING.union(UsageHint::CPU_FILLED),
    },
    PendingBuffer {
        role: BufferRole::OitIndices,
        spec: ("oitIndices", ElementType::Int32),
        kind: BufferKind::Storage,
        hint: UsageHint::SIZE_VARYING,
    },
    PendingBuffer {
        role: BufferRole::OitData,
        spec: ("oitData", ElementType::Float32x4),
        kind: BufferKind::Storage,
        hint: UsageHint::SIZE_VARYING,
    },
    PendingBuffer {
        role: BufferRole::OitDepth,
        spec: ("oitDepth", ElementType::Float32),
        kind: BufferKind::Storage,
        hint: UsageHint::SIZE_VARYING,
    },
    PendingBuffer {
        role: BufferRole::OitUniforms,
        spec: ("screenSize", ElementType::Int32x2),
        kind: BufferKind::Uniform,
        hint: UsageHint::empty(),
    },
];

impl OitBufferBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        matches!(self.state, AllocationState::Allocated(_))
    }

    #[must_use]
    pub fn buffers(&self) -> Option<&OitBuffers> {
        match &self.state {
            AllocationState::Allocated(buffers) => Some(buffers),
            AllocationState::Unallocated => None,
        }
    }

    /// Size the buffers are currently grown for.
    #[inline]
    #[must_use]
    pub fn screen_size(&self) -> IVec2 {
        self.screen_size
    }

    /// Capacities implied by the recorded screen size, if allocated.
    #[must_use]
    pub fn capacities(&self) -> Option<OitCapacities> {
        if !self.is_allocated() {
            return None;
        }
        OitCapacities::for_screen(self.screen_size).ok()
    }

    /// Allocates the five buffers on first call; later calls are no-ops.
    ///
    /// Allocation is all-or-nothing: when any buffer fails, the ones already
    /// created are destroyed and the bundle stays unallocated.
    pub fn ensure_allocated(&mut self, registry: &mut dyn ResourceRegistry) -> Result<&OitBuffers> {
        if let AllocationState::Unallocated = self.state {
            let buffers = Self::allocate(registry)?;
            self.screen_size = IVec2::ZERO;
            self.state = AllocationState::Allocated(buffers);
        }
        match &self.state {
            AllocationState::Allocated(buffers) => Ok(buffers),
            AllocationState::Unallocated => Err(OitError::MissingBuffers("OIT buffer bundle".into())),
        }
    }

    fn allocate(registry: &mut dyn ResourceRegistry) -> Result<OitBuffers> {
        let mut created: Vec<BufferHandle> = Vec::with_capacity(PENDING.len());
        for pending in &PENDING {
            let spec = BufferSpec::new(pending.spec.0, pending.spec.1);
            match registry.allocate_buffer(pending.role, &[spec], pending.kind, pending.hint) {
                Ok(handle) => created.push(handle),
                Err(err) => {
                    for handle in &created {
                        registry.destroy_buffer(handle);
                    }
                    return Err(err);
                }
            }
        }

        // A (0, 0) screen still needs the allocator slot.
        let initial = OitCapacities::for_screen(IVec2::ZERO)?;
        if let Err(err) = registry.resize_buffer(&created[0], initial.counter) {
            for handle in &created {
                registry.destroy_buffer(handle);
            }
            return Err(err);
        }

        let [counter, indices, data, depth, uniforms]: [BufferHandle; 5] = created
            .try_into()
            .map_err(|_| OitError::MissingBuffers("OIT buffer bundle".into()))?;
        let buffers = OitBuffers {
            counter,
            indices,
            data,
            depth,
            uniforms,
        };
        debug!("Allocated OIT buffers");
        Ok(buffers)
    }

    /// Publishes the five handles into `ctx`. Returns `false` when unallocated.
    pub fn publish(&self, ctx: &mut FrameContext) -> bool {
        let Some(buffers) = self.buffers() else {
            return false;
        };
        for (key, handle) in buffers.entries() {
            ctx.set_buffer(key, handle.clone());
        }
        true
    }

    /// Grows the buffers for `requested`. Returns whether a grow happened.
    ///
    /// The recorded size is only updated once every resize and the uniform
    /// upload succeeded.
    pub fn grow(&mut self, registry: &mut dyn ResourceRegistry, requested: IVec2) -> Result<bool> {
        let decision = sizing::evaluate(requested, self.screen_size)?;
        let SizingDecision::Grow {
            screen_size,
            capacities,
        } = decision
        else {
            return Ok(false);
        };
        let buffers = self
            .buffers()
            .ok_or_else(|| OitError::MissingBuffers("OIT buffer bundle".into()))?;

        // Largest first: if the data buffer exceeds a backend limit, nothing
        // has been resized yet.
        for buffer in [&buffers.data, &buffers.indices, &buffers.depth] {
            registry.resize_buffer(buffer, capacities.fragments)?;
        }
        registry.resize_buffer(&buffers.counter, capacities.counter)?;
        let uniform = BufferSource::new("screenSize", &screen_size.to_array());
        registry.upload(&buffers.uniforms, &uniform)?;

        debug!(
            "Grew OIT buffers to {}x{} (counter {}, fragments {})",
            screen_size.x, screen_size.y, capacities.counter, capacities.fragments
        );
        self.screen_size = screen_size;
        Ok(true)
    }

    /// Per-frame preparation: validate, allocate, publish, grow.
    pub fn prepare(
        &mut self,
        ctx: &mut FrameContext,
        registry: &mut dyn ResourceRegistry,
        requested: IVec2,
    ) -> Result<()> {
        if requested.x < 0 || requested.y < 0 {
            return Err(OitError::InvalidScreenSize {
                width: requested.x,
                height: requested.y,
            });
        }
        self.ensure_allocated(registry)?;
        self.publish(ctx);
        self.grow(registry, requested)?;
        Ok(())
    }

    /// Destroys the buffers and forgets the recorded size.
    pub fn release(&mut self, registry: &mut dyn ResourceRegistry) {
        if let AllocationState::Allocated(buffers) = std::mem::take(&mut self.state) {
            for (_, handle) in buffers.entries() {
                registry.destroy_buffer(handle);
            }
            debug!("Released OIT buffers");
        }
        self.screen_size = IVec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::{HeadlessBackend, RecordedOp};

    #[test]
    fn first_prepare_allocates_publishes_and_grows() {
        let mut bundle = OitBufferBundle::new();
        let mut ctx = FrameContext::new();
        let mut backend = HeadlessBackend::new();

        bundle.prepare(&mut ctx, &mut backend, IVec2::new(100, 50)).unwrap();

        assert_eq!(backend.allocation_count(), 5);
        assert_eq!(backend.upload_count(), 1);
        let buffers = bundle.buffers().unwrap();
        assert_eq!(backend.buffer_capacity(&buffers.counter), Some(5001));
        assert_eq!(backend.buffer_capacity(&buffers.depth), Some(40_000));
        for key in ContextKey::OIT_BUFFERS {
            assert!(ctx.buffer(key).is_some(), "{key:?} not published");
        }
        assert_eq!(
            backend.contents(&buffers.uniforms),
            Some(bytemuck::cast_slice::<i32, u8>(&[100, 50]))
        );
    }

    #[test]
    fn failed_allocation_leaves_nothing_behind() {
        struct FailOnUniform(HeadlessBackend);

        impl ResourceRegistry for FailOnUniform {
            fn features(&self) -> crate::renderer::core::RegistryFeatures {
                self.0.features()
            }
            fn allocate_buffer(
                &mut self,
                role: BufferRole,
                specs: &[BufferSpec],
                kind: BufferKind,
                hint: UsageHint,
            ) -> Result<BufferHandle> {
                if role == BufferRole::OitUniforms {
                    return Err(OitError::AllocationFailed(role));
                }
                self.0.allocate_buffer(role, specs, kind, hint)
            }
            fn resize_buffer(&mut self, buffer: &BufferHandle, n: usize) -> Result<()> {
                self.0.resize_buffer(buffer, n)
            }
            fn upload(&mut self, buffer: &BufferHandle, source: &BufferSource) -> Result<()> {
                self.0.upload(buffer, source)
            }
            fn destroy_buffer(&mut self, buffer: &BufferHandle) {
                self.0.destroy_buffer(buffer);
            }
            fn buffer_capacity(&self, buffer: &BufferHandle) -> Option<usize> {
                self.0.buffer_capacity(buffer)
            }
        }

        let mut registry = FailOnUniform(HeadlessBackend::new());
        let mut bundle = OitBufferBundle::new();

        assert!(bundle.ensure_allocated(&mut registry).is_err());
        assert!(!bundle.is_allocated());
        assert_eq!(registry.0.live_buffers(), 0);
        assert_eq!(
            registry.0.count_ops(|op| matches!(op, RecordedOp::Destroy { .. })),
            4
        );
    }

    #[test]
    fn release_returns_to_unallocated() {
        let mut bundle = OitBufferBundle::new();
        let mut ctx = FrameContext::new();
        let mut backend = HeadlessBackend::new();
        bundle.prepare(&mut ctx, &mut backend, IVec2::new(8, 8)).unwrap();

        bundle.release(&mut backend);

        assert!(!bundle.is_allocated());
        assert_eq!(bundle.screen_size(), IVec2::ZERO);
        assert_eq!(backend.live_buffers(), 0);
        assert!(bundle.capacities().is_none());
    }
}
