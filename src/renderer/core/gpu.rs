//! wgpu Backend
//!
//! [`GpuResourceRegistry`] owns the `wgpu` buffers behind [`BufferHandle`]s and
//! the render targets referenced by AOV bindings. [`GpuFrame`] borrows the
//! registry together with a command encoder for the execute phase.
//!
//! # Growth
//!
//! Storage buffers are recreated when they grow. Contents are discarded and the
//! old buffer is dropped rather than destroyed, so encoders recorded before the
//! grow but not yet submitted keep it alive. Every frame clears the OIT buffers
//! before writing, so nothing needs to survive a grow.
//!
//! Sizes are checked against the device limits before `create_buffer` is
//! called; an oversized request is an [`OitError::BufferTooLarge`] instead of
//! a device validation error.
//!
//! # Pipelines
//!
//! Full-screen pipelines are cached by shader hash, target formats, pass state
//! and binding layout. Bind groups are rebuilt per draw since the underlying
//! buffers may have been recreated by a grow.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use wgpu::util::DeviceExt;

use super::buffer::{BufferHandle, BufferKind, BufferRole, BufferSource, BufferSpec, UsageHint};
use super::registry::{
    BufferAccess, CommandSink, FullscreenDraw, RegistryFeatures, ResourceRegistry,
};
use crate::errors::{OitError, Result};
use crate::renderer::graph::{PassRenderState, RenderBufferId};

/// Minimum storage buffers a fragment stage must support to run the resolve.
const REQUIRED_FRAGMENT_STORAGE_BUFFERS: u32 = 4;

struct GpuBuffer {
    role: BufferRole,
    buffer: wgpu::Buffer,
    usage: wgpu::BufferUsages,
    stride: u64,
    capacity: usize,
}

impl GpuBuffer {
    fn new(
        device: &wgpu::Device,
        limits: &BufferLimits,
        role: BufferRole,
        usage: wgpu::BufferUsages,
        stride: u64,
        capacity: usize,
    ) -> Result<Self> {
        Ok(Self {
            role,
            buffer: Self::create(device, limits, role, usage, stride, capacity)?,
            usage,
            stride,
            capacity,
        })
    }

    fn create(
        device: &wgpu::Device,
        limits: &BufferLimits,
        role: BufferRole,
        usage: wgpu::BufferUsages,
        stride: u64,
        capacity: usize,
    ) -> Result<wgpu::Buffer> {
        let size = limits.check(role, usage, stride, capacity)?;
        Ok(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(role.as_str()),
            size,
            usage,
            mapped_at_creation: false,
        }))
    }

    /// Replaces the buffer with a larger one. On error nothing changes.
    fn grow(&mut self, device: &wgpu::Device, limits: &BufferLimits, capacity: usize) -> Result<()> {
        let buffer = Self::create(device, limits, self.role, self.usage, self.stride, capacity)?;
        log::debug!(
            "Resizing buffer {} from {} to {} elements",
            self.role,
            self.capacity,
            capacity
        );
        self.buffer = buffer;
        self.capacity = capacity;
        Ok(())
    }
}

/// Device limits a buffer must fit before it is created.
#[derive(Debug, Clone, Copy)]
struct BufferLimits {
    max_buffer_size: u64,
    max_storage_binding: u64,
    max_uniform_binding: u64,
}

impl BufferLimits {
    fn from_device(device: &wgpu::Device) -> Self {
        let limits = device.limits();
        Self {
            max_buffer_size: limits.max_buffer_size,
            max_storage_binding: limits.max_storage_buffer_binding_size,
            max_uniform_binding: u64::from(limits.max_uniform_buffer_binding_size),
        }
    }

    /// Byte size of `capacity` elements, or `BufferTooLarge` when the buffer
    /// could not be created or bound whole.
    fn check(
        &self,
        role: BufferRole,
        usage: wgpu::BufferUsages,
        stride: u64,
        capacity: usize,
    ) -> Result<u64> {
        // Zero-sized buffers cannot be bound; keep at least one element.
        let elements = u64::try_from(capacity.max(1)).unwrap_or(u64::MAX);
        let size = stride.saturating_mul(elements);

        let mut limit = self.max_buffer_size;
        if usage.contains(wgpu::BufferUsages::STORAGE) {
            limit = limit.min(self.max_storage_binding);
        }
        if usage.contains(wgpu::BufferUsages::UNIFORM) {
            limit = limit.min(self.max_uniform_binding);
        }
        if size > limit {
            return Err(OitError::BufferTooLarge { role, size, limit });
        }
        Ok(size)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct FullscreenPipelineKey {
    shader_hash: u128,
    formats: SmallVec<[wgpu::TextureFormat; 4]>,
    state: PassRenderState,
    layout: SmallVec<[(u32, BufferAccess); 5]>,
}

struct FullscreenPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// `wgpu`-backed [`ResourceRegistry`].
pub struct GpuResourceRegistry {
    device: wgpu::Device,
    queue: wgpu::Queue,
    features: RegistryFeatures,
    limits: BufferLimits,
    buffers: FxHashMap<u64, GpuBuffer>,
    // Immutable COPY_SRC buffers holding a repeated fill value.
    fill_sources: FxHashMap<i32, wgpu::Buffer>,
    render_targets: FxHashMap<RenderBufferId, wgpu::TextureView>,
    pipelines: FxHashMap<FullscreenPipelineKey, FullscreenPipeline>,
    shader_modules: FxHashMap<u128, wgpu::ShaderModule>,
}

impl GpuResourceRegistry {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let mut features = RegistryFeatures::empty();
        if device.limits().max_storage_buffers_per_shader_stage >= REQUIRED_FRAGMENT_STORAGE_BUFFERS
        {
            features |= RegistryFeatures::FRAGMENT_STORAGE_BUFFERS;
        }

        Self {
            limits: BufferLimits::from_device(&device),
            device,
            queue,
            features,
            buffers: FxHashMap::default(),
            fill_sources: FxHashMap::default(),
            render_targets: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            shader_modules: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Registers a render target so AOV bindings can reference it.
    pub fn register_render_target(&mut self, view: wgpu::TextureView) -> RenderBufferId {
        let id = RenderBufferId::next();
        self.render_targets.insert(id, view);
        id
    }

    pub fn unregister_render_target(&mut self, id: RenderBufferId) {
        self.render_targets.remove(&id);
    }

    /// The `wgpu` buffer currently backing a handle.
    #[must_use]
    pub fn buffer(&self, handle: &BufferHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(&handle.id()).map(|b| &b.buffer)
    }

    /// Starts recording execute-phase commands into `encoder`.
    pub fn begin_frame<'a>(&'a mut self, encoder: &'a mut wgpu::CommandEncoder) -> GpuFrame<'a> {
        GpuFrame {
            registry: self,
            encoder,
        }
    }

    fn entry(&self, handle: &BufferHandle) -> Result<&GpuBuffer> {
        self.buffers
            .get(&handle.id())
            .ok_or(OitError::UnknownBuffer(handle.role()))
    }

    /// A copy source of at least `size` bytes filled with `value`.
    fn fill_source(&mut self, value: i32, size: u64) -> wgpu::Buffer {
        if let Some(source) = self.fill_sources.get(&value)
            && source.size() >= size
        {
            return source.clone();
        }
        let words = usize::try_from(size.div_ceil(4)).unwrap_or(usize::MAX);
        let source = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fill source"),
            contents: bytemuck::cast_slice(&vec![value; words]),
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        self.fill_sources.insert(value, source.clone());
        source
    }

    fn get_or_create_pipeline(
        &mut self,
        key: &FullscreenPipelineKey,
        draw: &FullscreenDraw<'_>,
    ) -> &FullscreenPipeline {
        if !self.pipelines.contains_key(key) {
            let pipeline = self.create_pipeline(key, draw);
            self.pipelines.insert(key.clone(), pipeline);
        }
        &self.pipelines[key]
    }

    fn create_pipeline(
        &mut self,
        key: &FullscreenPipelineKey,
        draw: &FullscreenDraw<'_>,
    ) -> FullscreenPipeline {
        log::debug!("Compiling full-screen pipeline {}", draw.label);

        let device = &self.device;
        let module: &wgpu::ShaderModule = self
            .shader_modules
            .entry(draw.shader.hash)
            .or_insert_with(|| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(draw.shader.name.as_str()),
                    source: wgpu::ShaderSource::Wgsl(Cow::Owned(draw.shader.code.clone())),
                })
            });

        let entries: Vec<wgpu::BindGroupLayoutEntry> = key
            .layout
            .iter()
            .map(|&(binding, access)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: match access {
                        BufferAccess::ReadOnlyStorage => {
                            wgpu::BufferBindingType::Storage { read_only: true }
                        }
                        BufferAccess::ReadWriteStorage => {
                            wgpu::BufferBindingType::Storage { read_only: false }
                        }
                        BufferAccess::Uniform => wgpu::BufferBindingType::Uniform,
                    },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(draw.label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(draw.label),
            bind_group_layouts: &[Some(&bind_group_layout)],
            immediate_size: 0,
        });

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = key
            .formats
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: key.state.blend,
                    write_mask: key.state.color_mask,
                })
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(draw.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        FullscreenPipeline {
            pipeline,
            bind_group_layout,
        }
    }
}

impl ResourceRegistry for GpuResourceRegistry {
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
        let handle = BufferHandle::new(role, kind, specs);
        let (usage, capacity) = match kind {
            BufferKind::Storage => (
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                0,
            ),
            BufferKind::Uniform => (
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                1,
            ),
        };
        // Uniform blocks are padded to 16 bytes.
        let stride = match kind {
            BufferKind::Storage => handle.stride() as u64,
            BufferKind::Uniform => (handle.stride() as u64).next_multiple_of(16),
        };
        if stride == 0 {
            return Err(OitError::AllocationFailed(role));
        }

        let buffer = GpuBuffer::new(&self.device, &self.limits, role, usage, stride, capacity)?;
        self.buffers.insert(handle.id(), buffer);
        Ok(handle)
    }

    fn resize_buffer(&mut self, buffer: &BufferHandle, num_elements: usize) -> Result<()> {
        let entry = self
            .buffers
            .get_mut(&buffer.id())
            .ok_or(OitError::UnknownBuffer(buffer.role()))?;
        if num_elements > entry.capacity {
            entry.grow(&self.device, &self.limits, num_elements)?;
        }
        Ok(())
    }

    fn upload(&mut self, buffer: &BufferHandle, source: &BufferSource) -> Result<()> {
        let entry = self.entry(buffer)?;
        self.queue.write_buffer(&entry.buffer, 0, &source.bytes);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: &BufferHandle) {
        // Dropped, not destroyed: unsubmitted encoders may still use it.
        self.buffers.remove(&buffer.id());
    }

    fn buffer_capacity(&self, buffer: &BufferHandle) -> Option<usize> {
        self.buffers.get(&buffer.id()).map(|b| b.capacity)
    }
}

/// Execute-phase [`CommandSink`] recording into a `wgpu` command encoder.
pub struct GpuFrame<'a> {
    registry: &'a mut GpuResourceRegistry,
    encoder: &'a mut wgpu::CommandEncoder,
}

impl CommandSink for GpuFrame<'_> {
    fn fill_buffer_i32(&mut self, buffer: &BufferHandle, value: i32) -> Result<()> {
        // Recorded in the encoder so the fill lands in command order, not at
        // the start of the next submit like a queue write would.
        let target = self.registry.entry(buffer)?.buffer.clone();
        if value == 0 {
            self.encoder.clear_buffer(&target, 0, None);
        } else {
            let size = target.size();
            let source = self.registry.fill_source(value, size);
            self.encoder.copy_buffer_to_buffer(&source, 0, &target, 0, size);
        }
        Ok(())
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) -> Result<()> {
        // Depth is never attached: full-screen passes run without depth test.
        let color_targets: SmallVec<[_; 4]> = draw.targets.iter().filter(|t| !t.is_depth()).collect();

        let mut views = SmallVec::<[&wgpu::TextureView; 4]>::new();
        for target in &color_targets {
            let view = self
                .registry
                .render_targets
                .get(&target.render_buffer)
                .ok_or(OitError::UnknownRenderTarget(target.render_buffer.raw()))?;
            views.push(view);
        }

        let mut buffers = SmallVec::<[&wgpu::Buffer; 5]>::new();
        for binding in draw.buffers {
            buffers.push(&self.registry.entry(&binding.buffer)?.buffer);
        }

        let key = FullscreenPipelineKey {
            shader_hash: draw.shader.hash,
            formats: color_targets.iter().map(|t| t.format).collect(),
            state: *draw.state,
            layout: draw.buffers.iter().map(|b| (b.binding, b.access)).collect(),
        };

        // Clone handles out so the registry can be borrowed mutably for the cache.
        let views: SmallVec<[wgpu::TextureView; 4]> = views.into_iter().cloned().collect();
        let buffers: SmallVec<[wgpu::Buffer; 5]> = buffers.into_iter().cloned().collect();

        let (render_pipeline, bind_group_layout) = {
            let cached = self.registry.get_or_create_pipeline(&key, draw);
            (cached.pipeline.clone(), cached.bind_group_layout.clone())
        };

        let entries: Vec<wgpu::BindGroupEntry> = draw
            .buffers
            .iter()
            .zip(buffers.iter())
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding.binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = self
            .registry
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(draw.label),
                layout: &bind_group_layout,
                entries: &entries,
            });

        let attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_targets
            .iter()
            .zip(views.iter())
            .map(|(target, view)| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match target.clear_value {
                            Some(color) => wgpu::LoadOp::Clear(color),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(draw.label),
            color_attachments: &attachments,
            ..Default::default()
        });

        pass.set_pipeline(&render_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);

        Ok(())
    }
}
