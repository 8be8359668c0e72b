//! wgpu Registry Tests
//!
//! Tests for:
//! - GpuResourceRegistry against wgpu's no-op device
//! - Resolve prepare at resolutions the device limits cannot hold
//! - A full producer / resolve frame recorded into a command encoder

use glam::IVec2;

use myth_oit::{
    AovBinding, CommandSink, ContextKey, FrameContext, GpuResourceRegistry, OitBufferBindings,
    OitRenderTask, OitResolveTask, OitSettings, RegistryFeatures, RenderTask, ResourceRegistry,
    Result,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn noop_registry() -> GpuResourceRegistry {
    let (device, queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
    GpuResourceRegistry::new(device, queue)
}

#[test]
fn default_limits_support_the_resolve() {
    let registry = noop_registry();
    assert!(
        registry
            .features()
            .contains(RegistryFeatures::FRAGMENT_STORAGE_BUFFERS)
    );
}

#[test]
fn oversized_fallback_fails_inside_prepare() {
    init_logger();
    let mut registry = noop_registry();
    let mut task = OitResolveTask::new("oitResolve", OitSettings::default());
    let mut ctx = FrameContext::new();
    ctx.set_flag(ContextKey::OitRequestFlag);

    // 2048x2048 needs a 512 MiB data buffer.
    task.prepare(&mut ctx, &mut registry);

    assert!(task.bundle().is_allocated());
    assert_eq!(task.bundle().screen_size(), IVec2::ZERO);
    let counter = ctx.buffer(ContextKey::OitCounterBuffer).unwrap();
    let data = ctx.buffer(ContextKey::OitDataBuffer).unwrap();
    assert_eq!(registry.buffer_capacity(data), Some(0));
    assert_eq!(registry.buffer_capacity(counter), Some(1));
}

#[test]
fn fitting_fallback_grows_all_buffers() {
    init_logger();
    let mut registry = noop_registry();
    let settings = OitSettings {
        fallback_screen_size: 512,
        ..OitSettings::default()
    };
    let mut task = OitResolveTask::new("oitResolve", settings);
    let mut ctx = FrameContext::new();
    ctx.set_flag(ContextKey::OitRequestFlag);

    task.prepare(&mut ctx, &mut registry);

    assert_eq!(task.bundle().screen_size(), IVec2::splat(512));
    let counter = ctx.buffer(ContextKey::OitCounterBuffer).unwrap();
    let data = ctx.buffer(ContextKey::OitDataBuffer).unwrap();
    assert_eq!(registry.buffer_capacity(counter), Some(512 * 512 + 1));
    assert_eq!(registry.buffer_capacity(data), Some(512 * 512 * 8));
    assert!(registry.buffer(data).unwrap().size() >= 512 * 512 * 8 * 16);
}

fn noop(_: &OitBufferBindings, _: &mut dyn CommandSink) -> Result<()> {
    Ok(())
}

fn color_target(registry: &mut GpuResourceRegistry, width: u32, height: u32) -> AovBinding {
    let format = wgpu::TextureFormat::Rgba16Float;
    let texture = registry.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("color"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let id = registry.register_render_target(view);
    AovBinding::new("color", id, width, height, format).with_clear_value(wgpu::Color::BLACK)
}

#[test]
fn producer_and_resolve_record_a_frame() {
    init_logger();
    let mut registry = noop_registry();
    let settings = OitSettings::default();
    let mut producer = OitRenderTask::new("glass", settings, noop);
    let mut resolve = OitResolveTask::new("oitResolve", settings);
    let mut ctx = FrameContext::new();
    ctx.set_aov_bindings(vec![color_target(&mut registry, 64, 32)]);

    for _ in 0..2 {
        producer.prepare(&mut ctx, &mut registry);
        resolve.prepare(&mut ctx, &mut registry);
        assert_eq!(resolve.bundle().screen_size(), IVec2::new(64, 32));

        let mut encoder = registry
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        {
            let mut frame = registry.begin_frame(&mut encoder);
            producer.execute(&mut ctx, &mut frame);
            assert!(ctx.has_flag(ContextKey::OitClearedFlag));
            resolve.execute(&mut ctx, &mut frame);
        }
        registry.queue().submit([encoder.finish()]);

        assert!(!ctx.has_flag(ContextKey::OitRequestFlag));
        assert!(!ctx.has_flag(ContextKey::OitClearedFlag));
    }
}
