//! Frame Context & Producer Protocol Tests
//!
//! Tests for:
//! - FrameContext: typed accessors, flags, named keys, clearing
//! - OitBufferAccessor: request, once-per-frame initialization, frame states

use myth_oit::renderer::oit::accessor::COUNTER_CLEAR_VALUE;
use myth_oit::{
    BufferRole, ContextKey, ContextValue, FrameContext, HeadlessBackend, OitBufferAccessor,
    OitBufferBundle, OitFrameState, RecordedOp, ResourceRegistry,
};

// ============================================================================
// FrameContext
// ============================================================================

#[test]
fn insert_get_remove() {
    let mut ctx = FrameContext::new();
    let key = ContextKey::named("selectionBuffer");

    assert!(ctx.insert(key, ContextValue::Flag(false)).is_none());
    assert_eq!(ctx.get(key), Some(&ContextValue::Flag(false)));
    assert!(ctx.contains(key));
    // Presence is what counts for flags.
    assert!(ctx.has_flag(key));

    assert_eq!(ctx.remove(key), Some(ContextValue::Flag(false)));
    assert!(!ctx.contains(key));
    assert!(ctx.is_empty());
}

#[test]
fn typed_lookups_ignore_other_variants() {
    let mut ctx = FrameContext::new();
    ctx.set_flag(ContextKey::OitCounterBuffer);

    assert!(ctx.buffer(ContextKey::OitCounterBuffer).is_none());
    assert!(ctx.aov_bindings().is_none());
}

#[test]
fn clear_drops_everything() {
    let mut ctx = FrameContext::new();
    ctx.set_flag(ContextKey::OitRequestFlag);
    ctx.set_flag(ContextKey::OitClearedFlag);
    ctx.set_aov_bindings(Vec::new());
    assert_eq!(ctx.len(), 3);

    ctx.clear();
    assert!(ctx.is_empty());
}

// ============================================================================
// OitBufferAccessor
// ============================================================================

fn allocated_context(backend: &mut HeadlessBackend) -> (FrameContext, OitBufferBundle) {
    let mut ctx = FrameContext::new();
    let mut bundle = OitBufferBundle::new();
    bundle
        .prepare(&mut ctx, backend, glam::IVec2::new(4, 4))
        .unwrap();
    backend.take_ops();
    (ctx, bundle)
}

#[test]
fn initialization_clears_once_per_frame() {
    let mut backend = HeadlessBackend::new();
    let (mut ctx, bundle) = allocated_context(&mut backend);

    OitBufferAccessor::new(&mut ctx).request_oit_buffers();
    assert_eq!(OitBufferAccessor::new(&mut ctx).frame_state(), OitFrameState::Requested);

    for _ in 0..3 {
        OitBufferAccessor::new(&mut ctx)
            .initialize_oit_buffers_if_necessary(&mut backend)
            .unwrap();
    }

    assert_eq!(
        backend.ops(),
        [RecordedOp::Fill {
            role: BufferRole::OitCounter,
            value: COUNTER_CLEAR_VALUE,
            elements: 17,
        }]
    );
    let counter = &bundle.buffers().unwrap().counter;
    let contents: &[i32] = bytemuck::cast_slice(backend.contents(counter).unwrap());
    assert!(contents.iter().all(|&v| v == -1));
    assert_eq!(OitBufferAccessor::new(&mut ctx).frame_state(), OitFrameState::Accumulating);
}

#[test]
fn removing_cleared_flag_re_enables_clearing() {
    let mut backend = HeadlessBackend::new();
    let (mut ctx, _bundle) = allocated_context(&mut backend);

    let mut accessor = OitBufferAccessor::new(&mut ctx);
    accessor.initialize_oit_buffers_if_necessary(&mut backend).unwrap();
    ctx.take_flag(ContextKey::OitClearedFlag);
    OitBufferAccessor::new(&mut ctx)
        .initialize_oit_buffers_if_necessary(&mut backend)
        .unwrap();

    assert_eq!(backend.fill_count(), 2);
}

#[test]
fn bindings_follow_published_handles() {
    let mut backend = HeadlessBackend::new();
    let (mut ctx, bundle) = allocated_context(&mut backend);

    let bindings = OitBufferAccessor::new(&mut ctx).buffer_bindings().unwrap();
    assert_eq!(&bindings.counter, &bundle.buffers().unwrap().counter);
    assert_eq!(backend.buffer_capacity(&bindings.depth), Some(4 * 4 * 8));

    ctx.remove(ContextKey::OitUniformBuffer);
    assert!(OitBufferAccessor::new(&mut ctx).buffer_bindings().is_none());
}
