//! OIT Resolve Task
//!
//! The single consumer of the OIT buffers in a frame. It owns the
//! [`OitBufferBundle`], so the buffers live as long as the task (or until
//! [`OitResolveTask::release`]).
//!
//! # Prepare
//!
//! 1. Return untouched unless a producer set `OitRequestFlag`.
//! 2. Remove `OitClearedFlag`, so the first OIT task to execute clears again.
//! 3. On first use, check backend support and build the pass state and shader.
//! 4. Copy the AOV bindings with their clear values stripped.
//! 5. Size the buffers from the first AOV, or from the fallback resolution.
//!
//! # Execute
//!
//! Consumes `OitRequestFlag` and `OitClearedFlag`, then draws the full-screen
//! composite over the color targets.
//!
//! Failures are logged and end the task for the current frame; they never
//! reach other tasks.

use glam::IVec2;
use log::{error, trace, warn};

use super::accessor::OitBufferBindings;
use super::bundle::OitBufferBundle;
use super::shader;
use crate::errors::{OitError, Result};
use crate::renderer::core::{CommandSink, FullscreenDraw, RegistryFeatures, ResourceRegistry};
use crate::renderer::graph::{
    AovBinding, ContextKey, FrameContext, PassRenderState, RenderStage, RenderTask,
};
use crate::renderer::pipeline::ShaderProgram;
use crate::renderer::settings::OitSettings;

/// Fixed-function state of the resolve pass: no depth, full color mask,
/// premultiplied "over" blending.
#[must_use]
pub fn resolve_render_state() -> PassRenderState {
    PassRenderState {
        depth_test: false,
        depth_write: false,
        color_mask: wgpu::ColorWrites::ALL,
        blend: Some(PassRenderState::PREMULTIPLIED_OVER),
    }
}

/// Resolve pass built once on first use.
#[derive(Debug)]
struct ResolvePass {
    state: PassRenderState,
    shader: ShaderProgram,
}

/// Composites the fragments accumulated by OIT producers.
#[derive(Debug)]
pub struct OitResolveTask {
    name: String,
    settings: OitSettings,
    bundle: OitBufferBundle,
    pass: Option<ResolvePass>,
    aov_bindings: Vec<AovBinding>,
    requested_size: Option<IVec2>,
    fallback_warnings: usize,
}

impl OitResolveTask {
    #[must_use]
    pub fn new(name: impl Into<String>, settings: OitSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            bundle: OitBufferBundle::new(),
            pass: None,
            aov_bindings: Vec::new(),
            requested_size: None,
            fallback_warnings: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &OitSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn bundle(&self) -> &OitBufferBundle {
        &self.bundle
    }

    /// AOV bindings copied during the last prepare, clear values stripped.
    #[must_use]
    pub fn aov_bindings(&self) -> &[AovBinding] {
        &self.aov_bindings
    }

    /// How many times the fallback resolution was newly adopted.
    #[inline]
    #[must_use]
    pub fn fallback_warnings(&self) -> usize {
        self.fallback_warnings
    }

    /// Pass state, once built.
    #[must_use]
    pub fn render_state(&self) -> Option<&PassRenderState> {
        self.pass.as_ref().map(|pass| &pass.state)
    }

    /// Destroys the OIT buffers. They are allocated again on the next
    /// requested frame.
    pub fn release(&mut self, registry: &mut dyn ResourceRegistry) {
        self.bundle.release(registry);
        self.requested_size = None;
    }

    fn ensure_pass(&mut self, registry: &dyn ResourceRegistry) -> Result<()> {
        if self.pass.is_some() {
            return Ok(());
        }
        if !registry
            .features()
            .contains(RegistryFeatures::FRAGMENT_STORAGE_BUFFERS)
        {
            return Err(OitError::UnsupportedBackend(
                "fragment storage buffers are not available".into(),
            ));
        }
        self.pass = Some(ResolvePass {
            state: resolve_render_state(),
            shader: shader::resolve_program()?,
        });
        Ok(())
    }

    fn screen_size(&mut self) -> IVec2 {
        let size = if let Some(first) = self.aov_bindings.first() {
            IVec2::new(
                i32::try_from(first.width).unwrap_or(i32::MAX),
                i32::try_from(first.height).unwrap_or(i32::MAX),
            )
        } else {
            let fallback = IVec2::splat(self.settings.fallback_screen_size);
            if self.requested_size != Some(fallback) {
                self.fallback_warnings += 1;
                warn!(
                    "{}: no AOV bindings in the frame context (render setup must run first), \
                     using fallback resolution {}x{}",
                    self.name, fallback.x, fallback.y
                );
            }
            fallback
        };
        self.requested_size = Some(size);
        size
    }
}

impl RenderTask for OitResolveTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> RenderStage {
        RenderStage::Resolve
    }

    fn prepare(&mut self, ctx: &mut FrameContext, registry: &mut dyn ResourceRegistry) {
        if !self.settings.enabled || !ctx.has_flag(ContextKey::OitRequestFlag) {
            trace!("{}: no OIT requested this frame", self.name);
            return;
        }
        ctx.take_flag(ContextKey::OitClearedFlag);

        if let Err(err) = self.ensure_pass(registry) {
            error!("{}: {err}", self.name);
            return;
        }

        self.aov_bindings = ctx
            .aov_bindings()
            .unwrap_or_default()
            .iter()
            .map(|aov| AovBinding {
                clear_value: None,
                ..aov.clone()
            })
            .collect();

        let size = self.screen_size();
        if let Err(err) = self.bundle.prepare(ctx, registry, size) {
            error!("{}: {err}", self.name);
        }
    }

    fn execute(&mut self, ctx: &mut FrameContext, sink: &mut dyn CommandSink) {
        if !ctx.take_flag(ContextKey::OitRequestFlag) {
            trace!("{}: nothing to resolve", self.name);
            return;
        }
        ctx.take_flag(ContextKey::OitClearedFlag);

        if !self.settings.enabled {
            return;
        }
        let Some(pass) = &self.pass else {
            error!("{}: {}", self.name, OitError::MissingRenderState(self.name.clone()));
            return;
        };
        let Some(bindings) = OitBufferBindings::from_context(ctx) else {
            error!("{}: {}", self.name, OitError::MissingBuffers(self.name.clone()));
            return;
        };

        let buffers = bindings.for_reading();
        let draw = FullscreenDraw {
            label: &self.name,
            shader: &pass.shader,
            state: &pass.state,
            buffers: &buffers,
            targets: &self.aov_bindings,
        };
        if let Err(err) = sink.draw_fullscreen(&draw) {
            error!("{}: {err}", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_state_blends_without_depth() {
        let state = resolve_render_state();
        assert!(!state.depth_test);
        assert!(!state.depth_write);
        assert_eq!(state.color_mask, wgpu::ColorWrites::ALL);
        assert_eq!(state.blend, Some(PassRenderState::PREMULTIPLIED_OVER));
    }

    #[test]
    fn fallback_size_is_reported_once() {
        let mut task = OitResolveTask::new("oitResolve", OitSettings::default());
        assert_eq!(task.screen_size(), IVec2::splat(2048));
        assert_eq!(task.requested_size, Some(IVec2::splat(2048)));
        assert_eq!(task.screen_size(), IVec2::splat(2048));
        assert_eq!(task.fallback_warnings(), 1);
    }
}
