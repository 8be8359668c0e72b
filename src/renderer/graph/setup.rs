//! Render Setup Task
//!
//! Publishes the frame's output bindings into the [`FrameContext`] so that
//! later tasks (the OIT resolve task in particular) can find the color and
//! depth targets of the frame.

use super::aov::AovBinding;
use super::context::FrameContext;
use super::node::{DirtyBits, RenderTask};
use super::stage::RenderStage;
use crate::renderer::core::{CommandSink, ResourceRegistry};

/// Setup-stage task publishing a configured list of AOV bindings.
#[derive(Debug, Default)]
pub struct RenderSetupTask {
    name: String,
    aov_bindings: Vec<AovBinding>,
}

impl RenderSetupTask {
    #[must_use]
    pub fn new(name: impl Into<String>, aov_bindings: Vec<AovBinding>) -> Self {
        Self {
            name: name.into(),
            aov_bindings,
        }
    }

    /// Replaces the bindings published from the next prepare on.
    pub fn set_aov_bindings(&mut self, aov_bindings: Vec<AovBinding>) {
        self.aov_bindings = aov_bindings;
    }

    #[must_use]
    pub fn aov_bindings(&self) -> &[AovBinding] {
        &self.aov_bindings
    }
}

impl RenderTask for RenderSetupTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> RenderStage {
        RenderStage::Setup
    }

    fn sync(&mut self, _ctx: &mut FrameContext, dirty: &mut DirtyBits) {
        *dirty = DirtyBits::empty();
    }

    fn prepare(&mut self, ctx: &mut FrameContext, _registry: &mut dyn ResourceRegistry) {
        ctx.set_aov_bindings(self.aov_bindings.clone());
    }

    fn execute(&mut self, _ctx: &mut FrameContext, _sink: &mut dyn CommandSink) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::HeadlessBackend;
    use crate::renderer::graph::RenderBufferId;

    #[test]
    fn prepare_publishes_bindings() {
        let color = AovBinding::new(
            "color",
            RenderBufferId::next(),
            640,
            480,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let mut task = RenderSetupTask::new("setup", vec![color.clone()]);
        let mut ctx = FrameContext::new();
        let mut backend = HeadlessBackend::new();

        task.prepare(&mut ctx, &mut backend);

        assert_eq!(ctx.aov_bindings(), Some(&[color][..]));
        assert!(backend.ops().is_empty());
    }
}
