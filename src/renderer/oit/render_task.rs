//! OIT Producer Task
//!
//! [`OitRenderTask`] drives the producer side of the OIT protocol around a
//! [`FragmentWriter`], which records the actual translucent draws.

use log::{error, trace};

use super::accessor::{OitBufferAccessor, OitBufferBindings};
use crate::errors::{OitError, Result};
use crate::renderer::core::{CommandSink, ResourceRegistry};
use crate::renderer::graph::{FrameContext, RenderStage, RenderTask};
use crate::renderer::settings::OitSettings;

/// Records translucent draws that append fragments to the OIT buffers.
pub trait FragmentWriter {
    /// Whether there is anything to draw this frame.
    fn has_work(&self) -> bool {
        true
    }

    /// Records the draws. `bindings` holds the cleared, published buffers.
    fn write_fragments(
        &mut self,
        bindings: &OitBufferBindings,
        sink: &mut dyn CommandSink,
    ) -> Result<()>;
}

impl<F> FragmentWriter for F
where
    F: FnMut(&OitBufferBindings, &mut dyn CommandSink) -> Result<()>,
{
    fn write_fragments(
        &mut self,
        bindings: &OitBufferBindings,
        sink: &mut dyn CommandSink,
    ) -> Result<()> {
        self(bindings, sink)
    }
}

/// Transparent-stage task accumulating fragments into the OIT buffers.
pub struct OitRenderTask {
    name: String,
    settings: OitSettings,
    writer: Box<dyn FragmentWriter>,
    requested: bool,
}

impl OitRenderTask {
    pub fn new(
        name: impl Into<String>,
        settings: OitSettings,
        writer: impl FragmentWriter + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            writer: Box::new(writer),
            requested: false,
        }
    }

    /// Whether the last prepare requested OIT buffers.
    #[inline]
    #[must_use]
    pub fn requested(&self) -> bool {
        self.requested
    }
}

impl RenderTask for OitRenderTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> RenderStage {
        RenderStage::Transparent
    }

    fn prepare(&mut self, ctx: &mut FrameContext, _registry: &mut dyn ResourceRegistry) {
        self.requested = self.settings.enabled && self.writer.has_work();
        if self.requested {
            OitBufferAccessor::new(ctx).request_oit_buffers();
        }
    }

    fn execute(&mut self, ctx: &mut FrameContext, sink: &mut dyn CommandSink) {
        if !self.requested {
            trace!("{}: nothing to write", self.name);
            return;
        }

        let mut accessor = OitBufferAccessor::new(ctx);
        let Some(bindings) = accessor.buffer_bindings() else {
            error!("{}: {}", self.name, OitError::MissingBuffers(self.name.clone()));
            return;
        };
        if let Err(err) = accessor.initialize_oit_buffers_if_necessary(sink) {
            error!("{}: {err}", self.name);
            return;
        }
        if let Err(err) = self.writer.write_fragments(&bindings, sink) {
            error!("{}: {err}", self.name);
        }
    }
}

impl std::fmt::Debug for OitRenderTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OitRenderTask")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}
