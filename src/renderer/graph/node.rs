//! Render Task Trait
//!
//! Every task of a [`TaskGraph`](super::TaskGraph) goes through three phases
//! per frame:
//!
//! 1. `sync`: consume scene-side changes signalled by [`DirtyBits`].
//! 2. `prepare`: read and write the [`FrameContext`], allocate and grow
//!    resources through the [`ResourceRegistry`].
//! 3. `execute`: record GPU work through the [`CommandSink`].
//!
//! All tasks are prepared before any task executes.

use bitflags::bitflags;

use super::context::FrameContext;
use super::stage::RenderStage;
use crate::renderer::core::{CommandSink, ResourceRegistry};

bitflags! {
    /// Scene-side state a task may need to re-read during `sync`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyBits: u32 {
        /// Task parameters changed.
        const PARAMS = 1 << 0;
        /// The set of render tags changed.
        const RENDER_TAGS = 1 << 1;
        /// The collection of drawn items changed.
        const COLLECTION = 1 << 2;
    }
}

/// A unit of per-frame rendering work.
pub trait RenderTask {
    /// Task name, used for logging and debug labels.
    fn name(&self) -> &str;

    /// Stage in which the task runs.
    fn stage(&self) -> RenderStage;

    /// Consumes pending scene changes. Tasks with no scene-side state just
    /// mark everything clean.
    fn sync(&mut self, _ctx: &mut FrameContext, dirty: &mut DirtyBits) {
        *dirty = DirtyBits::empty();
    }

    /// Prepare phase: context exchange and resource management.
    fn prepare(&mut self, ctx: &mut FrameContext, registry: &mut dyn ResourceRegistry);

    /// Execute phase: GPU work recording.
    fn execute(&mut self, ctx: &mut FrameContext, sink: &mut dyn CommandSink);
}
