//! Task Graph Executor
//!
//! `TaskGraph` owns the frame's render tasks and drives them through the
//! sync → prepare → execute lifecycle. The execution model is linear: tasks are
//! kept sorted by [`RenderStage`], insertion order breaks ties.

use log::trace;

use super::context::FrameContext;
use super::node::{DirtyBits, RenderTask};
use crate::renderer::core::{CommandSink, ResourceRegistry};

struct TaskSlot {
    task: Box<dyn RenderTask>,
    dirty: DirtyBits,
}

/// Ordered collection of render tasks.
pub struct TaskGraph {
    tasks: Vec<TaskSlot>,
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGraph {
    #[must_use]
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Adds a task. Newly added tasks start fully dirty.
    pub fn add_task(&mut self, task: Box<dyn RenderTask>) {
        self.tasks.push(TaskSlot {
            task,
            dirty: DirtyBits::all(),
        });
        // Stable: same-stage tasks keep insertion order.
        self.tasks.sort_by_key(|slot| slot.task.stage());
    }

    /// Adds a task (builder style).
    #[must_use]
    pub fn with_task(mut self, task: Box<dyn RenderTask>) -> Self {
        self.add_task(task);
        self
    }

    /// Flags scene-side changes for every task.
    pub fn mark_dirty(&mut self, bits: DirtyBits) {
        for slot in &mut self.tasks {
            slot.dirty |= bits;
        }
    }

    /// Pending dirty bits of the task at `index` (in execution order).
    #[must_use]
    pub fn dirty_bits(&self, index: usize) -> Option<DirtyBits> {
        self.tasks.get(index).map(|slot| slot.dirty)
    }

    pub fn sync(&mut self, ctx: &mut FrameContext) {
        for slot in &mut self.tasks {
            if !slot.dirty.is_empty() {
                slot.task.sync(ctx, &mut slot.dirty);
            }
        }
    }

    pub fn prepare(&mut self, ctx: &mut FrameContext, registry: &mut dyn ResourceRegistry) {
        for slot in &mut self.tasks {
            trace!("prepare {} ({})", slot.task.name(), slot.task.stage().name());
            slot.task.prepare(ctx, registry);
        }
    }

    pub fn execute(&mut self, ctx: &mut FrameContext, sink: &mut dyn CommandSink) {
        for slot in &mut self.tasks {
            trace!("execute {} ({})", slot.task.name(), slot.task.stage().name());
            slot.task.execute(ctx, sink);
        }
    }

    /// Runs one full frame against a backend providing both capabilities.
    pub fn run_frame<B: ResourceRegistry + CommandSink>(
        &mut self,
        ctx: &mut FrameContext,
        backend: &mut B,
    ) {
        self.sync(ctx);
        self.prepare(ctx, backend);
        self.execute(ctx, backend);
    }

    /// Task names in execution order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|slot| slot.task.name())
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::graph::RenderStage;

    struct Named(&'static str, RenderStage);

    impl RenderTask for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn stage(&self) -> RenderStage {
            self.1
        }
        fn prepare(&mut self, _ctx: &mut FrameContext, _registry: &mut dyn ResourceRegistry) {}
        fn execute(&mut self, _ctx: &mut FrameContext, _sink: &mut dyn CommandSink) {}
    }

    #[test]
    fn tasks_are_stable_sorted_by_stage() {
        let graph = TaskGraph::new()
            .with_task(Box::new(Named("resolve", RenderStage::Resolve)))
            .with_task(Box::new(Named("glass", RenderStage::Transparent)))
            .with_task(Box::new(Named("setup", RenderStage::Setup)))
            .with_task(Box::new(Named("smoke", RenderStage::Transparent)));

        let names: Vec<_> = graph.task_names().collect();
        assert_eq!(names, ["setup", "glass", "smoke", "resolve"]);
    }

    #[test]
    fn sync_cleans_dirty_bits() {
        let mut graph = TaskGraph::new().with_task(Box::new(Named("a", RenderStage::Opaque)));
        let mut ctx = FrameContext::new();

        assert_eq!(graph.dirty_bits(0), Some(DirtyBits::all()));
        graph.sync(&mut ctx);
        assert_eq!(graph.dirty_bits(0), Some(DirtyBits::empty()));

        graph.mark_dirty(DirtyBits::PARAMS);
        assert_eq!(graph.dirty_bits(0), Some(DirtyBits::PARAMS));
    }
}
