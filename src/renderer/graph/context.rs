//! Frame Context
//!
//! [`FrameContext`] is the per-frame blackboard shared by every task of a
//! render graph. Tasks never call each other; they communicate by publishing
//! and consuming entries here:
//!
//! | Key | Value | Written by | Read by |
//! |-----|-------|------------|---------|
//! | `OitRequestFlag` | `Flag` | OIT render tasks (prepare) | OIT resolve task |
//! | `OitClearedFlag` | `Flag` | first OIT task to clear the buffers | OIT render tasks |
//! | `AovBindings` | `AovBindings` | render setup task | OIT resolve task |
//! | `Oit*Buffer` | `Buffer` | OIT resolve task (prepare) | OIT render tasks |
//!
//! The context is owned by the engine loop, which may clear it between frames.
//! Every accessor therefore treats an absent (or wrongly typed) entry as a
//! normal outcome and returns `None` / `false`.

use rustc_hash::FxHashMap;

use super::aov::AovBinding;
use crate::renderer::core::BufferHandle;
use crate::utils::interner::{self, Symbol};

/// Token identifying a context entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// Present when at least one producer wrote OIT fragments this frame.
    OitRequestFlag,
    /// Present once the OIT buffers have been cleared this frame.
    OitClearedFlag,
    /// Output bindings resolved by the render setup step.
    AovBindings,
    OitCounterBuffer,
    OitIndexBuffer,
    OitDataBuffer,
    OitDepthBuffer,
    OitUniformBuffer,
    /// Engine-defined token.
    Named(Symbol),
}

impl ContextKey {
    /// Key for an engine-defined token name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::Named(interner::intern(name))
    }

    /// The five buffer entries published by the OIT resolve task.
    pub const OIT_BUFFERS: [Self; 5] = [
        Self::OitCounterBuffer,
        Self::OitIndexBuffer,
        Self::OitDataBuffer,
        Self::OitDepthBuffer,
        Self::OitUniformBuffer,
    ];
}

/// Value stored under a [`ContextKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Flag(bool),
    Buffer(BufferHandle),
    AovBindings(Vec<AovBinding>),
}

/// Per-frame key/value store shared by all tasks of a graph.
#[derive(Debug, Default, Clone)]
pub struct FrameContext {
    entries: FxHashMap<ContextKey, ContextValue>,
}

impl FrameContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry, returning the previous value.
    pub fn insert(&mut self, key: ContextKey, value: ContextValue) -> Option<ContextValue> {
        self.entries.insert(key, value)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: ContextKey) -> Option<&ContextValue> {
        self.entries.get(&key)
    }

    /// Removes an entry, returning it if it was present.
    pub fn remove(&mut self, key: ContextKey) -> Option<ContextValue> {
        self.entries.remove(&key)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: ContextKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Flags ──────────────────────────────────────────────────────────────

    /// Marks a flag as present.
    pub fn set_flag(&mut self, key: ContextKey) {
        self.entries.insert(key, ContextValue::Flag(true));
    }

    /// Flags are signalled by presence; the stored bool is informational.
    #[inline]
    #[must_use]
    pub fn has_flag(&self, key: ContextKey) -> bool {
        matches!(self.entries.get(&key), Some(ContextValue::Flag(_)))
    }

    /// Removes a flag, returning whether it was present.
    pub fn take_flag(&mut self, key: ContextKey) -> bool {
        match self.entries.get(&key) {
            Some(ContextValue::Flag(_)) => {
                self.entries.remove(&key);
                true
            }
            _ => false,
        }
    }

    // ── Typed entries ──────────────────────────────────────────────────────

    #[must_use]
    pub fn buffer(&self, key: ContextKey) -> Option<&BufferHandle> {
        match self.entries.get(&key) {
            Some(ContextValue::Buffer(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn set_buffer(&mut self, key: ContextKey, handle: BufferHandle) {
        self.entries.insert(key, ContextValue::Buffer(handle));
    }

    #[must_use]
    pub fn aov_bindings(&self) -> Option<&[AovBinding]> {
        match self.entries.get(&ContextKey::AovBindings) {
            Some(ContextValue::AovBindings(bindings)) => Some(bindings),
            _ => None,
        }
    }

    pub fn set_aov_bindings(&mut self, bindings: Vec<AovBinding>) {
        self.entries
            .insert(ContextKey::AovBindings, ContextValue::AovBindings(bindings));
    }
}
