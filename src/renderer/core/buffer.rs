//! Buffer Descriptions and Handles
//!
//! Backend-neutral vocabulary for structured GPU buffers:
//!
//! - [`BufferSpec`]: one named field of a buffer (element type per slot)
//! - [`BufferRole`]: debug tag identifying what a buffer is used for
//! - [`BufferHandle`]: cheaply clonable reference handed out by a registry
//! - [`BufferSource`]: a named byte payload uploaded into a buffer

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::utils::interner::{self, Symbol};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Element type stored in one slot of a structured buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int32,
    Int32x2,
    Float32,
    Float32x4,
}

impl ElementType {
    /// Size in bytes of a single element.
    #[inline]
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Int32 | Self::Float32 => 4,
            Self::Int32x2 => 8,
            Self::Float32x4 => 16,
        }
    }
}

/// Describes one named field of a structured buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferSpec {
    pub name: Symbol,
    pub element: ElementType,
}

impl BufferSpec {
    #[must_use]
    pub fn new(name: &str, element: ElementType) -> Self {
        Self {
            name: interner::intern(name),
            element,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        interner::resolve(self.name)
    }
}

/// Debug tag describing what a buffer is used for.
///
/// Has no behavioral effect; registries use it for labels and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    OitCounter,
    OitIndices,
    OitData,
    OitDepth,
    OitUniforms,
    Named(Symbol),
}

impl BufferRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OitCounter => "oitCounter",
            Self::OitIndices => "oitIndices",
            Self::OitData => "oitData",
            Self::OitDepth => "oitDepth",
            Self::OitUniforms => "oitUniforms",
            Self::Named(sym) => interner::resolve(*sym),
        }
    }
}

impl fmt::Display for BufferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the buffer is bound to shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Structured storage buffer, sized in elements.
    Storage,
    /// Small uniform block.
    Uniform,
}

bitflags! {
    /// Allocation hints forwarded to the registry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UsageHint: u8 {
        /// The buffer is expected to be resized over its lifetime.
        const SIZE_VARYING = 1 << 0;
        /// The buffer is cleared or filled from the CPU every frame.
        const CPU_FILLED   = 1 << 1;
    }
}

#[derive(Debug)]
struct HandleInner {
    id: u64,
    role: BufferRole,
    kind: BufferKind,
    specs: SmallVec<[BufferSpec; 1]>,
}

/// Reference to a buffer owned by a [`ResourceRegistry`](super::ResourceRegistry).
///
/// Cloning is cheap; clones refer to the same buffer. Equality is identity.
#[derive(Debug, Clone)]
pub struct BufferHandle(Arc<HandleInner>);

impl BufferHandle {
    /// Creates a new handle with a fresh id. Called by registries only.
    #[must_use]
    pub fn new(role: BufferRole, kind: BufferKind, specs: &[BufferSpec]) -> Self {
        Self(Arc::new(HandleInner {
            id: next_id(),
            role,
            kind,
            specs: SmallVec::from_slice(specs),
        }))
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn role(&self) -> BufferRole {
        self.0.role
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> BufferKind {
        self.0.kind
    }

    #[inline]
    #[must_use]
    pub fn specs(&self) -> &[BufferSpec] {
        &self.0.specs
    }

    /// Bytes per element, summed over all fields.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.0.specs.iter().map(|s| s.element.size_bytes()).sum()
    }
}

impl PartialEq for BufferHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for BufferHandle {}

/// Named byte payload written into a buffer at offset zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSource {
    pub name: Symbol,
    pub bytes: Vec<u8>,
}

impl BufferSource {
    #[must_use]
    pub fn new<T: bytemuck::Pod>(name: &str, value: &T) -> Self {
        Self {
            name: interner::intern(name),
            bytes: bytemuck::bytes_of(value).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_identity_survives_clone() {
        let spec = BufferSpec::new("oitCounter", ElementType::Int32);
        let a = BufferHandle::new(BufferRole::OitCounter, BufferKind::Storage, &[spec]);
        let b = a.clone();
        let c = BufferHandle::new(BufferRole::OitCounter, BufferKind::Storage, &[spec]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.stride(), 4);
        assert_eq!(a.specs()[0].name(), "oitCounter");
    }

    #[test]
    fn element_sizes() {
        assert_eq!(ElementType::Int32x2.size_bytes(), 8);
        assert_eq!(ElementType::Float32x4.size_bytes(), 16);
    }
}
