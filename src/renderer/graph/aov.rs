//! AOV (Arbitrary Output Variable) Bindings
//!
//! An [`AovBinding`] names an output channel (color, depth, ...) of a render
//! pass and the render target it is written to. Bindings are resolved by the
//! render setup step and published into the frame context; downstream passes
//! copy them from there.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RENDER_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a render target known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderBufferId(u64);

impl RenderBufferId {
    /// Allocates a fresh, process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_RENDER_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Binds one output channel of a pass to a render target.
#[derive(Debug, Clone, PartialEq)]
pub struct AovBinding {
    /// Channel name, e.g. `"color"` or `"depth"`.
    pub aov_name: String,
    /// Render target written by the channel.
    pub render_buffer: RenderBufferId,
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Target texture format.
    pub format: wgpu::TextureFormat,
    /// Value the target is cleared to when the pass begins.
    /// `None` loads the existing content.
    pub clear_value: Option<wgpu::Color>,
}

impl AovBinding {
    #[must_use]
    pub fn new(
        aov_name: impl Into<String>,
        render_buffer: RenderBufferId,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            aov_name: aov_name.into(),
            render_buffer,
            width,
            height,
            format,
            clear_value: None,
        }
    }

    #[must_use]
    pub fn with_clear_value(mut self, clear_value: wgpu::Color) -> Self {
        self.clear_value = Some(clear_value);
        self
    }

    /// Whether this channel targets a depth (or depth-stencil) buffer.
    #[inline]
    #[must_use]
    pub fn is_depth(&self) -> bool {
        self.format.is_depth_stencil_format()
    }
}
