//! Fixed-Function Pass State
//!
//! [`PassRenderState`] captures the fixed-function configuration of a pass:
//! depth test/write, color write mask and blending. It is backend-neutral in
//! the sense that it only holds plain `wgpu` value types, so it can be built,
//! compared and hashed without a device.

/// Fixed-function state of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassRenderState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub color_mask: wgpu::ColorWrites,
    /// `None` disables blending.
    pub blend: Option<wgpu::BlendState>,
}

impl Default for PassRenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            color_mask: wgpu::ColorWrites::ALL,
            blend: None,
        }
    }
}

impl PassRenderState {
    /// Premultiplied-alpha "over": `src * 1 + dst * (1 - src.a)`, applied
    /// identically to the color and alpha channels.
    pub const PREMULTIPLIED_OVER: wgpu::BlendState = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    };

    #[inline]
    #[must_use]
    pub fn blend_enabled(&self) -> bool {
        self.blend.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premultiplied_over_blends_both_channels_alike() {
        let blend = PassRenderState::PREMULTIPLIED_OVER;
        assert_eq!(blend.color, blend.alpha);
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn default_state_is_opaque_with_depth() {
        let state = PassRenderState::default();
        assert!(state.depth_test && state.depth_write);
        assert!(!state.blend_enabled());
    }
}
