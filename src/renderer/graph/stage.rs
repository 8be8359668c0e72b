//! Render Stage Definitions
//!
//! `RenderStage` defines the standard stage ordering of a task graph. Tasks are
//! sorted by stage; tasks within the same stage keep their insertion order.

/// Render stage enumeration.
///
/// # Stage Overview
///
/// | Stage | Purpose | Typical Content |
/// |-------|---------|------------------|
/// | `Setup` | Per-frame output resolution | AOV bindings, viewport |
/// | `Opaque` | Opaque object rendering | Forward rendering |
/// | `Skybox` | Skybox rendering | Environment maps |
/// | `Transparent` | Translucent producers | OIT fragment accumulation |
/// | `Resolve` | Fragment list resolution | OIT sort and composite |
/// | `PostProcess` | Post-processing effects | ToneMapping, FXAA |
/// | `UI` | User interface | Debug overlays |
///
/// OIT producers run in `Transparent` and the resolve task in `Resolve`, so the
/// resolve task's prepare and execute always follow every producer's.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum RenderStage {
    /// Publishes the frame's output bindings.
    Setup = 0,

    /// Opaque object rendering stage.
    Opaque = 1,

    /// Skybox rendering stage.
    Skybox = 2,

    /// Translucent object rendering stage.
    ///
    /// Suitable for: OIT producers writing into the shared fragment buffers.
    Transparent = 3,

    /// Resolution of accumulated translucent fragments into the color target.
    Resolve = 4,

    /// Post-processing stage.
    PostProcess = 5,

    /// User interface stage (executed last).
    UI = 6,
}

impl RenderStage {
    /// Returns the numeric index of the stage (used for sorting).
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Stage name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::Opaque => "Opaque",
            Self::Skybox => "Skybox",
            Self::Transparent => "Transparent",
            Self::Resolve => "Resolve",
            Self::PostProcess => "PostProcess",
            Self::UI => "UI",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(RenderStage::Setup < RenderStage::Opaque);
        assert!(RenderStage::Opaque < RenderStage::Skybox);
        assert!(RenderStage::Skybox < RenderStage::Transparent);
        assert!(RenderStage::Transparent < RenderStage::Resolve);
        assert!(RenderStage::Resolve < RenderStage::PostProcess);
        assert!(RenderStage::PostProcess < RenderStage::UI);
    }
}
