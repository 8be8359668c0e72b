//! Screen-resolution sizing policy.
//!
//! Pure functions deciding buffer capacities from the requested screen size and
//! the size the buffers were last grown for. Buffers only ever grow: the
//! recorded size is the per-axis maximum of every size seen so far.

use glam::IVec2;

use super::SAMPLES_PER_PIXEL;
use crate::errors::{OitError, Result};

/// Resolution used when no output target is bound.
pub const FALLBACK_SCREEN_SIZE: i32 = 2048;

/// Element capacities of the OIT buffers for one screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OitCapacities {
    /// One list head per pixel plus the allocation counter in slot 0.
    pub counter: usize,
    /// Shared by the index, data and depth buffers.
    pub fragments: usize,
}

impl OitCapacities {
    /// Capacities for a screen of `size` pixels.
    pub fn for_screen(size: IVec2) -> Result<Self> {
        let (width, height) = (size.x, size.y);
        if width < 0 || height < 0 {
            return Err(OitError::InvalidScreenSize { width, height });
        }
        let overflow = || OitError::CapacityOverflow { width, height };

        let pixels = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or_else(overflow)?;

        Ok(Self {
            counter: pixels.checked_add(1).ok_or_else(overflow)?,
            fragments: pixels.checked_mul(SAMPLES_PER_PIXEL).ok_or_else(overflow)?,
        })
    }
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingDecision {
    /// The recorded size already covers the request.
    Unchanged,
    /// Buffers must grow to `capacities`; `screen_size` becomes the recorded size.
    Grow {
        screen_size: IVec2,
        capacities: OitCapacities,
    },
}

/// Decides whether a request for `requested` pixels needs the buffers sized
/// for `recorded` to grow.
///
/// Growth triggers when either axis exceeds the recorded one; the new recorded
/// size is the per-axis maximum of both. Negative requests are rejected.
pub fn evaluate(requested: IVec2, recorded: IVec2) -> Result<SizingDecision> {
    if requested.x < 0 || requested.y < 0 {
        return Err(OitError::InvalidScreenSize {
            width: requested.x,
            height: requested.y,
        });
    }
    if requested.x <= recorded.x && requested.y <= recorded.y {
        return Ok(SizingDecision::Unchanged);
    }

    let screen_size = requested.max(recorded);
    let capacities = OitCapacities::for_screen(screen_size)?;
    Ok(SizingDecision::Grow {
        screen_size,
        capacities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacities_follow_formula() {
        let caps = OitCapacities::for_screen(IVec2::new(100, 50)).unwrap();
        assert_eq!(caps.counter, 5001);
        assert_eq!(caps.fragments, 40_000);
    }

    #[test]
    fn empty_screen_keeps_the_allocator_slot() {
        let caps = OitCapacities::for_screen(IVec2::ZERO).unwrap();
        assert_eq!(caps, OitCapacities { counter: 1, fragments: 0 });
    }

    #[test]
    fn growth_on_either_axis_uses_per_axis_max() {
        let recorded = IVec2::new(800, 600);

        let decision = evaluate(IVec2::new(1024, 400), recorded).unwrap();
        let SizingDecision::Grow { screen_size, capacities } = decision else {
            panic!("expected growth, got {decision:?}");
        };
        assert_eq!(screen_size, IVec2::new(1024, 600));
        assert_eq!(capacities.counter, 1024 * 600 + 1);
    }

    #[test]
    fn same_or_smaller_is_unchanged() {
        let recorded = IVec2::new(800, 600);
        assert_eq!(evaluate(recorded, recorded).unwrap(), SizingDecision::Unchanged);
        assert_eq!(
            evaluate(IVec2::new(10, 600), recorded).unwrap(),
            SizingDecision::Unchanged
        );
    }

    #[test]
    fn negative_sizes_are_rejected() {
        assert!(matches!(
            evaluate(IVec2::new(-1, 10), IVec2::ZERO),
            Err(OitError::InvalidScreenSize { width: -1, height: 10 })
        ));
        assert!(OitCapacities::for_screen(IVec2::new(4, -4)).is_err());
    }

    #[test]
    fn overflow_is_reported() {
        assert!(matches!(
            OitCapacities::for_screen(IVec2::new(i32::MAX, i32::MAX)),
            Err(OitError::CapacityOverflow { .. })
        ));
    }
}
