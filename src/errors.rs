//! Error Types
//!
//! This module defines the error types used throughout the OIT subsystem.
//!
//! # Overview
//!
//! The main error type [`OitError`] covers all failure modes including:
//! - Invalid sizing input (negative or overflowing screen dimensions)
//! - Protocol violations between producer and resolve tasks
//! - Backend capability mismatches
//! - Shader template rendering failures
//!
//! # Propagation
//!
//! Internal operations return [`Result<T>`]. The task lifecycle entry points
//! (`prepare` / `execute`) never propagate these: they log the error and skip
//! the remainder of the task for the current frame.
//!
//! ```rust,ignore
//! use myth_oit::errors::{OitError, Result};
//!
//! fn check(width: i32, height: i32) -> Result<()> {
//!     if width < 0 || height < 0 {
//!         return Err(OitError::InvalidScreenSize { width, height });
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::renderer::core::BufferRole;

/// The main error type for the OIT subsystem.
#[derive(Error, Debug)]
pub enum OitError {
    // ========================================================================
    // Sizing Errors
    // ========================================================================
    /// A negative screen dimension was supplied to the sizing policy.
    #[error("Invalid screen size for OIT buffers: {width}x{height}")]
    InvalidScreenSize {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// The buffer capacities implied by the screen size do not fit in `usize`.
    #[error("OIT buffer capacity overflows for screen size {width}x{height}")]
    CapacityOverflow {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// OIT buffers were needed but never allocated / published.
    #[error("No OIT buffers allocated but needed by {0}")]
    MissingBuffers(String),

    /// The resolve pass state was never constructed.
    #[error("OIT resolve pass state missing for {0}")]
    MissingRenderState(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The registry cannot run the OIT resolve mechanism.
    #[error("Unsupported backend for OIT: {0}")]
    UnsupportedBackend(String),

    /// A handle does not belong to the registry it was passed to.
    #[error("Unknown buffer: {0:?}")]
    UnknownBuffer(BufferRole),

    /// An AOV references a render target the backend does not know.
    #[error("Unknown render target: {0}")]
    UnknownRenderTarget(u64),

    /// The backend refused to allocate a buffer.
    #[error("Buffer allocation failed: {0:?}")]
    AllocationFailed(BufferRole),

    /// A buffer would exceed the device's size or binding limits.
    #[error("Buffer {role:?} needs {size} bytes, device limit is {limit}")]
    BufferTooLarge {
        role: BufferRole,
        size: u64,
        limit: u64,
    },

    // ========================================================================
    // Shader Errors
    // ========================================================================
    /// Template lookup or rendering error.
    #[error("Shader template error: {0}")]
    ShaderTemplate(#[from] minijinja::Error),
}

/// Alias for `Result<T, OitError>`.
pub type Result<T> = std::result::Result<T, OitError>;
