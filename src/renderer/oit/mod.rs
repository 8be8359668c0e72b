//! Order-Independent Transparency
//!
//! Per-frame coordination of the buffers shared by OIT producers and the
//! single resolve task of a frame.
//!
//! # Buffers
//!
//! | Buffer | Element | Capacity |
//! |--------|---------|----------|
//! | counter | `i32` | `w * h + 1` |
//! | indices | `i32` | `w * h * SAMPLES_PER_PIXEL` |
//! | data | `vec4<f32>` | `w * h * SAMPLES_PER_PIXEL` |
//! | depth | `f32` | `w * h * SAMPLES_PER_PIXEL` |
//! | uniforms | `vec2<i32>` screen size | 1 |
//!
//! # Frame protocol
//!
//! ```text
//!   Idle ──producer prepare──▶ Requested ──first OIT execute──▶ Accumulating
//!    ▲                                                               │
//!    └──────────────────────── resolve execute ◀─────────────────────┘
//! ```
//!
//! Producers set `OitRequestFlag` during prepare. Whichever OIT task executes
//! first clears the counter buffer and sets `OitClearedFlag`; the resolve task
//! removes both flags.
//!
//! # Shader coupling
//!
//! [`SAMPLES_PER_PIXEL`] and the binding slots below are injected into
//! `chunks/oit_buffers.wgsl` when a shader is rendered, see [`shader`]. No
//! other definition exists on the shader side.

pub mod accessor;
pub mod bundle;
pub mod render_task;
pub mod resolve;
pub mod shader;
pub mod sizing;

pub use accessor::{OitBufferAccessor, OitBufferBindings, OitFrameState};
pub use bundle::OitBufferBundle;
pub use render_task::{FragmentWriter, OitRenderTask};
pub use resolve::{OitResolveTask, resolve_render_state};
pub use sizing::{FALLBACK_SCREEN_SIZE, OitCapacities, SizingDecision};

/// Maximum number of fragments stored per pixel.
pub const SAMPLES_PER_PIXEL: usize = 8;

/// Bind group holding the OIT buffers.
pub const OIT_BIND_GROUP: u32 = 0;
pub const COUNTER_BINDING: u32 = 0;
pub const INDEX_BINDING: u32 = 1;
pub const DATA_BINDING: u32 = 2;
pub const DEPTH_BINDING: u32 = 3;
pub const UNIFORM_BINDING: u32 = 4;
