//! Renderer Module
//!
//! - [`core`]: buffer vocabulary, backend capabilities, headless and `wgpu` backends
//! - [`graph`]: frame context, render tasks and the task graph
//! - [`oit`]: order-independent transparency buffers, producer and resolve tasks
//! - [`pipeline`]: shader templates
//! - [`settings`]: runtime configuration

pub mod core;
pub mod graph;
pub mod oit;
pub mod pipeline;
pub mod settings;

pub use settings::OitSettings;
