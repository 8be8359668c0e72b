//! Shader Pipeline Module
//!
//! Shader template rendering:
//! - shader_manager: minijinja environment over the embedded WGSL templates
//! - ShaderProgram: rendered source plus content hash

pub mod shader_manager;

pub use shader_manager::{ShaderProgram, compile_template, render_template};
