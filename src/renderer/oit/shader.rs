//! OIT shader generation.
//!
//! Both sides of the OIT buffers render their declarations from
//! `chunks/oit_buffers.wgsl` with the same [`OitShaderContext`], so the sample
//! budget and binding slots in WGSL always match the Rust constants.

use serde::Serialize;

use super::{
    COUNTER_BINDING, DATA_BINDING, DEPTH_BINDING, INDEX_BINDING, OIT_BIND_GROUP,
    SAMPLES_PER_PIXEL, UNIFORM_BINDING,
};
use crate::errors::Result;
use crate::renderer::pipeline::{ShaderProgram, compile_template, render_template};

const RESOLVE_TEMPLATE: &str = "oit_resolve";
const BUFFERS_TEMPLATE: &str = "chunks/oit_buffers";

/// Template variables consumed by `chunks/oit_buffers.wgsl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OitShaderContext {
    pub samples_per_pixel: usize,
    /// Declares read-write (atomic) buffers and `oit_write_fragment`.
    pub oit_write: bool,
    pub oit_group: u32,
    pub counter_binding: u32,
    pub index_binding: u32,
    pub data_binding: u32,
    pub depth_binding: u32,
    pub uniform_binding: u32,
}

impl OitShaderContext {
    #[must_use]
    pub fn new(oit_write: bool) -> Self {
        Self {
            samples_per_pixel: SAMPLES_PER_PIXEL,
            oit_write,
            oit_group: OIT_BIND_GROUP,
            counter_binding: COUNTER_BINDING,
            index_binding: INDEX_BINDING,
            data_binding: DATA_BINDING,
            depth_binding: DEPTH_BINDING,
            uniform_binding: UNIFORM_BINDING,
        }
    }
}

/// The full-screen resolve program.
pub fn resolve_program() -> Result<ShaderProgram> {
    compile_template(RESOLVE_TEMPLATE, &OitShaderContext::new(false))
}

/// WGSL declarations a producer prepends to its fragment shader.
pub fn producer_declarations() -> Result<String> {
    render_template(BUFFERS_TEMPLATE, &OitShaderContext::new(true))
}
