//! Shader Template Manager
//!
//! Renders WGSL shaders from minijinja templates embedded with `rust-embed`.
//! Templates use a custom syntax so they stay readable next to WGSL braces:
//!
//! | Construct       | Syntax                 |
//! |-----------------|------------------------|
//! | Block statement | `{$ if x $} ... {$ endif $}` |
//! | Line statement  | `$$ if x` ... `$$ endif` |
//! | Variable        | `{{ name }}`           |
//!
//! `{$ include "name" $}` resolves to `chunks/name.wgsl`.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error, ErrorKind, syntax::SyntaxConfig};
use rust_embed::RustEmbed;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::Result;

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/renderer/pipeline/shaders"]
struct ShaderAssets;

fn get_env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

        env.set_loader(shader_loader);

        env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());

        env
    })
}

fn shader_loader(name: &str) -> std::result::Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    #[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
    {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("src/renderer/pipeline/shaders")
            .join(filename.as_ref());
        if path.exists() {
            return match std::fs::read_to_string(&path) {
                Ok(source) => Ok(Some(source)),
                Err(e) => Err(Error::new(
                    ErrorKind::TemplateNotFound,
                    format!("Failed to read file: {e}"),
                )),
            };
        }
    }

    if let Some(file) = ShaderAssets::get(&filename)
        && let Ok(source) = std::str::from_utf8(file.data.as_ref())
    {
        return Ok(Some(source.to_string()));
    }

    Ok(None)
}

/// Final WGSL source of a shader together with its content hash.
///
/// The hash (xxh3-128 of the source) is what backends key compiled modules
/// and pipelines on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub name: String,
    pub code: String,
    pub hash: u128,
}

impl ShaderProgram {
    #[must_use]
    pub fn new(name: impl Into<String>, code: String) -> Self {
        let hash = xxh3_128(code.as_bytes());
        Self {
            name: name.into(),
            code,
            hash,
        }
    }
}

/// Renders a template to a WGSL string.
pub fn render_template<C: Serialize>(template_name: &str, ctx: &C) -> Result<String> {
    let template = get_env().get_template(template_name)?;
    let source = template.render(ctx)?;
    log::debug!("Rendered shader template {template_name} ({} bytes)", source.len());
    Ok(source)
}

/// Renders a template into a hashed [`ShaderProgram`].
pub fn compile_template<C: Serialize>(template_name: &str, ctx: &C) -> Result<ShaderProgram> {
    let source = render_template(template_name, ctx)?;
    Ok(ShaderProgram::new(template_name, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_template_is_an_error() {
        #[derive(Serialize)]
        struct Empty {}

        assert!(render_template("does_not_exist", &Empty {}).is_err());
    }

    #[test]
    fn identical_sources_hash_identically() {
        let a = ShaderProgram::new("a", "fn main() {}".to_string());
        let b = ShaderProgram::new("b", "fn main() {}".to_string());
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.name, b.name);
    }
}
