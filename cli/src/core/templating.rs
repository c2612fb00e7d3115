//! # gitabot Templating Engine
//!
//! File: cli/src/core/templating.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module wraps the Tera templating engine for rendering chat messages.
//! Templates are registered once at startup from raw strings and rendered many
//! times with a serializable context, so a malformed template is reported when
//! the service starts rather than on the first request.
//!
//! ## Examples
//!
//! ```rust
//! # use gitabot::core::templating::TemplateRenderer;
//! # fn main() -> anyhow::Result<()> {
//! let renderer = TemplateRenderer::from_raw(&[("greeting.txt", "Hello {{ name }}")])?;
//! let text = renderer.render("greeting.txt", &serde_json::json!({ "name": "Arjuna" }))?;
//! assert_eq!(text, "Hello Arjuna");
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{GitabotError, Result};
use anyhow::{anyhow, Context};
use serde::Serialize;
use tera::Tera;
use tracing::debug;

/// A set of compiled templates.
///
/// Template names should not end in `.html`/`.xml`, otherwise Tera enables
/// HTML autoescaping for them.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Compiles the `(name, source)` pairs into a renderer.
    pub fn from_raw(templates: &[(&str, &str)]) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.iter().copied())
            .map_err(|e| anyhow!(GitabotError::Template { source: e }))
            .context("Failed to compile message templates")?;
        debug!("Compiled {} message template(s)", templates.len());
        Ok(Self { tera })
    }

    /// Renders the named template with `context`.
    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String> {
        let tera_context = tera::Context::from_serialize(context).map_err(|e| {
            anyhow!(GitabotError::Template { source: e })
                .context("Failed to create Tera context from value")
        })?;
        self.tera.render(name, &tera_context).map_err(|e| {
            anyhow!(GitabotError::Template { source: e })
                .context(format!("Tera rendering failed for template '{}'", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_simple_template() -> Result<()> {
        let renderer = TemplateRenderer::from_raw(&[("hello.txt", "Hello {{ name }}!")])?;
        let out = renderer.render("hello.txt", &json!({ "name": "Arjuna" }))?;
        assert_eq!(out, "Hello Arjuna!");
        Ok(())
    }

    #[test]
    fn test_no_html_escaping_for_text_templates() -> Result<()> {
        let renderer = TemplateRenderer::from_raw(&[("raw.txt", "{{ value }}")])?;
        let out = renderer.render("raw.txt", &json!({ "value": "<b>&</b>" }))?;
        assert_eq!(out, "<b>&</b>");
        Ok(())
    }

    #[test]
    fn test_invalid_template_syntax_fails_at_compile() {
        let result = TemplateRenderer::from_raw(&[("bad.txt", "Hello {{ name")]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to compile message templates"));
    }

    #[test]
    fn test_unknown_template_name_errors() -> Result<()> {
        let renderer = TemplateRenderer::from_raw(&[("a.txt", "a")])?;
        let err = renderer.render("missing.txt", &json!({})).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
        Ok(())
    }
}
