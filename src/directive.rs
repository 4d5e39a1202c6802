//! Template-facing output kinds
//!
//! A host template engine maps its own directive names onto [`Directive`]
//! and calls [`KatexRenderer::render_directive`]. Unlike the raw
//! `wrap_inline`/`wrap_display` calls, the math directives escape the
//! expression, since their output lands directly in page markup.

use serde_json::{Map, Value};

use crate::markup::escape_html;
use crate::{KatexRenderer, MathMode, Result};

/// A `<span>` holding one delimited expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathComponent {
    pub expression: String,
    pub display: bool,
    pub class: String,
    pub id: String,
}

impl MathComponent {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Default::default()
        }
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn mode(&self) -> MathMode {
        MathMode::from_display(self.display)
    }
}

/// One template insertion point
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Stylesheet `<link>`
    Styles,
    /// Script tags, with per-call auto-render options
    Scripts(Map<String, Value>),
    /// Inline math
    Inline(String),
    /// Display math
    Block(String),
    Component(MathComponent),
}

impl KatexRenderer {
    /// Render a directive into markup
    pub fn render_directive(&self, directive: &Directive) -> Result<String> {
        match directive {
            Directive::Styles => Ok(self.generate_stylesheet()),
            Directive::Scripts(options) => self.generate_scripts(options),
            Directive::Inline(expression) => Ok(self.wrap_inline(&escape_html(expression))),
            Directive::Block(expression) => Ok(self.wrap_display(&escape_html(expression))),
            Directive::Component(component) => Ok(self.render_component(component)),
        }
    }

    /// `<span class="katex-expression ...">` around an escaped expression
    pub fn render_component(&self, component: &MathComponent) -> String {
        let wrapped = self.wrap(&escape_html(&component.expression), component.mode());
        let id = if component.id.is_empty() {
            String::new()
        } else {
            format!(" id=\"{}\"", escape_html(&component.id))
        };
        let class = format!("katex-expression {}", component.class);
        format!(
            "<span{} class=\"{}\" data-display=\"{}\">{}</span>",
            id,
            escape_html(class.trim_end()),
            component.display,
            wrapped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use serde_json::json;

    fn renderer() -> KatexRenderer {
        KatexRenderer::new(default_config()).unwrap()
    }

    #[test]
    fn math_directives_escape_expressions() {
        let r = renderer();
        let out = r
            .render_directive(&Directive::Inline("<script>alert(1)</script>".into()))
            .unwrap();
        assert_eq!(out, "\\(&lt;script&gt;alert(1)&lt;/script&gt;\\)");

        let out = r
            .render_directive(&Directive::Block("\\sum_{i=1}^{n}".into()))
            .unwrap();
        assert_eq!(out, "$$\\sum_{i=1}^{n}$$");
    }

    #[test]
    fn styles_and_scripts_directives_delegate() {
        let r = renderer();
        assert_eq!(
            r.render_directive(&Directive::Styles).unwrap(),
            r.generate_stylesheet()
        );

        let mut options = Map::new();
        options.insert("throwOnError".into(), json!(true));
        let out = r.render_directive(&Directive::Scripts(options)).unwrap();
        assert!(out.contains("&quot;throwOnError&quot;:true"));
    }

    #[test]
    fn component_renders_span() {
        let r = renderer();
        let out = r.render_component(&MathComponent::new("E=mc^2"));
        assert_eq!(
            out,
            r#"<span class="katex-expression" data-display="false">\(E=mc^2\)</span>"#
        );

        let out = r.render_component(
            &MathComponent::new("a<b")
                .display(true)
                .class("big \"x\"")
                .id("eq-1"),
        );
        assert_eq!(
            out,
            r#"<span id="eq-1" class="katex-expression big &quot;x&quot;" data-display="true">$$a&lt;b$$</span>"#
        );
    }
}
