//! Minimal SVG document builder.
//!
//! Elements are formatted eagerly into strings and nested with explicit
//! `open_group` / `close_group` calls.

use std::fmt::Write;

/// Escape text for use inside an attribute value.
pub fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Format a coordinate with at most three decimals and no trailing zeros.
pub fn fmt_num(value: f32) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        _ => trimmed.to_string(),
    }
}

pub struct SvgBuilder {
    elements: Vec<String>,
    attrs: Vec<(String, String)>,
    depth: usize,
}

impl SvgBuilder {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            attrs: Vec::new(),
            depth: 1,
        }
    }

    /// Add an attribute to the root `<svg>` element.
    pub fn root_attr(&mut self, name: &str, value: impl ToString) -> &mut Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    fn push(&mut self, element: String) {
        let mut line = "  ".repeat(self.depth);
        line.push_str(&element);
        self.elements.push(line);
    }

    fn tag(name: &str, attrs: &[(&str, String)], self_closing: bool) -> String {
        let mut tag = format!("<{}", name);
        for (key, value) in attrs {
            // Writing into a String cannot fail
            let _ = write!(tag, r#" {}="{}""#, key, escape(value));
        }
        tag.push_str(if self_closing { "/>" } else { ">" });
        tag
    }

    pub fn open_group(&mut self, attrs: &[(&str, String)]) {
        self.push(Self::tag("g", attrs, false));
        self.depth += 1;
    }

    pub fn close_group(&mut self) {
        self.depth = self.depth.saturating_sub(1).max(1);
        self.push("</g>".to_string());
    }

    pub fn rect(&mut self, attrs: &[(&str, String)]) {
        self.push(Self::tag("rect", attrs, true));
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32, fill: &str) {
        self.push(Self::tag(
            "circle",
            &[
                ("r", fmt_num(r)),
                ("cx", fmt_num(cx)),
                ("cy", fmt_num(cy)),
                ("fill", fill.to_string()),
            ],
            true,
        ));
    }

    pub fn path(&mut self, d: &str, attrs: &[(&str, String)]) {
        let mut all = vec![("d", d.to_string())];
        all.extend(attrs.iter().cloned());
        self.push(Self::tag("path", &all, true));
    }

    pub fn style(&mut self, css: &str) {
        self.push(format!("<style>{}</style>", css.replace('<', "&lt;")));
    }

    pub fn build(self) -> String {
        let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
        for (key, value) in &self.attrs {
            let _ = write!(svg, r#" {}="{}""#, key, escape(value));
        }
        svg.push_str(">\n");
        for el in &self.elements {
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }
}

impl Default for SvgBuilder {
    fn default() -> Self {
        Self::new()
    }
}
