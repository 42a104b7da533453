//! # Markup renderer
//!
//! A tiny node tree serialized to HTML. Every text node and every
//! attribute value goes through `escape` on the way out, and there is no
//! node type that carries pre-rendered markup, so view code cannot emit
//! unescaped user text.

use std::borrow::Cow;

/// Elements that never get a closing tag.
const VOID_ELEMENTS: [&str; 4] = ["br", "hr", "img", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag)
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    #[cfg(test)]
    fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    #[cfg(test)]
    fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_html(out),
            Node::Text(text) => out.push_str(&escape(text)),
        }
    }
}

/// Serializes sibling nodes back to back.
pub fn to_html<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}

/// Replaces `& < > " ' /` with entities.
pub fn escape(raw: &str) -> Cow<'_, str> {
    html_escape::encode_safe(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_elements() {
        let node: Node = Element::new("div")
            .class("post")
            .child(Element::new("h3").text("alice"))
            .child(Element::new("input").attr("type", "text"))
            .into();
        assert_eq!(
            node.to_html(),
            r#"<div class="post"><h3>alice</h3><input type="text"></div>"#
        );
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let node: Node = Element::new("p")
            .attr("title", r#"" onmouseover="x"#)
            .text("<script>alert('x') & more</script>")
            .into();
        let html = node.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; more"));
        assert!(html.starts_with(r#"<p title="&quot; onmouseover=&quot;x">"#));
    }

    #[test]
    fn siblings_concatenate() {
        let nodes = vec![Node::text("a"), Node::text("b")];
        assert_eq!(to_html(&nodes), "ab");
    }
}
