//! Minimal buffered XML writer.
//!
//! The read side of the crate is `roxmltree`; this is the write side.
//! It knows exactly as much XML as the encoder and the body writers
//! need: elements, attributes, escaped text, and raw splices.

/// Appends well-formed XML to an in-memory buffer.
///
/// Elements are closed by [`end_element`](XmlWriter::end_element) in
/// LIFO order; the writer tracks open tags so callers never repeat a
/// name.
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
    open: Vec<String>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<name>`
    pub fn start_element(&mut self, name: &str) {
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
        self.open.push(name.to_string());
    }

    /// `<name k="v" ...>` with attribute values escaped.
    pub fn start_element_with(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (key, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(key);
            self.buf.push_str("=\"");
            escape_into(&mut self.buf, value, true);
            self.buf.push('"');
        }
        self.buf.push('>');
        self.open.push(name.to_string());
    }

    /// Closes the most recently opened element.
    pub fn end_element(&mut self) {
        debug_assert!(!self.open.is_empty(), "end_element with no open element");
        if let Some(name) = self.open.pop() {
            self.buf.push_str("</");
            self.buf.push_str(&name);
            self.buf.push('>');
        }
    }

    /// `<name/>`
    pub fn empty_element(&mut self, name: &str) {
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push_str("/>");
    }

    /// Escaped character data.
    pub fn text(&mut self, text: &str) {
        escape_into(&mut self.buf, text, false);
    }

    /// Splices already-serialized XML into the stream unescaped.
    pub fn raw(&mut self, xml: &str) {
        self.buf.push_str(xml);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        debug_assert!(self.open.is_empty(), "finish with unclosed elements");
        self.buf
    }
}

fn escape_into(buf: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' if attribute => buf.push_str("&quot;"),
            '\'' if attribute => buf.push_str("&apos;"),
            other => buf.push(other),
        }
    }
}
