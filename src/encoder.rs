//! Message encoders translate between transport bytes and [`Message`]s.
//!
//! The stock [`TextMessageEncoder`] speaks the plain-text envelope
//! dialects; a [`Binding`] packages an encoder with the transport scheme
//! it expects, which is how an [`Endpoint`](crate::Endpoint) gets its
//! default wire format.

use std::str;
use std::sync::Arc;

use crate::error::EnvelopeError;
use crate::message::{HeaderBlock, Message, MessageBody, SoapVersion};
use crate::xml::XmlWriter;

/// Reads requests off the wire and writes replies back onto it.
pub trait MessageEncoder: Send + Sync {
    /// Envelope dialect this encoder produces and expects.
    fn message_version(&self) -> SoapVersion;

    /// Content type stamped on outbound responses when the request did
    /// not supply one to echo.
    fn content_type(&self) -> &str;

    /// Decodes a request body. `max_size` caps the accepted payload and
    /// `content_type` is the transport's claim about the body, verified
    /// before any parsing happens.
    fn read_message(
        &self,
        body: &[u8],
        max_size: usize,
        content_type: Option<&str>,
    ) -> Result<Message, EnvelopeError>;

    /// Encodes a complete message into response bytes.
    fn write_message(&self, message: &Message) -> Result<Vec<u8>, EnvelopeError>;
}

/// The UTF-8 text encoder.
///
/// Inbound envelopes are validated structurally (root element, version
/// namespace, presence of a `Body`) before the message is accepted, so
/// later pipeline stages can re-read the body without re-checking.
pub struct TextMessageEncoder {
    version: SoapVersion,
}

impl TextMessageEncoder {
    pub fn new(version: SoapVersion) -> Self {
        TextMessageEncoder { version }
    }
}

impl MessageEncoder for TextMessageEncoder {
    fn message_version(&self) -> SoapVersion {
        self.version
    }

    fn content_type(&self) -> &str {
        self.version.content_type()
    }

    fn read_message(
        &self,
        body: &[u8],
        max_size: usize,
        content_type: Option<&str>,
    ) -> Result<Message, EnvelopeError> {
        if body.len() > max_size {
            return Err(EnvelopeError::TooLarge {
                size: body.len(),
                max: max_size,
            });
        }
        if let Some(ct) = content_type {
            let media = ct.split(';').next().unwrap_or("").trim();
            if !media.eq_ignore_ascii_case(self.version.media_type()) {
                return Err(EnvelopeError::ContentType(ct.to_string()));
            }
        }

        let text = str::from_utf8(body)?;
        let text = text.trim_start_matches('\u{feff}').trim_start();

        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if root.tag_name().name() != "Envelope" {
            return Err(EnvelopeError::NotAnEnvelope(
                root.tag_name().name().to_string(),
            ));
        }
        let expected = self.version.envelope_namespace();
        let found = root.tag_name().namespace().unwrap_or("");
        if found != expected {
            return Err(EnvelopeError::EnvelopeNamespace {
                expected,
                found: found.to_string(),
            });
        }
        if !root
            .children()
            .any(|node| node.is_element() && node.tag_name().name() == "Body")
        {
            return Err(EnvelopeError::MissingBody);
        }

        let mut message = Message::from_envelope(self.version, text.to_string());
        let header = root
            .children()
            .find(|node| node.is_element() && node.tag_name().name() == "Header");
        if let Some(header) = header {
            for block in header.children().filter(roxmltree::Node::is_element) {
                let value = block.text().unwrap_or("");
                // An addressing Action block is the embedded action; the
                // transport header may still override it later.
                if block.tag_name().name() == "Action" {
                    message.headers_mut().set_action(value.trim());
                } else {
                    message.headers_mut().push(HeaderBlock::new(
                        block.tag_name().name(),
                        block.tag_name().namespace().unwrap_or(""),
                        value,
                    ));
                }
            }
        }
        Ok(message)
    }

    fn write_message(&self, message: &Message) -> Result<Vec<u8>, EnvelopeError> {
        let xml = match message.body() {
            // Inbound messages are already complete envelopes.
            MessageBody::Envelope(raw) => raw.clone(),
            MessageBody::Buffered(body) => wrap_in_envelope(message, body),
            MessageBody::Empty => wrap_in_envelope(message, ""),
        };
        Ok(xml.into_bytes())
    }
}

fn wrap_in_envelope(message: &Message, body: &str) -> String {
    let mut xml = XmlWriter::new();
    xml.start_element_with(
        "s:Envelope",
        &[("xmlns:s", message.version().envelope_namespace())],
    );
    if !message.headers().is_empty() {
        xml.start_element("s:Header");
        for block in message.headers().blocks() {
            xml.start_element_with(&block.name, &[("xmlns", block.namespace.as_str())]);
            xml.text(&block.value);
            xml.end_element();
        }
        xml.end_element();
    }
    xml.start_element("s:Body");
    xml.raw(body);
    xml.end_element();
    xml.end_element();
    xml.finish()
}

/// A binding names the protocol stack an endpoint speaks and supplies
/// its message encoder.
pub trait Binding {
    /// URI scheme of the transport this binding expects.
    fn scheme(&self) -> &str;

    fn message_encoder(&self) -> Arc<dyn MessageEncoder>;
}

/// Plain HTTP with text-encoded 1.1 envelopes.
pub struct BasicHttpBinding {
    encoder: Arc<dyn MessageEncoder>,
}

impl BasicHttpBinding {
    pub fn new() -> Self {
        BasicHttpBinding {
            encoder: Arc::new(TextMessageEncoder::new(SoapVersion::Soap11)),
        }
    }
}

impl Default for BasicHttpBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl Binding for BasicHttpBinding {
    fn scheme(&self) -> &str {
        "http"
    }

    fn message_encoder(&self) -> Arc<dyn MessageEncoder> {
        self.encoder.clone()
    }
}
