//! Messages and their out-of-band state.
//!
//! A [`Message`] is an envelope plus two side tables: [`MessageHeaders`]
//! (protocol headers such as the action) and [`MessageProperties`]
//! (host metadata such as the remote endpoint). Inbound messages carry
//! the raw envelope text; outbound messages carry a body that was fully
//! buffered before the message was created, so a reply either exists in
//! its entirety or not at all.

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::body_writer::BodyWriter;
use crate::encoder::MessageEncoder;
use crate::error::EnvelopeError;
use crate::xml::XmlWriter;

/// Envelope dialects the encoders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    pub fn envelope_namespace(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "http://schemas.xmlsoap.org/soap/envelope/",
            SoapVersion::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }

    /// Media type without parameters, used to validate inbound requests.
    pub fn media_type(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "text/xml",
            SoapVersion::Soap12 => "application/soap+xml",
        }
    }

    /// Full content type for outbound responses.
    pub fn content_type(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "text/xml; charset=utf-8",
            SoapVersion::Soap12 => "application/soap+xml; charset=utf-8",
        }
    }
}

/// One application-defined header element, serialized into the
/// envelope's `Header` section as `<name xmlns="namespace">value</name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    pub name: String,
    pub namespace: String,
    pub value: String,
}

impl HeaderBlock {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        HeaderBlock {
            name: name.into(),
            namespace: namespace.into(),
            value: value.into(),
        }
    }
}

/// Protocol headers attached to a message.
///
/// The action is addressing state rather than a plain block, so it gets
/// its own slot; the rest is an ordered list of [`HeaderBlock`]s.
#[derive(Debug, Clone, Default)]
pub struct MessageHeaders {
    action: Option<String>,
    blocks: Vec<HeaderBlock>,
}

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn set_action(&mut self, action: impl Into<String>) {
        self.action = Some(action.into());
    }

    pub fn push(&mut self, block: HeaderBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[HeaderBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Copies all headers from `other` into this collection. Blocks are
    /// appended wholesale; the action is overwritten only when `other`
    /// actually carries one.
    pub fn copy_headers_from(&mut self, other: &MessageHeaders) {
        if other.action.is_some() {
            self.action = other.action.clone();
        }
        self.blocks.extend(other.blocks.iter().cloned());
    }
}

/// A single entry in [`MessageProperties`].
#[derive(Clone)]
pub enum PropertyValue {
    RemoteEndpoint(RemoteEndpointProperty),
    Text(String),
    Flag(bool),
    /// Anything else a host or inspector wants to stash on the message.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::RemoteEndpoint(p) => f.debug_tuple("RemoteEndpoint").field(p).finish(),
            PropertyValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            PropertyValue::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            PropertyValue::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Keyed host metadata riding alongside a message, plus the transport
/// routing slots (`via`, output batching, encoder override) that are not
/// ordinary entries because replies overwrite them wholesale.
#[derive(Clone, Default)]
pub struct MessageProperties {
    entries: HashMap<String, PropertyValue>,
    via: Option<String>,
    allow_output_batching: bool,
    encoder: Option<Arc<dyn MessageEncoder>>,
}

impl MessageProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The transport endpoint the request arrived from, if recorded.
    pub fn remote_endpoint(&self) -> Option<&RemoteEndpointProperty> {
        match self.entries.get(RemoteEndpointProperty::NAME) {
            Some(PropertyValue::RemoteEndpoint(p)) => Some(p),
            _ => None,
        }
    }

    pub fn via(&self) -> Option<&str> {
        self.via.as_deref()
    }

    pub fn set_via(&mut self, via: impl Into<String>) {
        self.via = Some(via.into());
    }

    pub fn allow_output_batching(&self) -> bool {
        self.allow_output_batching
    }

    pub fn set_allow_output_batching(&mut self, allow: bool) {
        self.allow_output_batching = allow;
    }

    pub fn encoder_override(&self) -> Option<&Arc<dyn MessageEncoder>> {
        self.encoder.as_ref()
    }

    pub fn set_encoder_override(&mut self, encoder: Arc<dyn MessageEncoder>) {
        self.encoder = Some(encoder);
    }

    /// Merges `other` into this collection: entries are inserted key by
    /// key (replacing collisions), then the routing slots are copied
    /// last so `other`'s values win.
    pub fn merge_from(&mut self, other: &MessageProperties) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
        self.via = other.via.clone();
        self.allow_output_batching = other.allow_output_batching;
        self.encoder = other.encoder.clone();
    }
}

impl fmt::Debug for MessageProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageProperties")
            .field("entries", &self.entries)
            .field("via", &self.via)
            .field("allow_output_batching", &self.allow_output_batching)
            .field("encoder", &self.encoder.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Address and port of the peer that sent the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpointProperty {
    address: String,
    port: u16,
}

impl RemoteEndpointProperty {
    /// Key under which the dispatcher records this property.
    pub const NAME: &'static str = "remote_endpoint";

    pub fn new(address: impl Into<String>, port: u16) -> Result<Self, EmptyEndpointAddress> {
        let address = address.into();
        if address.is_empty() {
            return Err(EmptyEndpointAddress);
        }
        Ok(RemoteEndpointProperty { address, port })
    }

    /// Builds the property from transport metadata, falling back to the
    /// IPv6 loopback when the transport could not tell us the peer.
    pub fn from_transport(remote: Option<SocketAddr>) -> Self {
        match remote {
            Some(addr) => RemoteEndpointProperty {
                address: addr.ip().to_string(),
                port: addr.port(),
            },
            None => RemoteEndpointProperty {
                address: "::1".to_string(),
                port: 0,
            },
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// A remote endpoint must have a non-empty address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyEndpointAddress;

impl fmt::Display for EmptyEndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("remote endpoint address must not be empty")
    }
}

impl Error for EmptyEndpointAddress {}

/// Where a message's body currently lives.
#[derive(Debug, Clone)]
pub enum MessageBody {
    /// No body at all (one-way acknowledgements).
    Empty,
    /// Inbound: the complete envelope as received.
    Envelope(String),
    /// Outbound: body content already serialized by a body writer.
    Buffered(String),
}

/// An envelope in flight through the pipeline.
#[derive(Debug, Clone)]
pub struct Message {
    version: SoapVersion,
    headers: MessageHeaders,
    properties: MessageProperties,
    body: MessageBody,
}

impl Message {
    /// Wraps a received envelope. Headers start empty; the encoder that
    /// parsed the envelope fills in whatever it found there.
    pub fn from_envelope(version: SoapVersion, envelope: String) -> Self {
        Message {
            version,
            headers: MessageHeaders::new(),
            properties: MessageProperties::new(),
            body: MessageBody::Envelope(envelope),
        }
    }

    /// Builds an outbound message by running `writer` to completion into
    /// a buffer. Serialization failures surface here, before the message
    /// exists, so a reply is never partially written.
    pub fn from_body_writer(
        version: SoapVersion,
        action: Option<String>,
        writer: &dyn BodyWriter,
    ) -> Result<Self, EnvelopeError> {
        let mut xml = XmlWriter::new();
        writer.write(&mut xml)?;
        let mut headers = MessageHeaders::new();
        if let Some(action) = action {
            headers.set_action(action);
        }
        Ok(Message {
            version,
            headers,
            properties: MessageProperties::new(),
            body: MessageBody::Buffered(xml.finish()),
        })
    }

    /// A message with no body.
    pub fn empty(version: SoapVersion) -> Self {
        Message {
            version,
            headers: MessageHeaders::new(),
            properties: MessageProperties::new(),
            body: MessageBody::Empty,
        }
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut MessageHeaders {
        &mut self.headers
    }

    pub fn properties(&self) -> &MessageProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut MessageProperties {
        &mut self.properties
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn set_body(&mut self, body: MessageBody) {
        self.body = body;
    }

    /// Raw envelope text for inbound messages.
    pub fn envelope_xml(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Envelope(xml) => Some(xml),
            _ => None,
        }
    }

    /// Buffered body content for outbound messages.
    pub fn body_xml(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Buffered(xml) => Some(xml),
            _ => None,
        }
    }
}
