//! Per-request operation context.
//!
//! A fresh [`OperationContext`] is created for every dispatch and handed
//! to the operation handler explicitly. It exposes read access to the
//! inbound message's headers and properties, and lazily-created outbound
//! collections that the dispatcher folds into the reply after the
//! handler returns.

use crate::message::{Message, MessageHeaders, MessageProperties, SoapVersion};

/// State scoped to one in-flight operation invocation.
#[derive(Debug, Default)]
pub struct OperationContext {
    request: Option<Message>,
    outgoing_headers: Option<MessageHeaders>,
    outgoing_properties: Option<MessageProperties>,
    outgoing_version: Option<SoapVersion>,
}

impl OperationContext {
    /// Attaches the inbound request. The outbound version mirrors the
    /// request's version until the context is recycled.
    pub fn new(request: Message) -> Self {
        let version = request.version();
        OperationContext {
            request: Some(request),
            outgoing_headers: None,
            outgoing_properties: None,
            outgoing_version: Some(version),
        }
    }

    pub fn incoming_headers(&self) -> Option<&MessageHeaders> {
        self.request.as_ref().map(Message::headers)
    }

    pub fn incoming_properties(&self) -> Option<&MessageProperties> {
        self.request.as_ref().map(Message::properties)
    }

    pub fn incoming_properties_mut(&mut self) -> Option<&mut MessageProperties> {
        self.request.as_mut().map(Message::properties_mut)
    }

    pub fn incoming_version(&self) -> Option<SoapVersion> {
        self.request.as_ref().map(Message::version)
    }

    pub fn outgoing_version(&self) -> Option<SoapVersion> {
        self.outgoing_version
    }

    pub(crate) fn request(&self) -> Option<&Message> {
        self.request.as_ref()
    }

    pub(crate) fn request_mut(&mut self) -> Option<&mut Message> {
        self.request.as_mut()
    }

    /// True once a handler or inspector has touched the outbound
    /// headers. Checking this does not allocate the collection.
    pub fn has_outgoing_headers(&self) -> bool {
        self.outgoing_headers.is_some()
    }

    /// Outbound headers, created on first access.
    pub fn outgoing_headers(&mut self) -> &mut MessageHeaders {
        self.outgoing_headers.get_or_insert_with(MessageHeaders::new)
    }

    pub fn has_outgoing_properties(&self) -> bool {
        self.outgoing_properties.is_some()
    }

    /// Outbound properties, created on first access.
    pub fn outgoing_properties(&mut self) -> &mut MessageProperties {
        self.outgoing_properties
            .get_or_insert_with(MessageProperties::new)
    }

    /// Folds whatever outbound state was populated into `reply`:
    /// headers are copied wholesale, properties merged key by key with
    /// the routing slots copied last.
    pub fn apply_outgoing(&self, reply: &mut Message) {
        if let Some(headers) = &self.outgoing_headers {
            reply.headers_mut().copy_headers_from(headers);
        }
        if let Some(properties) = &self.outgoing_properties {
            reply.properties_mut().merge_from(properties);
        }
    }

    /// Resets every field to empty, releasing the inbound message. Runs
    /// at the end of every dispatch, successful or not, so nothing
    /// leaks from one request into the next.
    pub fn recycle(&mut self) {
        self.request = None;
        self.outgoing_headers = None;
        self.outgoing_properties = None;
        self.outgoing_version = None;
    }
}
