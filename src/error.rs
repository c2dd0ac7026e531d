//! Error taxonomy for the dispatch pipeline.
//!
//! Failures are grouped by pipeline stage so the transport layer can map
//! each group to an HTTP status without inspecting messages: envelope and
//! binding problems are the caller's fault, unknown actions and service
//! faults are the host's.

use std::error::Error;
use std::fmt;

use crate::value::ValueParseError;

/// The request body never became a readable message.
#[derive(Debug)]
pub enum EnvelopeError {
    /// Body exceeds the endpoint's configured maximum.
    TooLarge { size: usize, max: usize },
    Utf8(std::str::Utf8Error),
    Xml(roxmltree::Error),
    /// Content type the encoder does not speak.
    ContentType(String),
    /// Root element is not an `Envelope`.
    NotAnEnvelope(String),
    /// `Envelope` carries the wrong version namespace.
    EnvelopeNamespace { expected: &'static str, found: String },
    /// `Envelope` has no `Body` child.
    MissingBody,
    /// A body writer failed while the reply was being buffered.
    BodyWriter(String),
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::TooLarge { size, max } => {
                write!(f, "message of {} bytes exceeds the {} byte limit", size, max)
            }
            EnvelopeError::Utf8(err) => write!(f, "message is not valid utf-8: {}", err),
            EnvelopeError::Xml(err) => write!(f, "message is not well-formed xml: {}", err),
            EnvelopeError::ContentType(ct) => write!(f, "unsupported content type: {}", ct),
            EnvelopeError::NotAnEnvelope(found) => {
                write!(f, "expected an Envelope root element, found: {}", found)
            }
            EnvelopeError::EnvelopeNamespace { expected, found } => {
                write!(
                    f,
                    "envelope namespace mismatch: expected {}, found {}",
                    expected, found
                )
            }
            EnvelopeError::MissingBody => write!(f, "envelope has no Body element"),
            EnvelopeError::BodyWriter(msg) => write!(f, "body writer failed: {}", msg),
        }
    }
}

impl Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EnvelopeError::Utf8(err) => Some(err),
            EnvelopeError::Xml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::str::Utf8Error> for EnvelopeError {
    fn from(err: std::str::Utf8Error) -> Self {
        EnvelopeError::Utf8(err)
    }
}

impl From<roxmltree::Error> for EnvelopeError {
    fn from(err: roxmltree::Error) -> Self {
        EnvelopeError::Xml(err)
    }
}

/// The message was readable but its body did not bind to the operation's
/// parameter list.
#[derive(Debug)]
pub enum BindError {
    /// The message had no inbound body to bind from.
    EmptyBody,
    Xml(roxmltree::Error),
    /// The operation's wrapper element is absent from the body.
    MissingWrapper { operation: String },
    /// A parameter element's text does not parse as the declared kind.
    Parameter {
        name: String,
        source: ValueParseError,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::EmptyBody => write!(f, "message has no body to bind from"),
            BindError::Xml(err) => write!(f, "body is not well-formed xml: {}", err),
            BindError::MissingWrapper { operation } => {
                write!(f, "body has no wrapper element for operation: {}", operation)
            }
            BindError::Parameter { name, source } => {
                write!(f, "parameter {}: {}", name, source)
            }
        }
    }
}

impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BindError::Xml(err) => Some(err),
            BindError::Parameter { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for BindError {
    fn from(err: roxmltree::Error) -> Self {
        BindError::Xml(err)
    }
}

/// An operation handler refused or failed the call.
#[derive(Debug)]
pub struct ServiceFault {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ServiceFault {
    pub fn new(message: impl Into<String>) -> Self {
        ServiceFault {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        ServiceFault {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServiceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service fault: {}", self.message)
    }
}

impl Error for ServiceFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn Error + 'static))
    }
}

/// Everything [`Endpoint::handle`](crate::Endpoint::handle) can fail with.
///
/// Failed dispatches produce a status code and an empty response body;
/// no fault envelope is written.
#[derive(Debug)]
pub enum DispatchError {
    /// No operation in the service description carries the request's action.
    UnknownAction(String),
    Envelope(EnvelopeError),
    Binding(BindError),
    Service(ServiceFault),
}

impl DispatchError {
    /// HTTP status the transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::UnknownAction(_) => 500,
            DispatchError::Envelope(_) => 400,
            DispatchError::Binding(_) => 400,
            DispatchError::Service(_) => 500,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownAction(action) => {
                write!(f, "no operation found for action: {}", action)
            }
            DispatchError::Envelope(err) => write!(f, "envelope error: {}", err),
            DispatchError::Binding(err) => write!(f, "binding error: {}", err),
            DispatchError::Service(err) => write!(f, "{}", err),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatchError::UnknownAction(_) => None,
            DispatchError::Envelope(err) => Some(err),
            DispatchError::Binding(err) => Some(err),
            DispatchError::Service(err) => Some(err),
        }
    }
}

impl From<EnvelopeError> for DispatchError {
    fn from(err: EnvelopeError) -> Self {
        DispatchError::Envelope(err)
    }
}

impl From<BindError> for DispatchError {
    fn from(err: BindError) -> Self {
        DispatchError::Binding(err)
    }
}

impl From<ServiceFault> for DispatchError {
    fn from(err: ServiceFault) -> Self {
        DispatchError::Service(err)
    }
}
