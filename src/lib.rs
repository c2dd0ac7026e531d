//! SOAP endpoints for Rust HTTP pipelines.
//!
//! Services are described by explicit registration tables instead of
//! reflection, dispatch is an action-keyed lookup into early-bound
//! handlers, and the pipeline itself is transport-neutral. The `http`
//! feature (on by default) mounts endpoints in an axum/tower pipeline
//! as a pass-through layer.

mod binder;
mod body_writer;
mod context;
mod contract;
mod dispatch;
mod encoder;
mod error;
#[cfg(feature = "http")]
mod http;
mod inspector;
mod message;
mod value;
mod xml;

pub use binder::{bind, BindingPolicy};
pub use body_writer::{BodyWriter, ResponseBodyWriter};
pub use context::OperationContext;
pub use contract::{
    ContractDescription, OperationDescription, OperationHandler, Param, ServiceDescription,
    DEFAULT_NAMESPACE,
};
pub use dispatch::{Endpoint, ServiceProvider, SoapRequest, SoapResponse, DEFAULT_MAX_MESSAGE_SIZE};
pub use encoder::{BasicHttpBinding, Binding, MessageEncoder, TextMessageEncoder};
pub use error::{BindError, DispatchError, EnvelopeError, ServiceFault};
#[cfg(feature = "http")]
pub use http::{serve, SoapEndpointLayer, SoapEndpointService, SoapRouterExt};
pub use inspector::{CorrelationState, MessageInspector, ParameterInspector};
pub use message::{
    EmptyEndpointAddress, HeaderBlock, Message, MessageBody, MessageHeaders, MessageProperties,
    PropertyValue, RemoteEndpointProperty, SoapVersion,
};
pub use value::{SoapKind, SoapValue, ValueParseError};
pub use xml::XmlWriter;
