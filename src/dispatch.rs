//! The dispatch coordinator.
//!
//! [`Endpoint::handle`] drives one request through the full pipeline:
//! decode, resolve, bind, inspect, invoke, reply, encode. It is
//! transport-neutral; the `http` feature mounts it in an HTTP pipeline,
//! and tests drive it directly with byte slices.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binder::{bind, BindingPolicy};
use crate::body_writer::ResponseBodyWriter;
use crate::context::OperationContext;
use crate::contract::ServiceDescription;
use crate::encoder::{BasicHttpBinding, Binding, MessageEncoder};
use crate::error::{DispatchError, EnvelopeError};
use crate::message::{Message, PropertyValue, RemoteEndpointProperty};

/// Payload cap applied when the host does not configure one.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// How the dispatcher obtains a service instance for each request.
pub enum ServiceProvider<S> {
    /// One shared instance for the lifetime of the endpoint.
    Singleton(Arc<S>),
    /// A fresh instance per dispatch.
    Factory(Box<dyn Fn() -> Arc<S> + Send + Sync>),
}

impl<S> ServiceProvider<S> {
    pub fn singleton(service: S) -> Self {
        ServiceProvider::Singleton(Arc::new(service))
    }

    pub fn shared(service: Arc<S>) -> Self {
        ServiceProvider::Singleton(service)
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<S> + Send + Sync + 'static,
    {
        ServiceProvider::Factory(Box::new(factory))
    }

    pub fn resolve(&self) -> Arc<S> {
        match self {
            ServiceProvider::Singleton(service) => Arc::clone(service),
            ServiceProvider::Factory(factory) => factory(),
        }
    }
}

/// One decoded-enough transport request: the raw body plus the three
/// pieces of out-of-band state the pipeline cares about.
pub struct SoapRequest<'a> {
    pub body: &'a [u8],
    pub content_type: Option<&'a str>,
    /// Transport-level action header, overriding whatever the envelope
    /// carried. Surrounding quotes are trimmed before use.
    pub soap_action: Option<&'a str>,
    pub remote: Option<SocketAddr>,
}

/// What the transport should send back for a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    pub body: Vec<u8>,
    /// `None` for one-way acknowledgements, which carry no body.
    pub content_type: Option<String>,
    /// Extra response headers, currently the reply's `SOAPAction`.
    pub headers: Vec<(String, String)>,
}

impl SoapResponse {
    fn empty() -> Self {
        SoapResponse {
            body: Vec::new(),
            content_type: None,
            headers: Vec::new(),
        }
    }
}

/// A mounted service: description, instance provider, wire format, and
/// the path the transport should intercept.
pub struct Endpoint<S> {
    path: String,
    encoder: Arc<dyn MessageEncoder>,
    policy: BindingPolicy,
    max_message_size: usize,
    description: ServiceDescription<S>,
    provider: ServiceProvider<S>,
}

impl<S> Endpoint<S> {
    /// An endpoint with the default binding (text-encoded 1.1 envelopes
    /// over HTTP), lenient argument binding, and the default size cap.
    pub fn new(
        path: impl Into<String>,
        description: ServiceDescription<S>,
        provider: ServiceProvider<S>,
    ) -> Self {
        Endpoint {
            path: path.into(),
            encoder: BasicHttpBinding::new().message_encoder(),
            policy: BindingPolicy::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            description,
            provider,
        }
    }

    /// Takes the wire format from a binding.
    pub fn with_binding(mut self, binding: &dyn Binding) -> Self {
        self.encoder = binding.message_encoder();
        self
    }

    pub fn with_encoder(mut self, encoder: impl MessageEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn binding_policy(mut self, policy: BindingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> &ServiceDescription<S> {
        &self.description
    }

    pub fn message_size_limit(&self) -> usize {
        self.max_message_size
    }

    /// Runs the full dispatch pipeline for one request.
    ///
    /// On failure the transport should answer with
    /// [`DispatchError::status_code`] and an empty body.
    pub fn handle(&self, request: SoapRequest<'_>) -> Result<SoapResponse, DispatchError> {
        let mut message =
            self.encoder
                .read_message(request.body, self.max_message_size, request.content_type)?;

        // The transport action overrides the envelope's, but only when
        // it says something once the quotes are gone.
        if let Some(action) = request.soap_action {
            let action = action.trim().trim_matches('"');
            if !action.is_empty() {
                message.headers_mut().set_action(action);
            }
        }

        message.properties_mut().insert(
            RemoteEndpointProperty::NAME,
            PropertyValue::RemoteEndpoint(RemoteEndpointProperty::from_transport(request.remote)),
        );

        // The context is recycled however dispatch ends, so nothing
        // carries over into the next request.
        let mut context = OperationContext::new(message);
        let result = self.dispatch(&mut context, request.content_type);
        context.recycle();
        result
    }

    fn dispatch(
        &self,
        context: &mut OperationContext,
        request_content_type: Option<&str>,
    ) -> Result<SoapResponse, DispatchError> {
        let action = context
            .incoming_headers()
            .and_then(|headers| headers.action())
            .unwrap_or("")
            .to_string();

        let Some((contract, operation)) = self.description.resolve(&action) else {
            warn!(
                service = %self.description.name(),
                action = %action,
                "no operation found for action"
            );
            return Err(DispatchError::UnknownAction(action));
        };
        debug!(
            service = %self.description.name(),
            operation = %operation.name(),
            action = %action,
            "dispatching"
        );

        let service = self.provider.resolve();

        let arguments = match context.request() {
            Some(message) => bind(message, contract, operation, self.policy)?,
            None => return Err(DispatchError::Envelope(EnvelopeError::MissingBody)),
        };
        debug!(
            operation = %operation.name(),
            arguments = arguments.len(),
            "arguments bound"
        );

        let message_inspectors = self.description.message_inspectors();
        let mut message_states = Vec::with_capacity(message_inspectors.len());
        if let Some(message) = context.request_mut() {
            for inspector in message_inspectors {
                message_states.push(inspector.after_receive_request(message));
            }
        }

        let parameter_inspectors = operation.parameter_inspectors();
        let mut parameter_states = Vec::with_capacity(parameter_inspectors.len());
        for inspector in parameter_inspectors {
            parameter_states.push(inspector.before_call(operation.name(), &arguments));
        }

        let return_value = operation.invoke(service.as_ref(), context, &arguments)?;

        for (inspector, state) in parameter_inspectors.iter().zip(parameter_states) {
            inspector.after_call(operation.name(), &arguments, &return_value, state);
        }

        let mut reply = if operation.is_one_way() {
            None
        } else {
            let writer = ResponseBodyWriter::new(
                contract.namespace_uri(),
                format!("{}Response", operation.name()),
                operation.result_element_name(),
                return_value,
            );
            let mut message = Message::from_body_writer(
                self.encoder.message_version(),
                operation.reply_action_opt().map(str::to_string),
                &writer,
            )?;
            context.apply_outgoing(&mut message);
            Some(message)
        };

        // Message inspectors see the reply slot even when it is empty.
        for (inspector, state) in message_inspectors.iter().zip(message_states) {
            inspector.before_send_reply(&mut reply, state);
        }

        match reply {
            Some(reply_message) => {
                let encoder = match reply_message.properties().encoder_override() {
                    Some(encoder) => Arc::clone(encoder),
                    None => Arc::clone(&self.encoder),
                };
                let body = encoder.write_message(&reply_message)?;
                let content_type = request_content_type
                    .map(str::to_string)
                    .or_else(|| Some(encoder.content_type().to_string()));
                let action_header = reply_message
                    .headers()
                    .action()
                    .unwrap_or("")
                    .to_string();
                Ok(SoapResponse {
                    body,
                    content_type,
                    headers: vec![("SOAPAction".to_string(), action_header)],
                })
            }
            None => Ok(SoapResponse::empty()),
        }
    }
}
