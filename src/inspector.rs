//! Inspection hooks around message receipt and operation invocation.
//!
//! Inspectors are registered on the service description (message level)
//! or on individual operations (parameter level) and run in registration
//! order on the way in, paired order on the way out. They are shared
//! across requests, so stateful inspectors guard their state themselves.

use std::any::Any;

use crate::message::Message;
use crate::value::SoapValue;

/// Opaque state threaded from an inspector's "before" hook to its
/// "after" hook. Each inspector receives exactly the state it returned,
/// never a neighbor's.
pub type CorrelationState = Option<Box<dyn Any + Send>>;

/// Observes whole messages on both sides of an invocation.
pub trait MessageInspector: Send + Sync {
    /// Runs once per request after the arguments are bound and before
    /// the operation is invoked. May rewrite the request in place.
    fn after_receive_request(&self, request: &mut Message) -> CorrelationState;

    /// Runs after the reply is built and before it is encoded. `reply`
    /// is `None` for one-way dispatches; the hook may replace or drop
    /// the message entirely.
    fn before_send_reply(&self, reply: &mut Option<Message>, correlation: CorrelationState);
}

/// Observes the bound argument array and the return value of one
/// operation.
pub trait ParameterInspector: Send + Sync {
    fn before_call(&self, operation: &str, inputs: &[SoapValue]) -> CorrelationState;

    /// `return_value` is whatever the handler returned, even for
    /// one-way operations whose value is then discarded instead of
    /// serialized.
    fn after_call(
        &self,
        operation: &str,
        inputs: &[SoapValue],
        return_value: &SoapValue,
        correlation: CorrelationState,
    );
}
