//! Binds a request body to an operation's declared parameter list.
//!
//! The wrapper element (named after the operation) is located inside the
//! envelope `Body`, then its children are decoded into a `SoapValue`
//! argument array under one of two policies:
//!
//! * [`Strict`](BindingPolicy::Strict) reads parameters in declared
//!   order with a forward-only cursor, the way a streaming reader would.
//! * [`Lenient`](BindingPolicy::Lenient) (the default) accepts elements
//!   in any order, ignores namespaces and strangers, and falls back to
//!   case-insensitive name matches.
//!
//! Type mismatches are fatal under both policies; a missing element is
//! not.

use roxmltree::{Document, Node};

use crate::contract::{ContractDescription, OperationDescription, Param};
use crate::error::BindError;
use crate::message::Message;
use crate::value::SoapValue;

/// How forgiving the binder is about element order, namespaces, and
/// name casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPolicy {
    /// Declared order, contract namespace required, exact names.
    Strict,
    /// Any order, namespaces ignored, case-insensitive fallback.
    #[default]
    Lenient,
}

/// Decodes the argument array for `operation` from the inbound message.
///
/// The returned vector is positional, one slot per declared parameter
/// under both policies. Under the strict policy an element that is not
/// next in the stream never binds: its parameter keeps the default and
/// the element's value is lost. That data-loss quirk is part of the
/// strict contract and is pinned by tests.
pub fn bind<S>(
    message: &Message,
    contract: &ContractDescription<S>,
    operation: &OperationDescription<S>,
    policy: BindingPolicy,
) -> Result<Vec<SoapValue>, BindError> {
    let envelope = message.envelope_xml().ok_or(BindError::EmptyBody)?;
    let doc = Document::parse(envelope)?;
    let body = doc
        .root_element()
        .children()
        .find(|node| node.is_element() && node.tag_name().name() == "Body")
        .ok_or(BindError::EmptyBody)?;

    let wrapper = body
        .children()
        .find(|node| {
            node.is_element()
                && node.tag_name().name() == operation.name()
                && match policy {
                    BindingPolicy::Strict => {
                        node.tag_name().namespace() == Some(contract.namespace_uri())
                    }
                    BindingPolicy::Lenient => true,
                }
        })
        .ok_or_else(|| BindError::MissingWrapper {
            operation: operation.name().to_string(),
        })?;

    match policy {
        BindingPolicy::Strict => bind_strict(wrapper, contract, operation),
        BindingPolicy::Lenient => bind_lenient(wrapper, operation),
    }
}

fn bind_strict<S>(
    wrapper: Node<'_, '_>,
    contract: &ContractDescription<S>,
    operation: &OperationDescription<S>,
) -> Result<Vec<SoapValue>, BindError> {
    let elements: Vec<Node<'_, '_>> = wrapper.children().filter(Node::is_element).collect();
    let mut arguments = Vec::with_capacity(operation.params().len());
    let mut cursor = 0;

    for param in operation.params() {
        let wire = param.wire_name_opt().unwrap_or(param.name());
        let next = elements.get(cursor).copied().filter(|node| {
            node.tag_name().name() == wire
                && node.tag_name().namespace() == Some(contract.namespace_uri())
        });
        // A parameter whose element is not at the cursor keeps its
        // default slot, and the cursor stays put for the next parameter.
        match next {
            Some(node) => {
                arguments.push(decode(param, node)?);
                cursor += 1;
            }
            None => arguments.push(param.initial_value()),
        }
    }
    Ok(arguments)
}

fn bind_lenient<S>(
    wrapper: Node<'_, '_>,
    operation: &OperationDescription<S>,
) -> Result<Vec<SoapValue>, BindError> {
    let params = operation.params();
    let mut arguments: Vec<SoapValue> = params.iter().map(Param::initial_value).collect();

    for node in wrapper.children().filter(Node::is_element) {
        if let Some(index) = match_param(params, node.tag_name().name()) {
            // Duplicate elements overwrite: last one wins.
            arguments[index] = decode(&params[index], node)?;
        }
    }
    Ok(arguments)
}

/// The lenient matcher ladder. Each rung is tried against every
/// parameter before the next rung is considered, so an exact match on a
/// later parameter beats a case-insensitive match on an earlier one.
fn match_param(params: &[Param], element: &str) -> Option<usize> {
    params
        .iter()
        .position(|p| p.wire_name_opt() == Some(element))
        .or_else(|| params.iter().position(|p| p.name() == element))
        .or_else(|| {
            params
                .iter()
                .position(|p| p.wire_name_opt().is_some_and(|w| w.eq_ignore_ascii_case(element)))
        })
        .or_else(|| {
            params
                .iter()
                .position(|p| p.name().eq_ignore_ascii_case(element))
        })
}

fn decode(param: &Param, node: Node<'_, '_>) -> Result<SoapValue, BindError> {
    let text = node.text().unwrap_or("");
    param
        .kind()
        .parse(text)
        .map_err(|source| BindError::Parameter {
            name: param.name().to_string(),
            source,
        })
}
