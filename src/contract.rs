//! Contract tables: services, contracts, operations, parameters.
//!
//! A [`ServiceDescription`] is built once at startup from explicit
//! builder calls and never changes afterward; dispatch is a lookup into
//! these tables. Handlers are early-bound closures, so invoking an
//! operation is an ordinary call through a `dyn Fn`.
//!
//! ## Example
//!
//! ```ignore
//! let service = ServiceDescription::<Calculator>::new().contract(
//!     ContractDescription::new("ICalculator").operation(
//!         OperationDescription::new("Add", |svc: &Calculator, _ctx, args| {
//!             let x = args[0].as_f64().unwrap_or(0.0);
//!             let y = args[1].as_f64().unwrap_or(0.0);
//!             Ok(SoapValue::Double(svc.add(x, y)))
//!         })
//!         .param(Param::double("x"))
//!         .param(Param::double("y")),
//!     ),
//! );
//! ```

use tracing::debug;

use crate::context::OperationContext;
use crate::error::ServiceFault;
use crate::inspector::{MessageInspector, ParameterInspector};
use crate::value::{SoapKind, SoapValue};

/// Namespace a contract uses unless one is set explicitly.
pub const DEFAULT_NAMESPACE: &str = "http://tempuri.org/";

/// Early-bound entry point of one operation.
pub type OperationHandler<S> =
    Box<dyn Fn(&S, &mut OperationContext, &[SoapValue]) -> Result<SoapValue, ServiceFault> + Send + Sync>;

/// One declared parameter of an operation.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    wire_name: Option<String>,
    kind: SoapKind,
    default: Option<SoapValue>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: SoapKind) -> Self {
        Param {
            name: name.into(),
            wire_name: None,
            kind,
            default: None,
        }
    }

    pub fn double(name: impl Into<String>) -> Self {
        Param::new(name, SoapKind::Double)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Param::new(name, SoapKind::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Param::new(name, SoapKind::Bool)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Param::new(name, SoapKind::Str)
    }

    /// Element name to look for on the wire when it differs from the
    /// parameter name.
    pub fn wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    /// Value the parameter takes when its element never arrives.
    pub fn default_value(mut self, value: SoapValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wire_name_opt(&self) -> Option<&str> {
        self.wire_name.as_deref()
    }

    pub fn kind(&self) -> SoapKind {
        self.kind
    }

    /// Declared default, or the kind's absent value.
    pub fn initial_value(&self) -> SoapValue {
        match &self.default {
            Some(value) => value.clone(),
            None => self.kind.absent(),
        }
    }
}

/// One invocable operation of a contract.
pub struct OperationDescription<S> {
    name: String,
    soap_action: Option<String>,
    reply_action: Option<String>,
    result_name: Option<String>,
    one_way: bool,
    params: Vec<Param>,
    handler: OperationHandler<S>,
    parameter_inspectors: Vec<Box<dyn ParameterInspector>>,
}

impl<S> OperationDescription<S> {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&S, &mut OperationContext, &[SoapValue]) -> Result<SoapValue, ServiceFault>
            + Send
            + Sync
            + 'static,
    {
        OperationDescription {
            name: name.into(),
            soap_action: None,
            reply_action: None,
            result_name: None,
            one_way: false,
            params: Vec::new(),
            handler: Box::new(handler),
            parameter_inspectors: Vec::new(),
        }
    }

    /// Overrides the derived action URI.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.soap_action = Some(action.into());
        self
    }

    /// Action stamped on the reply. Absent by default.
    pub fn reply_action(mut self, action: impl Into<String>) -> Self {
        self.reply_action = Some(action.into());
        self
    }

    /// Overrides the `{name}Result` reply element name.
    pub fn result_name(mut self, name: impl Into<String>) -> Self {
        self.result_name = Some(name.into());
        self
    }

    /// Marks the operation one-way: invoked for effect, no reply built.
    pub fn one_way(mut self) -> Self {
        self.one_way = true;
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_parameter_inspector(mut self, inspector: impl ParameterInspector + 'static) -> Self {
        self.parameter_inspectors.push(Box::new(inspector));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved action URI. Defaults are filled in when the
    /// enclosing contract is added to a [`ServiceDescription`]; before
    /// that, an unset action reads as empty.
    pub fn soap_action(&self) -> &str {
        self.soap_action.as_deref().unwrap_or("")
    }

    pub fn reply_action_opt(&self) -> Option<&str> {
        self.reply_action.as_deref()
    }

    /// Element name of the result inside the `{name}Response` wrapper.
    pub fn result_element_name(&self) -> String {
        match &self.result_name {
            Some(name) => name.clone(),
            None => format!("{}Result", self.name),
        }
    }

    pub fn is_one_way(&self) -> bool {
        self.one_way
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn parameter_inspectors(&self) -> &[Box<dyn ParameterInspector>] {
        &self.parameter_inspectors
    }

    pub(crate) fn invoke(
        &self,
        service: &S,
        context: &mut OperationContext,
        arguments: &[SoapValue],
    ) -> Result<SoapValue, ServiceFault> {
        (self.handler)(service, context, arguments)
    }
}

/// A named group of operations sharing a namespace.
pub struct ContractDescription<S> {
    name: String,
    namespace: String,
    operations: Vec<OperationDescription<S>>,
}

impl<S> ContractDescription<S> {
    pub fn new(name: impl Into<String>) -> Self {
        ContractDescription {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            operations: Vec::new(),
        }
    }

    /// Sets the contract namespace. Derived actions pick it up when the
    /// contract is added to a [`ServiceDescription`].
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn operation(mut self, operation: OperationDescription<S>) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace
    }

    pub fn operations(&self) -> &[OperationDescription<S>] {
        &self.operations
    }

    fn derived_action(&self, operation: &str) -> String {
        format!(
            "{}/{}/{}",
            self.namespace.trim_end_matches('/'),
            self.name,
            operation
        )
    }
}

/// The complete dispatchable surface of one service: its contracts and
/// the message inspectors that run around every operation.
pub struct ServiceDescription<S> {
    name: String,
    contracts: Vec<ContractDescription<S>>,
    message_inspectors: Vec<Box<dyn MessageInspector>>,
}

impl<S> ServiceDescription<S> {
    pub fn new() -> Self {
        ServiceDescription {
            name: std::any::type_name::<S>().to_string(),
            contracts: Vec::new(),
            message_inspectors: Vec::new(),
        }
    }

    /// Display name used in logs; defaults to the service type's name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a contract, resolving each operation's action against the
    /// contract namespace: unset actions become
    /// `{namespace}/{contract}/{operation}` with any trailing slash on
    /// the namespace trimmed first.
    pub fn contract(mut self, mut contract: ContractDescription<S>) -> Self {
        for index in 0..contract.operations.len() {
            if contract.operations[index].soap_action.is_none() {
                let action = contract.derived_action(&contract.operations[index].name);
                contract.operations[index].soap_action = Some(action);
            }
        }
        self.contracts.push(contract);
        self
    }

    /// Registers a message inspector that runs for every operation, in
    /// registration order.
    pub fn with_service_inspector(mut self, inspector: impl MessageInspector + 'static) -> Self {
        self.message_inspectors.push(Box::new(inspector));
        self
    }

    /// Attaches a parameter inspector to the named operation. An unknown
    /// name is skipped without error, matching how decorations on
    /// non-operations behave.
    pub fn with_operation_inspector(
        mut self,
        operation: &str,
        inspector: impl ParameterInspector + 'static,
    ) -> Self {
        let found = self
            .contracts
            .iter_mut()
            .flat_map(|c| c.operations.iter_mut())
            .find(|op| op.name == operation);
        match found {
            Some(op) => op.parameter_inspectors.push(Box::new(inspector)),
            None => {
                debug!(operation, "operation inspector skipped, no such operation");
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contracts(&self) -> &[ContractDescription<S>] {
        &self.contracts
    }

    pub fn message_inspectors(&self) -> &[Box<dyn MessageInspector>] {
        &self.message_inspectors
    }

    /// All operations in declaration order, paired with their contract.
    pub fn operations(
        &self,
    ) -> impl Iterator<Item = (&ContractDescription<S>, &OperationDescription<S>)> {
        self.contracts
            .iter()
            .flat_map(|c| c.operations.iter().map(move |op| (c, op)))
    }

    /// Finds the first operation whose action matches exactly. Matching
    /// is case-sensitive and declaration order breaks ties.
    pub fn resolve(
        &self,
        action: &str,
    ) -> Option<(&ContractDescription<S>, &OperationDescription<S>)> {
        self.operations().find(|(_, op)| op.soap_action() == action)
    }
}

impl<S> Default for ServiceDescription<S> {
    fn default() -> Self {
        Self::new()
    }
}
