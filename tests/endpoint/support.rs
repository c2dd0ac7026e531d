//! Test domain: a calculator service behind a SOAP contract.

use std::sync::{Arc, Mutex};

use soap_endpoint::{
    ContractDescription, CorrelationState, Endpoint, Message, MessageInspector, OperationContext,
    OperationDescription, Param, ParameterInspector, ServiceDescription, ServiceFault,
    ServiceProvider, SoapRequest, SoapResponse, SoapValue,
};

pub const ADD_ACTION: &str = "http://tempuri.org/ICalculator/Add";
pub const SUBTRACT_ACTION: &str = "http://tempuri.org/ICalculator/Subtract";
pub const MULTIPLY_ACTION: &str = "http://tempuri.org/ICalculator/Multiply";
pub const DIVIDE_ACTION: &str = "http://tempuri.org/ICalculator/Divide";
pub const ECHO_ACTION: &str = "http://tempuri.org/ICalculator/Echo";
pub const PEER_ACTION: &str = "http://tempuri.org/ICalculator/Peer";
pub const NOTIFY_ACTION: &str = "http://tempuri.org/ICalculator/Notify";

/// The service under test. One-way notifications are recorded so tests
/// can observe that the handler actually ran.
#[derive(Default)]
pub struct Calculator {
    pub notifications: Mutex<Vec<String>>,
}

impl Calculator {
    pub fn add(&self, x: f64, y: f64) -> f64 {
        x + y
    }

    pub fn subtract(&self, x: f64, y: f64) -> f64 {
        x - y
    }

    pub fn multiply(&self, x: f64, y: f64) -> f64 {
        x * y
    }

    pub fn divide(&self, x: f64, y: f64) -> Result<f64, ServiceFault> {
        if y == 0.0 {
            Err(ServiceFault::new("division by zero"))
        } else {
            Ok(x / y)
        }
    }
}

/// Positional argument access that tolerates the strict policy's
/// shortened arrays.
pub fn arg_f64(args: &[SoapValue], index: usize) -> f64 {
    args.get(index).and_then(SoapValue::as_f64).unwrap_or(0.0)
}

pub fn calculator_description() -> ServiceDescription<Calculator> {
    ServiceDescription::<Calculator>::new().contract(
        ContractDescription::new("ICalculator")
            .operation(
                OperationDescription::new(
                    "Add",
                    |svc: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
                        Ok(SoapValue::Double(svc.add(arg_f64(args, 0), arg_f64(args, 1))))
                    },
                )
                .param(Param::double("x"))
                .param(Param::double("y")),
            )
            .operation(
                OperationDescription::new(
                    "Subtract",
                    |svc: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
                        Ok(SoapValue::Double(
                            svc.subtract(arg_f64(args, 0), arg_f64(args, 1)),
                        ))
                    },
                )
                .param(Param::double("x"))
                .param(Param::double("y")),
            )
            .operation(
                OperationDescription::new(
                    "Multiply",
                    |svc: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
                        Ok(SoapValue::Double(
                            svc.multiply(arg_f64(args, 0), arg_f64(args, 1)),
                        ))
                    },
                )
                .param(Param::double("x"))
                .param(Param::double("y")),
            )
            .operation(
                OperationDescription::new(
                    "Divide",
                    |svc: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
                        svc.divide(arg_f64(args, 0), arg_f64(args, 1))
                            .map(SoapValue::Double)
                    },
                )
                .param(Param::double("x"))
                .param(Param::double("y")),
            )
            .operation(
                OperationDescription::new(
                    "Echo",
                    |_: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
                        Ok(args.first().cloned().unwrap_or(SoapValue::Null))
                    },
                )
                .param(Param::string("text")),
            )
            .operation(OperationDescription::new(
                "Peer",
                |_: &Calculator, ctx: &mut OperationContext, _: &[SoapValue]| {
                    let address = ctx
                        .incoming_properties()
                        .and_then(|props| props.remote_endpoint())
                        .map(|peer| format!("{}:{}", peer.address(), peer.port()))
                        .unwrap_or_default();
                    Ok(SoapValue::Text(address))
                },
            ))
            .operation(
                OperationDescription::new(
                    "Notify",
                    |svc: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
                        let message = args
                            .first()
                            .and_then(SoapValue::as_str)
                            .unwrap_or("")
                            .to_string();
                        svc.notifications.lock().unwrap().push(message);
                        Ok(SoapValue::Null)
                    },
                )
                .param(Param::string("message"))
                .one_way(),
            ),
    )
}

pub fn calculator_endpoint() -> Endpoint<Calculator> {
    endpoint_with(calculator_description())
}

pub fn endpoint_with(description: ServiceDescription<Calculator>) -> Endpoint<Calculator> {
    Endpoint::new(
        "/calculator",
        description,
        ServiceProvider::singleton(Calculator::default()),
    )
}

/// Wraps `body` in a 1.1 envelope.
pub fn envelope(body: &str) -> String {
    format!(
        "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <s:Body>{body}</s:Body></s:Envelope>"
    )
}

pub fn request<'a>(body: &'a str, action: &'a str) -> SoapRequest<'a> {
    SoapRequest {
        body: body.as_bytes(),
        content_type: Some("text/xml; charset=utf-8"),
        soap_action: Some(action),
        remote: None,
    }
}

pub fn body_text(response: SoapResponse) -> String {
    String::from_utf8(response.body).unwrap()
}

/// Message inspector that appends to a shared log and threads a string
/// through its correlation state.
pub struct RecordingMessageInspector {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl MessageInspector for RecordingMessageInspector {
    fn after_receive_request(&self, request: &mut Message) -> CorrelationState {
        self.log.lock().unwrap().push(format!(
            "{}:after_receive:{}",
            self.name,
            request.headers().action().unwrap_or("")
        ));
        Some(Box::new(format!("{}-state", self.name)))
    }

    fn before_send_reply(&self, reply: &mut Option<Message>, correlation: CorrelationState) {
        let state = correlation
            .and_then(|boxed| boxed.downcast::<String>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default();
        self.log.lock().unwrap().push(format!(
            "{}:before_send:reply={}:{}",
            self.name,
            reply.is_some(),
            state
        ));
    }
}

/// Parameter inspector that appends to a shared log and threads the
/// input count through its correlation state.
pub struct RecordingParameterInspector {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ParameterInspector for RecordingParameterInspector {
    fn before_call(&self, operation: &str, inputs: &[SoapValue]) -> CorrelationState {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:before_call:{}:{}", self.name, operation, inputs.len()));
        Some(Box::new(inputs.len()))
    }

    fn after_call(
        &self,
        operation: &str,
        _inputs: &[SoapValue],
        return_value: &SoapValue,
        correlation: CorrelationState,
    ) {
        let state = correlation
            .and_then(|boxed| boxed.downcast::<usize>().ok())
            .map(|boxed| *boxed)
            .unwrap_or(0);
        self.log.lock().unwrap().push(format!(
            "{}:after_call:{}:{:?}:{}",
            self.name, operation, return_value, state
        ));
    }
}
