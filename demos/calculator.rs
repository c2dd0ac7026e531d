//! A four-function calculator served as a SOAP endpoint.
//!
//! Start it, then drive it with curl:
//!
//! ```text
//! cargo run --example calculator
//!
//! curl -s http://localhost:8080/calculator \
//!   -H 'Content-Type: text/xml; charset=utf-8' \
//!   -H 'SOAPAction: "http://tempuri.org/ICalculator/Add"' \
//!   --data '<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><Add xmlns="http://tempuri.org/"><x>2</x><y>3</y></Add></s:Body></s:Envelope>'
//! ```

use axum::routing::get;
use axum::Router;
use tracing_subscriber::EnvFilter;

use soap_endpoint::{
    ContractDescription, CorrelationState, Endpoint, Message, MessageInspector, OperationContext,
    OperationDescription, Param, ServiceDescription, ServiceFault, ServiceProvider, SoapRouterExt,
    SoapValue,
};

#[derive(Default)]
struct Calculator;

impl Calculator {
    fn add(&self, x: f64, y: f64) -> f64 {
        x + y
    }

    fn subtract(&self, x: f64, y: f64) -> f64 {
        x - y
    }

    fn multiply(&self, x: f64, y: f64) -> f64 {
        x * y
    }

    fn divide(&self, x: f64, y: f64) -> Result<f64, ServiceFault> {
        if y == 0.0 {
            return Err(ServiceFault::new("division by zero"));
        }
        Ok(x / y)
    }
}

/// Logs every message passing through the endpoint, in both directions.
struct LoggingInspector;

impl MessageInspector for LoggingInspector {
    fn after_receive_request(&self, request: &mut Message) -> CorrelationState {
        let action = request.headers().action().unwrap_or_default();
        tracing::info!(%action, "request received");
        None
    }

    fn before_send_reply(&self, reply: &mut Option<Message>, _correlation: CorrelationState) {
        tracing::info!(replied = reply.is_some(), "reply leaving");
    }
}

/// An operation taking two doubles and returning one.
fn binary(
    name: &str,
    op: fn(&Calculator, f64, f64) -> Result<f64, ServiceFault>,
) -> OperationDescription<Calculator> {
    OperationDescription::new(
        name,
        move |svc: &Calculator, _: &mut OperationContext, args: &[SoapValue]| {
            let x = args.first().and_then(SoapValue::as_f64).unwrap_or(0.0);
            let y = args.get(1).and_then(SoapValue::as_f64).unwrap_or(0.0);
            op(svc, x, y).map(SoapValue::Double)
        },
    )
    .param(Param::double("x"))
    .param(Param::double("y"))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let description = ServiceDescription::<Calculator>::new()
        .service_name("CalculatorService")
        .contract(
            ContractDescription::new("ICalculator")
                .operation(binary("Add", |svc, x, y| Ok(svc.add(x, y))))
                .operation(binary("Subtract", |svc, x, y| Ok(svc.subtract(x, y))))
                .operation(binary("Multiply", |svc, x, y| Ok(svc.multiply(x, y))))
                .operation(binary("Divide", Calculator::divide)),
        )
        .with_service_inspector(LoggingInspector);

    let endpoint = Endpoint::new(
        "/calculator",
        description,
        ServiceProvider::singleton(Calculator::default()),
    );

    // The endpoint rides along as a layer; every other route is served
    // by the router as usual.
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .soap_endpoint(endpoint);

    soap_endpoint::serve(app, "0.0.0.0:8080").await
}
