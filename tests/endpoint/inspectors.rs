//! Inspector ordering, correlation state, and reply interception.

use std::sync::{Arc, Mutex};

use soap_endpoint::{
    ContractDescription, CorrelationState, Message, MessageInspector, OperationContext,
    OperationDescription, PropertyValue, ServiceDescription, SoapValue,
};

use crate::support::{
    self, envelope, request, Calculator, RecordingMessageInspector, RecordingParameterInspector,
    ADD_ACTION, DIVIDE_ACTION, NOTIFY_ACTION,
};

fn shared_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn hooks_run_in_pipeline_order_with_their_own_state() {
    let log = shared_log();
    let description = support::calculator_description()
        .with_service_inspector(RecordingMessageInspector {
            name: "a",
            log: Arc::clone(&log),
        })
        .with_service_inspector(RecordingMessageInspector {
            name: "b",
            log: Arc::clone(&log),
        })
        .with_operation_inspector(
            "Add",
            RecordingParameterInspector {
                name: "p",
                log: Arc::clone(&log),
            },
        );
    let endpoint = support::endpoint_with(description);
    let body = envelope("<Add><x>2</x><y>3</y></Add>");

    endpoint.handle(request(&body, ADD_ACTION)).unwrap();

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        [
            format!("a:after_receive:{ADD_ACTION}"),
            format!("b:after_receive:{ADD_ACTION}"),
            "p:before_call:Add:2".to_string(),
            "p:after_call:Add:Double(5.0):2".to_string(),
            "a:before_send:reply=true:a-state".to_string(),
            "b:before_send:reply=true:b-state".to_string(),
        ]
    );
}

#[test]
fn one_way_dispatches_still_run_reply_hooks_with_no_reply() {
    let log = shared_log();
    let description =
        support::calculator_description().with_service_inspector(RecordingMessageInspector {
            name: "m",
            log: Arc::clone(&log),
        });
    let endpoint = support::endpoint_with(description);
    let body = envelope("<Notify><message>hi</message></Notify>");

    endpoint.handle(request(&body, NOTIFY_ACTION)).unwrap();

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        [
            format!("m:after_receive:{NOTIFY_ACTION}"),
            "m:before_send:reply=false:m-state".to_string(),
        ]
    );
}

#[test]
fn a_service_fault_skips_the_after_hooks() {
    let log = shared_log();
    let description = support::calculator_description()
        .with_service_inspector(RecordingMessageInspector {
            name: "m",
            log: Arc::clone(&log),
        })
        .with_operation_inspector(
            "Divide",
            RecordingParameterInspector {
                name: "p",
                log: Arc::clone(&log),
            },
        );
    let endpoint = support::endpoint_with(description);
    let body = envelope("<Divide><x>1</x><y>0</y></Divide>");

    endpoint.handle(request(&body, DIVIDE_ACTION)).unwrap_err();

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        [
            format!("m:after_receive:{DIVIDE_ACTION}"),
            "p:before_call:Divide:2".to_string(),
        ]
    );
}

#[test]
fn message_inspectors_can_annotate_the_request_for_handlers() {
    struct Annotate;
    impl MessageInspector for Annotate {
        fn after_receive_request(&self, request: &mut Message) -> CorrelationState {
            request
                .properties_mut()
                .insert("annotated", PropertyValue::Flag(true));
            None
        }
        fn before_send_reply(&self, _reply: &mut Option<Message>, _correlation: CorrelationState) {}
    }

    let description = ServiceDescription::<Calculator>::new()
        .contract(
            ContractDescription::new("ICalculator").operation(OperationDescription::new(
                "Check",
                |_: &Calculator, ctx: &mut OperationContext, _: &[SoapValue]| {
                    let annotated = matches!(
                        ctx.incoming_properties()
                            .and_then(|props| props.get("annotated")),
                        Some(PropertyValue::Flag(true))
                    );
                    Ok(SoapValue::Bool(annotated))
                },
            )),
        )
        .with_service_inspector(Annotate);
    let endpoint = support::endpoint_with(description);
    let body = envelope("<Check/>");

    let text = support::body_text(
        endpoint
            .handle(request(&body, "http://tempuri.org/ICalculator/Check"))
            .unwrap(),
    );
    assert!(text.contains("<CheckResult>true</CheckResult>"));
}

#[test]
fn reply_hooks_can_drop_the_reply_entirely() {
    struct DropReply;
    impl MessageInspector for DropReply {
        fn after_receive_request(&self, _request: &mut Message) -> CorrelationState {
            None
        }
        fn before_send_reply(&self, reply: &mut Option<Message>, _correlation: CorrelationState) {
            *reply = None;
        }
    }

    let description = support::calculator_description().with_service_inspector(DropReply);
    let endpoint = support::endpoint_with(description);
    let body = envelope("<Add><x>2</x><y>3</y></Add>");

    let response = endpoint.handle(request(&body, ADD_ACTION)).unwrap();
    assert!(response.body.is_empty());
    assert_eq!(response.content_type, None);
}
