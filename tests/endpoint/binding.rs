//! Argument binding through the endpoint, under both policies.

use soap_endpoint::{BindingPolicy, DispatchError};

use crate::support::{
    self, body_text, envelope, request, ADD_ACTION, ECHO_ACTION, MULTIPLY_ACTION, SUBTRACT_ACTION,
};

#[test]
fn lenient_accepts_elements_in_any_order() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Add><y>3</y><x>2</x></Add>");

    let text = body_text(endpoint.handle(request(&body, ADD_ACTION)).unwrap());
    assert!(text.contains("<AddResult>5</AddResult>"));
}

#[test]
fn lenient_matches_names_case_insensitively() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Add><X>2</X><Y>3</Y></Add>");

    let text = body_text(endpoint.handle(request(&body, ADD_ACTION)).unwrap());
    assert!(text.contains("<AddResult>5</AddResult>"));
}

#[test]
fn lenient_fills_missing_parameters_with_defaults() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Subtract><y>3</y></Subtract>");

    let text = body_text(endpoint.handle(request(&body, SUBTRACT_ACTION)).unwrap());
    assert!(text.contains("<SubtractResult>-3</SubtractResult>"));
}

#[test]
fn lenient_ignores_elements_that_match_nothing() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Multiply><x>2</x><noise>1</noise><y>3</y></Multiply>");

    let text = body_text(endpoint.handle(request(&body, MULTIPLY_ACTION)).unwrap());
    assert!(text.contains("<MultiplyResult>6</MultiplyResult>"));
}

#[test]
fn strict_reads_parameters_in_declared_order() {
    let endpoint = support::calculator_endpoint().binding_policy(BindingPolicy::Strict);
    let body = envelope("<Subtract xmlns=\"http://tempuri.org/\"><x>9</x><y>4</y></Subtract>");

    let text = body_text(endpoint.handle(request(&body, SUBTRACT_ACTION)).unwrap());
    assert!(text.contains("<SubtractResult>5</SubtractResult>"));
}

#[test]
fn strict_missing_parameters_stay_at_their_defaults() {
    // With x absent its slot keeps the default 0 and y binds into its
    // own slot, so the handler computes 0 - 3.
    let endpoint = support::calculator_endpoint().binding_policy(BindingPolicy::Strict);
    let body = envelope("<Subtract xmlns=\"http://tempuri.org/\"><y>3</y></Subtract>");

    let text = body_text(endpoint.handle(request(&body, SUBTRACT_ACTION)).unwrap());
    assert!(text.contains("<SubtractResult>-3</SubtractResult>"));
}

#[test]
fn string_parameters_bind_untrimmed() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Echo><text>  spaced out  </text></Echo>");

    let text = body_text(endpoint.handle(request(&body, ECHO_ACTION)).unwrap());
    assert!(text.contains("<EchoResult>  spaced out  </EchoResult>"));
}

#[test]
fn type_mismatches_fail_the_request() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Add><x>two</x><y>3</y></Add>");

    let err = endpoint.handle(request(&body, ADD_ACTION)).unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(matches!(err, DispatchError::Binding(_)));
}

#[test]
fn a_missing_wrapper_fails_the_request() {
    let endpoint = support::calculator_endpoint();
    let body = envelope("<Multiply><x>2</x><y>3</y></Multiply>");

    let err = endpoint.handle(request(&body, ADD_ACTION)).unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(matches!(err, DispatchError::Binding(_)));
}
