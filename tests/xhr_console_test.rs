mod common;

use common::RecordingGate;
use scriptshim::{HostCall, Session, ShimError};
use serde_json::json;

#[test]
fn async_open_is_rejected_without_host_calls() {
    let gate = RecordingGate::new();
    let session = Session::from_gate(gate.clone());
    let mut request = session.xhr();

    let err = request.open("GET", "/x", true).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.to_string(), "Asynchronous XHR is not supported");
    assert!(gate.calls().is_empty());
    assert_eq!(request.method(), None);
}

#[test]
fn sync_send_issues_one_host_call() {
    let gate = RecordingGate::new();
    gate.reply("XMLHttpRequest_send", json!("pong"));
    let session = Session::from_gate(gate.clone());
    let mut request = session.xhr();

    request.open("GET", "/x", false).expect("open");
    assert_eq!(request.response_text(), None);
    request.send(Some("body")).expect("send");

    assert_eq!(request.response_text(), Some("pong"));
    assert_eq!(
        gate.decoded(),
        vec![HostCall::XmlHttpRequestSend {
            method: "GET".to_string(),
            url: "/x".to_string(),
            body: Some("body".to_string()),
        }]
    );
    assert_eq!(
        gate.calls_named("XMLHttpRequest_send"),
        vec![vec![json!("GET"), json!("/x"), json!("body")]]
    );
}

#[test]
fn send_without_body_passes_null() {
    let gate = RecordingGate::new();
    gate.reply("XMLHttpRequest_send", json!(""));
    let session = Session::from_gate(gate.clone());
    let mut request = session.xhr();

    request.open("POST", "/submit", false).expect("open");
    request.send(None).expect("send");
    assert_eq!(
        gate.calls_named("XMLHttpRequest_send"),
        vec![vec![json!("POST"), json!("/submit"), json!(null)]]
    );
    assert_eq!(request.response_text(), Some(""));
}

#[test]
fn send_before_open_is_unsupported() {
    let gate = RecordingGate::new();
    let session = Session::from_gate(gate.clone());
    let err = session.xhr().send(Some("body")).unwrap_err();
    assert!(err.is_unsupported());
    assert!(gate.calls().is_empty());
}

#[test]
fn host_rejection_leaves_response_unset() {
    let gate = RecordingGate::new();
    gate.fail("XMLHttpRequest_send");
    let session = Session::from_gate(gate.clone());
    let mut request = session.xhr();

    request.open("GET", "http://other.example/", false).expect("open");
    let err = request.send(None).unwrap_err();
    assert!(matches!(
        err,
        ShimError::HostCall {
            operation: "XMLHttpRequest_send",
            ..
        }
    ));
    assert_eq!(request.response_text(), None);
    assert_eq!(gate.calls().len(), 1);
}

#[test]
fn console_log_forwards_message() {
    let gate = RecordingGate::new();
    let session = Session::from_gate(gate.clone());
    let console = session.console();

    console.log("ready").expect("log");
    console.log(42).expect("log");

    assert_eq!(
        gate.calls_named("log"),
        vec![vec![json!("ready")], vec![json!("42")]]
    );
}
