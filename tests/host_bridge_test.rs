mod common;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use common::RecordingGate;
use scriptshim::{GateBridge, Handle, HostBridge, HostCall, ShimError};
use serde_json::{json, Value as JsonValue};

#[test]
fn operations_use_wire_names_and_argument_order() {
    let gate = RecordingGate::new();
    gate.reply("querySelectorAll", json!([]));
    gate.reply("XMLHttpRequest_send", json!("ok"));
    let bridge = GateBridge::new(gate.clone());

    bridge.log("hi").expect("log");
    bridge.query_selector_all("p > a").expect("query");
    bridge.get_attribute(&Handle::Index(3), "href").expect("attr");
    bridge.set_inner_html(&Handle::from("h-1"), "<i>x</i>").expect("html");
    bridge.xhr_send("PUT", "/r", Some("data")).expect("xhr");

    assert_eq!(
        gate.calls(),
        vec![
            ("log".to_string(), vec![json!("hi")]),
            ("querySelectorAll".to_string(), vec![json!("p > a")]),
            ("getAttribute".to_string(), vec![json!(3), json!("href")]),
            ("innerHTML_set".to_string(), vec![json!("h-1"), json!("<i>x</i>")]),
            (
                "XMLHttpRequest_send".to_string(),
                vec![json!("PUT"), json!("/r"), json!("data")]
            ),
        ]
    );
}

#[test]
fn mixed_handles_decode() {
    let gate = RecordingGate::new();
    gate.reply("querySelectorAll", json!([0, "node-7", -1]));
    let bridge = GateBridge::new(gate);

    let handles = bridge.query_selector_all("*").expect("query");
    assert_eq!(
        handles,
        vec![Handle::Index(0), Handle::from("node-7"), Handle::Index(-1)]
    );
}

#[test]
fn malformed_replies_are_host_call_failures() {
    let gate = RecordingGate::new();
    gate.reply("querySelectorAll", json!({"not": "an array"}));
    gate.reply("getAttribute", json!(12));
    gate.reply("XMLHttpRequest_send", json!(null));
    let bridge = GateBridge::new(gate);

    let err = bridge.query_selector_all("p").unwrap_err();
    assert!(matches!(err, ShimError::HostCall { operation: "querySelectorAll", .. }));

    let err = bridge.get_attribute(&Handle::Index(1), "id").unwrap_err();
    assert!(matches!(err, ShimError::HostCall { operation: "getAttribute", .. }));

    let err = bridge.xhr_send("GET", "/", None).unwrap_err();
    assert!(matches!(err, ShimError::HostCall { operation: "XMLHttpRequest_send", .. }));
}

#[test]
fn closures_can_serve_as_gates() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&seen);
    let bridge = GateBridge::new(move |name: &str, args: Vec<JsonValue>| {
        recorder.borrow_mut().push(name.to_string());
        match name {
            "getAttribute" => Ok(json!(format!("value-of-{}", args[1].as_str().unwrap_or("")))),
            "log" => Err(anyhow!("log sink closed")),
            _ => Ok(JsonValue::Null),
        }
    });

    let value = bridge.get_attribute(&Handle::Index(1), "title").expect("attr");
    assert_eq!(value.as_deref(), Some("value-of-title"));
    let err = bridge.log("lost").unwrap_err();
    assert!(err.to_string().contains("log sink closed"));
    assert_eq!(*seen.borrow(), vec!["getAttribute", "log"]);
}

#[test]
fn wire_form_decodes_back_into_calls() {
    let call = HostCall::from_wire("getAttribute", &[json!(5), json!("alt")]).expect("decode");
    assert_eq!(
        call,
        HostCall::GetAttribute {
            handle: Handle::Index(5),
            name: "alt".to_string(),
        }
    );
    assert_eq!(call.name(), "getAttribute");

    assert!(HostCall::from_wire("eval", &[]).is_err());
    assert!(HostCall::from_wire("innerHTML_set", &[json!(1)]).is_err());
}
