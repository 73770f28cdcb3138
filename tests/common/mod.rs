#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::anyhow;
use scriptshim::HostCall;
use serde_json::Value as JsonValue;

type Responder = Box<dyn Fn(&[JsonValue]) -> JsonValue>;

#[derive(Default)]
struct GateState {
    calls: Vec<(String, Vec<JsonValue>)>,
    responders: HashMap<String, Responder>,
    failing: HashSet<String>,
}

/// Call gate double: records every call and answers from canned replies.
/// Operations without a reply answer `null`.
#[derive(Clone, Default)]
pub struct RecordingGate {
    state: Rc<RefCell<GateState>>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, operation: &str, value: JsonValue) {
        self.respond_with(operation, move |_| value.clone());
    }

    pub fn respond_with(
        &self,
        operation: &str,
        responder: impl Fn(&[JsonValue]) -> JsonValue + 'static,
    ) {
        self.state
            .borrow_mut()
            .responders
            .insert(operation.to_string(), Box::new(responder));
    }

    pub fn fail(&self, operation: &str) {
        self.state.borrow_mut().failing.insert(operation.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Vec<JsonValue>)> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_named(&self, operation: &str) -> Vec<Vec<JsonValue>> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|(name, _)| name == operation)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn decoded(&self) -> Vec<HostCall> {
        self.calls()
            .iter()
            .map(|(name, args)| HostCall::from_wire(name, args).expect("well-formed call"))
            .collect()
    }
}

impl scriptshim::CallGate for RecordingGate {
    fn call(&self, name: &str, args: Vec<JsonValue>) -> anyhow::Result<JsonValue> {
        let mut state = self.state.borrow_mut();
        state.calls.push((name.to_string(), args.clone()));
        if state.failing.contains(name) {
            return Err(anyhow!("host unreachable"));
        }
        Ok(state
            .responders
            .get(name)
            .map(|responder| responder(args.as_slice()))
            .unwrap_or(JsonValue::Null))
    }
}
