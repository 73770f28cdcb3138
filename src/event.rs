/// An event handed to listeners during dispatch.
///
/// The only mutable state is whether the default action should proceed, and
/// that can only go from `true` to `false`. There is no propagation path:
/// an event reaches exactly the listeners of the node it is dispatched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    event_type: String,
    proceed: bool,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            proceed: true,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Ask the host to skip its default action. Idempotent.
    pub fn cancel(&mut self) {
        self.proceed = false;
    }

    pub fn proceed(&self) -> bool {
        self.proceed
    }
}
