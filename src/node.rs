use std::fmt;
use std::fmt::Display;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::event::Event;
use crate::host::Handle;
use crate::registry::ListenerId;
use crate::session::SessionScope;

/// Callback invoked on dispatch with the wrapper the dispatch went through.
pub type Listener = Rc<dyn Fn(&Node, &mut Event) -> Result<()>>;

/// Script-side wrapper around one host handle.
///
/// Wrappers are cheap and disposable. Two wrappers holding the same handle are
/// different values but share listeners, because the registry is keyed by
/// handle.
#[derive(Clone)]
pub struct Node {
    handle: Handle,
    scope: Rc<SessionScope>,
}

impl Node {
    pub(crate) fn new(handle: Handle, scope: Rc<SessionScope>) -> Self {
        Self { handle, scope }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// The host's answer, unmodified.
    pub fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.scope.bridge.get_attribute(&self.handle, name)
    }

    /// Replace the node's markup. `value` is always sent as its string form,
    /// so `set_inner_html(5)` sends `"5"`. There is no getter.
    pub fn set_inner_html(&self, value: impl Display) -> Result<()> {
        let html = value.to_string();
        self.scope.bridge.set_inner_html(&self.handle, &html)
    }

    pub fn add_listener<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&Node, &mut Event) -> Result<()> + 'static,
    {
        let id = self
            .scope
            .listeners
            .borrow_mut()
            .add(&self.handle, event_type, Rc::new(listener) as Listener);
        debug!(
            target: "scriptshim",
            handle = %self.handle,
            event_type,
            listener = id.get(),
            "listener registered"
        );
        id
    }

    pub fn remove_listener(&self, event_type: &str, id: ListenerId) -> bool {
        self.scope
            .listeners
            .borrow_mut()
            .remove(&self.handle, event_type, id)
    }

    /// Run every listener registered for this handle and the event's type, in
    /// registration order, and report whether the default action proceeds.
    ///
    /// The listener list is captured before the first listener runs. A
    /// listener that cancels does not stop the rest; a listener that fails
    /// aborts the dispatch with its error.
    pub fn dispatch(&self, event: &mut Event) -> Result<bool> {
        let listeners = self
            .scope
            .listeners
            .borrow()
            .snapshot(&self.handle, event.event_type());
        debug!(
            target: "scriptshim",
            handle = %self.handle,
            event_type = event.event_type(),
            listeners = listeners.len(),
            "dispatch"
        );
        for listener in listeners {
            listener(self, event)?;
        }
        Ok(event.proceed())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("handle", &self.handle).finish()
    }
}
