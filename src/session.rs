use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::console::Console;
use crate::document::Document;
use crate::error::Result;
use crate::event::Event;
use crate::host::{CallGate, GateBridge, Handle, HostBridge};
use crate::node::{Listener, Node};
use crate::registry::ListenerRegistry;
use crate::xhr::XmlHttpRequest;

pub(crate) struct SessionScope {
    pub(crate) bridge: Rc<dyn HostBridge>,
    pub(crate) listeners: RefCell<ListenerRegistry<Listener>>,
}

/// Owns the host bridge and the listener registry for one script session.
///
/// Everything handed out by a session (documents, nodes, requests) talks to
/// the same bridge and registry. Listeners are dropped when the session is
/// closed or dropped.
pub struct Session {
    scope: Rc<SessionScope>,
}

impl Session {
    pub fn new<B: HostBridge + 'static>(bridge: B) -> Self {
        Self::with_bridge(Rc::new(bridge))
    }

    pub fn with_bridge(bridge: Rc<dyn HostBridge>) -> Self {
        debug!(target: "scriptshim", "session started");
        Self {
            scope: Rc::new(SessionScope {
                bridge,
                listeners: RefCell::new(ListenerRegistry::new()),
            }),
        }
    }

    /// Session over a host that only exposes a single call gate.
    pub fn from_gate<G: CallGate + 'static>(gate: G) -> Self {
        Self::new(GateBridge::new(gate))
    }

    pub fn bridge(&self) -> Rc<dyn HostBridge> {
        Rc::clone(&self.scope.bridge)
    }

    pub fn console(&self) -> Console {
        Console::new(self.bridge())
    }

    pub fn document(&self) -> Document {
        Document::new(Rc::clone(&self.scope))
    }

    pub fn xhr(&self) -> XmlHttpRequest {
        XmlHttpRequest::new(self.bridge())
    }

    /// Wrap a handle the host already knows about.
    pub fn node(&self, handle: impl Into<Handle>) -> Node {
        Node::new(handle.into(), Rc::clone(&self.scope))
    }

    /// Entry point for host-originated events: dispatch a fresh event of
    /// `event_type` on `handle` and report whether the host should carry on
    /// with its default action. Handles nobody listens on yield `true`.
    pub fn dispatch_event(&self, handle: impl Into<Handle>, event_type: &str) -> Result<bool> {
        let mut event = Event::new(event_type);
        self.node(handle).dispatch(&mut event)
    }

    pub fn is_listening(&self, event_type: &str) -> bool {
        self.scope.listeners.borrow().is_listening(event_type)
    }

    pub fn listener_count(&self) -> usize {
        self.scope.listeners.borrow().len()
    }

    /// End the session: forget every registered listener.
    pub fn close(&self) {
        // Listener destructors run after the registry borrow is released.
        let released = self.scope.listeners.borrow_mut().clear();
        let dropped = released.len();
        drop(released);
        debug!(target: "scriptshim", dropped, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
