//! Browser-like script APIs over a synchronous host call gate.
//!
//! A [`Session`] owns the [`HostBridge`] and the listener registry. From it
//! scripts get a [`Document`] to query nodes, [`Node`] wrappers to read
//! attributes, write markup and dispatch [`Event`]s, a [`Console`], and a
//! synchronous [`XmlHttpRequest`]. [`js::ScriptEnvironment`] exposes the same
//! surface to JavaScript running in QuickJS.

pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod event;
pub mod host;
pub mod js;
pub mod logging;
pub mod node;
pub mod registry;
pub mod session;
pub mod xhr;

pub use config::ShimConfig;
pub use console::Console;
pub use document::Document;
pub use error::ShimError;
pub use event::Event;
pub use host::{CallGate, GateBridge, Handle, HostBridge, HostCall};
pub use node::{Listener, Node};
pub use registry::{ListenerId, ListenerRegistry};
pub use session::Session;
pub use xhr::XmlHttpRequest;
