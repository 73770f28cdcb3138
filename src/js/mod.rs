//! QuickJS embedding of the shim.

pub mod environment;
pub mod runtime;

pub use environment::ScriptEnvironment;
pub use runtime::QuickJsEngine;
