//! The synchronous call gate between scripts and the host environment.
//!
//! Every effect the shim has goes through a [`HostBridge`]. Hosts that only
//! expose a single `name, args -> value` entry point implement [`CallGate`]
//! instead and wrap it in a [`GateBridge`], which speaks the wire protocol:
//!
//! | Operation             | Args (ordered)        | Returns            |
//! |-----------------------|-----------------------|--------------------|
//! | `log`                 | message               | nothing            |
//! | `querySelectorAll`    | selector              | array of handles   |
//! | `getAttribute`        | handle, attrName      | string or null     |
//! | `innerHTML_set`       | handle, htmlString    | nothing            |
//! | `XMLHttpRequest_send` | method, url, body     | response text      |

use std::fmt;
use std::rc::Rc;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{error, trace};

use crate::error::{Result, ShimError};

/// Opaque token naming a node that lives in the host.
///
/// The shim never looks inside a handle; it only hashes it for the listener
/// registry and threads it back through bridge calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Handle {
    Index(i64),
    Token(String),
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Index(index) => write!(f, "{index}"),
            Handle::Token(token) => f.write_str(token),
        }
    }
}

impl From<i32> for Handle {
    fn from(index: i32) -> Self {
        Handle::Index(i64::from(index))
    }
}

impl From<i64> for Handle {
    fn from(index: i64) -> Self {
        Handle::Index(index)
    }
}

impl From<&str> for Handle {
    fn from(token: &str) -> Self {
        Handle::Token(token.to_string())
    }
}

impl From<String> for Handle {
    fn from(token: String) -> Self {
        Handle::Token(token)
    }
}

/// The five operations a host has to provide.
pub trait HostBridge {
    fn log(&self, message: &str) -> Result<()>;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Handle>>;

    fn get_attribute(&self, handle: &Handle, name: &str) -> Result<Option<String>>;

    /// `html` has already been coerced to a string by the caller.
    fn set_inner_html(&self, handle: &Handle, html: &str) -> Result<()>;

    fn xhr_send(&self, method: &str, url: &str, body: Option<&str>) -> Result<String>;
}

impl<B: HostBridge + ?Sized> HostBridge for Rc<B> {
    fn log(&self, message: &str) -> Result<()> {
        (**self).log(message)
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Handle>> {
        (**self).query_selector_all(selector)
    }

    fn get_attribute(&self, handle: &Handle, name: &str) -> Result<Option<String>> {
        (**self).get_attribute(handle, name)
    }

    fn set_inner_html(&self, handle: &Handle, html: &str) -> Result<()> {
        (**self).set_inner_html(handle, html)
    }

    fn xhr_send(&self, method: &str, url: &str, body: Option<&str>) -> Result<String> {
        (**self).xhr_send(method, url, body)
    }
}

/// One bridge operation together with its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Log {
        message: String,
    },
    QuerySelectorAll {
        selector: String,
    },
    GetAttribute {
        handle: Handle,
        name: String,
    },
    InnerHtmlSet {
        handle: Handle,
        html: String,
    },
    XmlHttpRequestSend {
        method: String,
        url: String,
        body: Option<String>,
    },
}

impl HostCall {
    /// Operation name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            HostCall::Log { .. } => "log",
            HostCall::QuerySelectorAll { .. } => "querySelectorAll",
            HostCall::GetAttribute { .. } => "getAttribute",
            HostCall::InnerHtmlSet { .. } => "innerHTML_set",
            HostCall::XmlHttpRequestSend { .. } => "XMLHttpRequest_send",
        }
    }

    /// Positional arguments in wire order.
    pub fn args(&self) -> Vec<JsonValue> {
        match self {
            HostCall::Log { message } => vec![JsonValue::from(message.as_str())],
            HostCall::QuerySelectorAll { selector } => vec![JsonValue::from(selector.as_str())],
            HostCall::GetAttribute { handle, name } => {
                vec![handle_to_json(handle), JsonValue::from(name.as_str())]
            }
            HostCall::InnerHtmlSet { handle, html } => {
                vec![handle_to_json(handle), JsonValue::from(html.as_str())]
            }
            HostCall::XmlHttpRequestSend { method, url, body } => vec![
                JsonValue::from(method.as_str()),
                JsonValue::from(url.as_str()),
                body.as_deref().map_or(JsonValue::Null, JsonValue::from),
            ],
        }
    }

    /// Rebuild a call from its wire form. Hosts use this to decode what a
    /// [`GateBridge`] sent them.
    pub fn from_wire(name: &str, args: &[JsonValue]) -> anyhow::Result<Self> {
        let string_arg = |index: usize| -> anyhow::Result<String> {
            args.get(index)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("`{name}` expects a string at position {index}"))
        };
        let handle_arg = |index: usize| -> anyhow::Result<Handle> {
            let value = args
                .get(index)
                .ok_or_else(|| anyhow!("`{name}` expects a handle at position {index}"))?;
            Ok(serde_json::from_value(value.clone())?)
        };

        let call = match name {
            "log" => HostCall::Log {
                message: string_arg(0)?,
            },
            "querySelectorAll" => HostCall::QuerySelectorAll {
                selector: string_arg(0)?,
            },
            "getAttribute" => HostCall::GetAttribute {
                handle: handle_arg(0)?,
                name: string_arg(1)?,
            },
            "innerHTML_set" => HostCall::InnerHtmlSet {
                handle: handle_arg(0)?,
                html: string_arg(1)?,
            },
            "XMLHttpRequest_send" => HostCall::XmlHttpRequestSend {
                method: string_arg(0)?,
                url: string_arg(1)?,
                body: args.get(2).and_then(JsonValue::as_str).map(str::to_string),
            },
            other => return Err(anyhow!("unknown host operation `{other}`")),
        };
        Ok(call)
    }
}

fn handle_to_json(handle: &Handle) -> JsonValue {
    match handle {
        Handle::Index(index) => JsonValue::from(*index),
        Handle::Token(token) => JsonValue::from(token.as_str()),
    }
}

/// A host reachable through one synchronous entry point.
pub trait CallGate {
    fn call(&self, name: &str, args: Vec<JsonValue>) -> anyhow::Result<JsonValue>;
}

impl<F> CallGate for F
where
    F: Fn(&str, Vec<JsonValue>) -> anyhow::Result<JsonValue>,
{
    fn call(&self, name: &str, args: Vec<JsonValue>) -> anyhow::Result<JsonValue> {
        self(name, args)
    }
}

/// Adapts a [`CallGate`] to [`HostBridge`] by encoding each operation with its
/// wire name and positional arguments and decoding the reply.
pub struct GateBridge<G> {
    gate: G,
}

impl<G: CallGate> GateBridge<G> {
    pub fn new(gate: G) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    fn invoke(&self, call: HostCall) -> Result<JsonValue> {
        let operation = call.name();
        trace!(target: "scriptshim", operation, "host call");
        self.gate.call(operation, call.args()).map_err(|err| {
            error!(target: "scriptshim", operation, error = %err, "host call failed");
            ShimError::host_call(operation, err)
        })
    }
}

impl<G: CallGate> HostBridge for GateBridge<G> {
    fn log(&self, message: &str) -> Result<()> {
        self.invoke(HostCall::Log {
            message: message.to_string(),
        })?;
        Ok(())
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Handle>> {
        let reply = self.invoke(HostCall::QuerySelectorAll {
            selector: selector.to_string(),
        })?;
        serde_json::from_value(reply)
            .map_err(|err| ShimError::host_call("querySelectorAll", err))
    }

    fn get_attribute(&self, handle: &Handle, name: &str) -> Result<Option<String>> {
        let reply = self.invoke(HostCall::GetAttribute {
            handle: handle.clone(),
            name: name.to_string(),
        })?;
        match reply {
            JsonValue::Null => Ok(None),
            JsonValue::String(value) => Ok(Some(value)),
            other => Err(ShimError::host_call(
                "getAttribute",
                anyhow!("expected string or null, got {other}"),
            )),
        }
    }

    fn set_inner_html(&self, handle: &Handle, html: &str) -> Result<()> {
        self.invoke(HostCall::InnerHtmlSet {
            handle: handle.clone(),
            html: html.to_string(),
        })?;
        Ok(())
    }

    fn xhr_send(&self, method: &str, url: &str, body: Option<&str>) -> Result<String> {
        let reply = self.invoke(HostCall::XmlHttpRequestSend {
            method: method.to_string(),
            url: url.to_string(),
            body: body.map(str::to_string),
        })?;
        match reply {
            JsonValue::String(text) => Ok(text),
            other => Err(ShimError::host_call(
                "XMLHttpRequest_send",
                anyhow!("expected response text, got {other}"),
            )),
        }
    }
}
