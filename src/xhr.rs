use std::rc::Rc;

use crate::error::{Result, ShimError};
use crate::host::HostBridge;

/// Synchronous-only `XMLHttpRequest`.
///
/// `open` records the target and `send` performs exactly one host call. There
/// is no status, header or ready-state tracking.
pub struct XmlHttpRequest {
    bridge: Rc<dyn HostBridge>,
    target: Option<(String, String)>,
    response_text: Option<String>,
}

impl XmlHttpRequest {
    pub(crate) fn new(bridge: Rc<dyn HostBridge>) -> Self {
        Self {
            bridge,
            target: None,
            response_text: None,
        }
    }

    /// Fails with [`ShimError::UnsupportedOperation`] when `is_async` is set,
    /// without touching the host.
    pub fn open(&mut self, method: &str, url: &str, is_async: bool) -> Result<()> {
        if is_async {
            return Err(ShimError::unsupported("Asynchronous XHR"));
        }
        self.target = Some((method.to_string(), url.to_string()));
        Ok(())
    }

    pub fn send(&mut self, body: Option<&str>) -> Result<()> {
        let Some((method, url)) = self.target.as_ref() else {
            return Err(ShimError::unsupported("XMLHttpRequest.send before open"));
        };
        let text = self.bridge.xhr_send(method, url, body)?;
        self.response_text = Some(text);
        Ok(())
    }

    pub fn method(&self) -> Option<&str> {
        self.target.as_ref().map(|(method, _)| method.as_str())
    }

    pub fn url(&self) -> Option<&str> {
        self.target.as_ref().map(|(_, url)| url.as_str())
    }

    pub fn response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }
}
