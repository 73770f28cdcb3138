use std::fmt::Display;
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::host::HostBridge;

/// `console` for scripts. Messages go to the host's `log` operation.
#[derive(Clone)]
pub struct Console {
    bridge: Rc<dyn HostBridge>,
}

impl Console {
    pub(crate) fn new(bridge: Rc<dyn HostBridge>) -> Self {
        Self { bridge }
    }

    pub fn log(&self, message: impl Display) -> Result<()> {
        let message = message.to_string();
        debug!(target: "scriptshim", message = %message, "console.log");
        self.bridge.log(&message)
    }
}
