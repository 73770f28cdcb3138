use std::rc::Rc;

use crate::error::Result;
use crate::node::Node;
use crate::session::SessionScope;

/// `document` for scripts: node lookup by selector, answered by the host.
#[derive(Clone)]
pub struct Document {
    scope: Rc<SessionScope>,
}

impl Document {
    pub(crate) fn new(scope: Rc<SessionScope>) -> Self {
        Self { scope }
    }

    /// One fresh wrapper per handle the host returns, in the host's order.
    /// Nothing is cached, so repeated queries give new wrappers over the same
    /// handles.
    pub fn query(&self, selector: &str) -> Result<Vec<Node>> {
        let handles = self.scope.bridge.query_selector_all(selector)?;
        Ok(handles
            .into_iter()
            .map(|handle| Node::new(handle, Rc::clone(&self.scope)))
            .collect())
    }
}
