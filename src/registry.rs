use std::collections::HashMap;

use crate::host::Handle;

/// Identifies one registration so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

struct Registration<L> {
    id: ListenerId,
    listener: L,
}

/// Listeners keyed by handle, then by event type, in registration order.
///
/// Keyed by handle value rather than by wrapper, so every wrapper around the
/// same handle sees the same listeners. Entries are only dropped by
/// [`ListenerRegistry::remove`] or [`ListenerRegistry::clear`].
pub struct ListenerRegistry<L> {
    entries: HashMap<Handle, HashMap<String, Vec<Registration<L>>>>,
    next_id: u64,
}

impl<L> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<L: Clone> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener`. Duplicates are kept and each one fires.
    pub fn add(&mut self, handle: &Handle, event_type: &str, listener: L) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries
            .entry(handle.clone())
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(Registration { id, listener });
        id
    }

    /// Remove a single registration. Returns whether it was present.
    pub fn remove(&mut self, handle: &Handle, event_type: &str, id: ListenerId) -> bool {
        let Some(list) = self
            .entries
            .get_mut(handle)
            .and_then(|by_type| by_type.get_mut(event_type))
        else {
            return false;
        };
        let before = list.len();
        list.retain(|registration| registration.id != id);
        before != list.len()
    }

    /// Copy of the listeners for `handle`/`event_type` as they stand now.
    ///
    /// Dispatch iterates this copy, so registrations made or removed while it
    /// runs only take effect for the next dispatch.
    pub fn snapshot(&self, handle: &Handle, event_type: &str) -> Vec<L> {
        self.registrations(handle, event_type)
            .map(|registration| registration.listener.clone())
            .collect()
    }

    pub fn ids(&self, handle: &Handle, event_type: &str) -> Vec<ListenerId> {
        self.registrations(handle, event_type)
            .map(|registration| registration.id)
            .collect()
    }

    fn registrations(
        &self,
        handle: &Handle,
        event_type: &str,
    ) -> impl Iterator<Item = &Registration<L>> {
        self.entries
            .get(handle)
            .and_then(|by_type| by_type.get(event_type))
            .into_iter()
            .flatten()
    }

    /// True if any handle has a listener for `event_type`.
    pub fn is_listening(&self, event_type: &str) -> bool {
        self.entries.values().any(|by_type| {
            by_type
                .get(event_type)
                .is_some_and(|list| !list.is_empty())
        })
    }

    /// Total number of registrations across all handles and types.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration, handing the listeners back so the caller
    /// decides when their destructors run.
    pub fn clear(&mut self) -> Vec<L> {
        self.entries
            .drain()
            .flat_map(|(_, by_type)| by_type.into_values())
            .flatten()
            .map(|registration| registration.listener)
            .collect()
    }
}
