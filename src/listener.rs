use std::sync::{Arc, Weak};

use parking_lot::Mutex;

pub(crate) type Listener = Arc<dyn Fn() + Send + Sync + 'static>;

// Notification runs over a snapshot taken when the pass starts.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Mutex<ListenersInner>,
}

#[derive(Default)]
struct ListenersInner {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> u64 {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|(entry, _)| *entry != id);
        inner.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    pub(crate) fn notify(&self) {
        for listener in self.snapshot() {
            listener();
        }
    }
}

/// Dropping the handle without calling `unsubscribe` keeps the listener.
pub struct Unsubscribe {
    listeners: Weak<Listeners>,
    id: u64,
    label: Arc<str>,
}

impl Unsubscribe {
    pub(crate) fn new(listeners: &Arc<Listeners>, id: u64, label: Arc<str>) -> Self {
        Self {
            listeners: Arc::downgrade(listeners),
            id,
            label,
        }
    }

    pub fn unsubscribe(self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        if listeners.remove(self.id) {
            log::debug!("[{}] listener {} unsubscribed", self.label, self.id);
        }
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id)
            .field("store", &self.label)
            .finish()
    }
}
