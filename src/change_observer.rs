use tokio::sync::broadcast;

/// `RecvError::Lagged` only means several changes were coalesced.
pub trait ChangeObserver {
    fn observe(&self) -> broadcast::Receiver<()>;
}

pub(crate) struct ChangeNotifier {
    sender: broadcast::Sender<()>,
}

impl ChangeNotifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    pub(crate) fn notify(&self) {
        // No receivers is not an error for a store nobody observes.
        let _ = self.sender.send(());
    }
}
