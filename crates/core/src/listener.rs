use std::sync::Arc;
use tokio::sync::mpsc;

/// Observer of a search session.
///
/// Called synchronously from the session loop, at most one callback per
/// transition. Implementations should return quickly.
pub trait SearchListener<T, E>: Send + Sync {
    fn on_loading(&self);

    fn on_list_changed(&self, list: Arc<[T]>);

    fn on_error(&self, error: E);
}

/// Discrete form of the listener callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent<T, E> {
    Loading,
    ListChanged(Arc<[T]>),
    Failed(E),
}

/// Listener that forwards every callback into an unbounded channel, for
/// consumers that prefer pulling events over implementing the trait.
pub struct ChannelListener<T, E> {
    tx: mpsc::UnboundedSender<SearchEvent<T, E>>,
}

impl<T, E> ChannelListener<T, E> {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SearchEvent<T, E>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: SearchEvent<T, E>) {
        // A dropped receiver means nobody is watching anymore.
        let _ = self.tx.send(event);
    }
}

impl<T, E> SearchListener<T, E> for ChannelListener<T, E>
where
    T: Send + Sync,
    E: Send,
{
    fn on_loading(&self) {
        self.emit(SearchEvent::Loading);
    }

    fn on_list_changed(&self, list: Arc<[T]>) {
        self.emit(SearchEvent::ListChanged(list));
    }

    fn on_error(&self, error: E) {
        self.emit(SearchEvent::Failed(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_listener_preserves_callback_order() {
        let (listener, mut rx) = ChannelListener::<u32, String>::new();
        listener.on_loading();
        listener.on_list_changed(Arc::from(vec![1, 2]));
        listener.on_error("boom".to_string());

        assert_eq!(rx.try_recv().ok(), Some(SearchEvent::Loading));
        assert_eq!(
            rx.try_recv().ok(),
            Some(SearchEvent::ListChanged(Arc::from(vec![1, 2])))
        );
        assert_eq!(
            rx.try_recv().ok(),
            Some(SearchEvent::Failed("boom".to_string()))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_listener_survives_dropped_receiver() {
        let (listener, rx) = ChannelListener::<u32, String>::new();
        drop(rx);
        listener.on_loading();
    }
}
