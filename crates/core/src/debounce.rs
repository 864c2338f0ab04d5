use crate::{
    config::SearchConfig, lookup::SharedLookup, session::SearchSession, Result, SessionError,
};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

/// Coalesces raw text changes into at most one search per quiet period.
///
/// Inputs shorter than [`SearchConfig::min_query_len`] never reach the
/// lookup; they clear the session instead.
#[derive(Clone)]
pub struct InputDebouncer {
    inner: Arc<InputDebouncerInner>,
}

struct InputDebouncerInner {
    command_tx: mpsc::UnboundedSender<DebounceCommand>,
}

enum DebounceCommand {
    TextChanged(String),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

impl InputDebouncer {
    /// Spawn the debounce loop feeding `session` with `lookup`.
    pub fn start<T, E>(
        session: SearchSession<T, E>,
        lookup: SharedLookup<T, E>,
        config: SearchConfig,
    ) -> Result<Self>
    where
        T: Clone + Send + Sync + 'static,
        E: Send + 'static,
    {
        config.validate()?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        spawn_debounce_loop(session, lookup, config, command_rx);
        Ok(Self {
            inner: Arc::new(InputDebouncerInner { command_tx }),
        })
    }

    /// Record a raw text change. Any armed trigger is cancelled first.
    pub fn text_changed(&self, text: impl Into<String>) -> Result<()> {
        self.send(DebounceCommand::TextChanged(text.into()))
    }

    /// Fire the armed trigger now instead of waiting out the quiet period.
    /// Resolves once the search (if any) has been handed to the session.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(DebounceCommand::Flush(tx))?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn shutdown(&self) {
        let _ = self.inner.command_tx.send(DebounceCommand::Shutdown);
    }

    fn send(&self, command: DebounceCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .map_err(|_| SessionError::Closed)
    }
}

impl Drop for InputDebouncer {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.send(DebounceCommand::Shutdown);
        }
    }
}

fn spawn_debounce_loop<T, E>(
    session: SearchSession<T, E>,
    lookup: SharedLookup<T, E>,
    config: SearchConfig,
    mut command_rx: mpsc::UnboundedReceiver<DebounceCommand>,
) where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    tokio::spawn(async move {
        let mut state = DebounceState::new(config);

        loop {
            let next_deadline = state.next_deadline();

            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(DebounceCommand::TextChanged(text)) => {
                        if state.record_text(text, Instant::now()) == TextDecision::Clear
                            && session.clear().is_err()
                        {
                            break;
                        }
                    }
                    Some(DebounceCommand::Flush(ack)) => {
                        let fired = state.take_pending();
                        let alive = fired.map_or(true, |text| fire(&session, &lookup, text));
                        let _ = ack.send(());
                        if !alive {
                            break;
                        }
                    }
                    Some(DebounceCommand::Shutdown) | None => break,
                },
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if next_deadline.is_some() => {
                    if let Some(text) = state.take_due(Instant::now()) {
                        if !fire(&session, &lookup, text) {
                            break;
                        }
                    }
                }
            }
        }

        debug!("input debouncer stopped");
    });
}

/// Hand `text` to the session. Returns false once the session is gone.
fn fire<T, E>(session: &SearchSession<T, E>, lookup: &SharedLookup<T, E>, text: String) -> bool
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    debug!("debounce elapsed, searching {text:?}");
    match session.search(text, Arc::clone(lookup)) {
        Ok(()) => true,
        Err(err) => {
            info!("search session unavailable, stopping debouncer: {err}");
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextDecision {
    /// A trigger is armed for the text.
    Armed,
    /// Text is under the minimum length; the visible list must be cleared.
    Clear,
}

/// Single pending-trigger slot. Arming always replaces the previous trigger.
struct DebounceState {
    debounce: Duration,
    min_query_len: usize,
    pending: Option<PendingTrigger>,
}

struct PendingTrigger {
    text: String,
    deadline: Instant,
}

impl DebounceState {
    const fn new(config: SearchConfig) -> Self {
        Self {
            debounce: config.debounce,
            min_query_len: config.min_query_len,
            pending: None,
        }
    }

    fn record_text(&mut self, text: String, now: Instant) -> TextDecision {
        self.pending = None;
        if text.chars().count() < self.min_query_len {
            return TextDecision::Clear;
        }
        self.pending = Some(PendingTrigger {
            text,
            deadline: now + self.debounce,
        });
        TextDecision::Armed
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    fn take_due(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.take_pending(),
            _ => None,
        }
    }

    fn take_pending(&mut self) -> Option<String> {
        self.pending.take().map(|p| p.text)
    }
}
