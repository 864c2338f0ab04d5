use crate::{
    cancel::{SearchGate, SearchTicket},
    lookup::SharedLookup,
    pipeline::{Comparator, ListState, Transition},
    listener::SearchListener,
    Result, SessionError,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Where the session is in its `Idle -> Loading -> {Ready, Failed}` cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Loading { query: String, generation: u64 },
    Ready { query: String, len: usize },
    Failed { query: String },
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send>;

enum SessionCommand<T, E> {
    Search {
        query: String,
        lookup: SharedLookup<T, E>,
    },
    Replay,
    Clear,
    Filter(Predicate<T>),
    Sort(Comparator<T>),
    RemoveFilter,
    RemoveSort,
    Snapshot(oneshot::Sender<Arc<[T]>>),
    Shutdown,
}

struct Completion<T, E> {
    ticket: SearchTicket,
    query: String,
    lookup: SharedLookup<T, E>,
    outcome: std::result::Result<Vec<T>, E>,
}

struct LastSearch<T, E> {
    query: String,
    lookup: SharedLookup<T, E>,
}

/// Handle to a running search session.
///
/// All operations are fire-and-notify: they enqueue a command for the
/// session loop and return immediately, and their effect is observed through
/// the [`SearchListener`]. Commands are applied in the order they were sent.
/// The loop stops once the last handle is dropped.
pub struct SearchSession<T, E> {
    inner: Arc<SearchSessionInner<T, E>>,
}

struct SearchSessionInner<T, E> {
    command_tx: mpsc::UnboundedSender<SessionCommand<T, E>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
}

impl<T, E> Clone for SearchSession<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> SearchSession<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Spawn the session loop on the current tokio runtime.
    pub fn start(listener: Arc<dyn SearchListener<T, E>>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        let status_tx = Arc::new(status_tx);

        spawn_session_loop(listener, command_rx, Arc::clone(&status_tx));

        Self {
            inner: Arc::new(SearchSessionInner {
                command_tx,
                status_tx,
            }),
        }
    }

    /// Emit `loading`, supersede any in-flight search and look `text` up.
    pub fn search(&self, text: impl Into<String>, lookup: SharedLookup<T, E>) -> Result<()> {
        self.send(SessionCommand::Search {
            query: text.into(),
            lookup,
        })
    }

    /// Re-run the last successful search. No-op if there was none.
    pub fn replay_last_search(&self) -> Result<()> {
        self.send(SessionCommand::Replay)
    }

    /// Supersede any in-flight search and empty every list.
    pub fn clear(&self) -> Result<()> {
        self.send(SessionCommand::Clear)
    }

    pub fn filter_list<P>(&self, predicate: P) -> Result<()>
    where
        P: Fn(&T) -> bool + Send + 'static,
    {
        self.send(SessionCommand::Filter(Box::new(predicate)))
    }

    pub fn sort_list<C>(&self, comparator: C) -> Result<()>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.send(SessionCommand::Sort(Arc::new(comparator)))
    }

    pub fn remove_filter(&self) -> Result<()> {
        self.send(SessionCommand::RemoveFilter)
    }

    pub fn remove_sort(&self) -> Result<()> {
        self.send(SessionCommand::RemoveSort)
    }

    /// The list most recently pushed to the listener, once every command
    /// sent before this call has been applied.
    pub async fn snapshot(&self) -> Result<Arc<[T]>> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(tx))?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.status_tx.subscribe().borrow().clone()
    }

    #[must_use]
    pub fn status_stream(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Stop the session loop. Results of in-flight lookups are discarded.
    pub fn shutdown(&self) {
        let _ = self.inner.command_tx.send(SessionCommand::Shutdown);
    }

    fn send(&self, command: SessionCommand<T, E>) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .map_err(|_| SessionError::Closed)
    }
}

impl<T, E> Drop for SearchSession<T, E> {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.send(SessionCommand::Shutdown);
        }
    }
}

fn spawn_session_loop<T, E>(
    listener: Arc<dyn SearchListener<T, E>>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand<T, E>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
) where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    tokio::spawn(async move {
        let (completion_tx, mut completion_rx) = mpsc::unbounded_channel();
        let mut core = SessionCore::new(listener, status_tx, completion_tx);
        info!("search session started");

        loop {
            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => core.handle(cmd),
                },
                Some(done) = completion_rx.recv() => core.complete(done),
            }
        }

        core.gate.cancel_all();
        info!("search session stopped");
    });
}

/// State owned by the session loop. Every mutation happens here, one
/// command or completion at a time.
struct SessionCore<T, E> {
    lists: ListState<T>,
    visible: Arc<[T]>,
    last_search: Option<LastSearch<T, E>>,
    gate: SearchGate,
    pending: Option<SearchTicket>,
    listener: Arc<dyn SearchListener<T, E>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    completion_tx: mpsc::UnboundedSender<Completion<T, E>>,
}

impl<T, E> SessionCore<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    fn new(
        listener: Arc<dyn SearchListener<T, E>>,
        status_tx: Arc<watch::Sender<SessionStatus>>,
        completion_tx: mpsc::UnboundedSender<Completion<T, E>>,
    ) -> Self {
        let lists = ListState::empty();
        Self {
            visible: Arc::clone(lists.canonical()),
            lists,
            last_search: None,
            gate: SearchGate::new(),
            pending: None,
            listener,
            status_tx,
            completion_tx,
        }
    }

    fn handle(&mut self, cmd: SessionCommand<T, E>) {
        match cmd {
            SessionCommand::Search { query, lookup } => self.begin_search(query, lookup),
            SessionCommand::Replay => self.replay(),
            SessionCommand::Clear => self.clear(),
            SessionCommand::Filter(predicate) => {
                let transition = self.lists.filter(predicate.as_ref());
                self.apply(transition);
            }
            SessionCommand::Sort(comparator) => {
                let transition = self.lists.sort(comparator);
                self.apply(transition);
            }
            SessionCommand::RemoveFilter => {
                let transition = self.lists.remove_filter();
                self.apply(transition);
            }
            SessionCommand::RemoveSort => {
                let transition = self.lists.remove_sort();
                self.apply(transition);
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(Arc::clone(&self.visible));
            }
            // Intercepted by the loop before reaching here.
            SessionCommand::Shutdown => {}
        }
    }

    fn begin_search(&mut self, query: String, lookup: SharedLookup<T, E>) {
        self.listener.on_loading();

        if let Some(previous) = self.pending.take() {
            debug!(
                "search #{} superseded before resolving",
                previous.generation()
            );
        }
        let ticket = self.gate.start();
        debug!("issuing search #{} for {query:?}", ticket.generation());
        self.status_tx.send_replace(SessionStatus::Loading {
            query: query.clone(),
            generation: ticket.generation(),
        });
        self.pending = Some(ticket.clone());

        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let Some(outcome) = ticket.guard(lookup.lookup(&query)).await else {
                debug!("dropping result of superseded search #{}", ticket.generation());
                return;
            };
            let _ = completion_tx.send(Completion {
                ticket,
                query,
                lookup,
                outcome,
            });
        });
    }

    fn complete(&mut self, done: Completion<T, E>) {
        // A newer search may have been issued after the lookup task checked
        // its ticket but before this completion was dequeued.
        if done.ticket.is_superseded() {
            debug!(
                "dropping result of superseded search #{}",
                done.ticket.generation()
            );
            return;
        }
        self.pending = None;

        match done.outcome {
            Ok(items) => {
                self.lists = ListState::with_canonical(items);
                self.visible = Arc::clone(self.lists.canonical());
                debug!(
                    "search #{} for {:?} returned {} items",
                    done.ticket.generation(),
                    done.query,
                    self.visible.len()
                );
                self.status_tx.send_replace(SessionStatus::Ready {
                    query: done.query.clone(),
                    len: self.visible.len(),
                });
                self.last_search = Some(LastSearch {
                    query: done.query,
                    lookup: done.lookup,
                });
                self.listener.on_list_changed(Arc::clone(&self.visible));
            }
            Err(err) => {
                warn!(
                    "search #{} for {:?} failed",
                    done.ticket.generation(),
                    done.query
                );
                self.status_tx
                    .send_replace(SessionStatus::Failed { query: done.query });
                self.listener.on_error(err);
            }
        }
    }

    fn replay(&mut self) {
        let Some(last) = &self.last_search else {
            debug!("replay requested with no previous search");
            return;
        };
        let (query, lookup) = (last.query.clone(), Arc::clone(&last.lookup));
        self.begin_search(query, lookup);
    }

    fn clear(&mut self) {
        if let Some(ticket) = self.pending.take() {
            debug!("clear supersedes search #{}", ticket.generation());
        }
        self.gate.cancel_all();
        self.lists = ListState::empty();
        self.visible = Arc::clone(self.lists.canonical());
        self.status_tx.send_replace(SessionStatus::Idle);
        self.listener.on_list_changed(Arc::clone(&self.visible));
    }

    fn apply(&mut self, transition: Transition<T>) {
        self.lists = transition.state;
        self.visible = transition.visible;
        self.listener.on_list_changed(Arc::clone(&self.visible));
    }
}
