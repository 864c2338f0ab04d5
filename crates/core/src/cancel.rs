use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues search tickets tagged with a monotonically increasing generation.
///
/// Only the most recently issued ticket is live. Starting a new search marks
/// every earlier ticket superseded without touching the work behind it: the
/// lookup keeps running, its result is simply dropped on arrival.
#[derive(Debug, Clone, Default)]
pub struct SearchGate {
    latest: Arc<AtomicU64>,
}

/// Ownership token for one issued search.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl SearchGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding whatever was issued before it.
    pub fn start(&self) -> SearchTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        SearchTicket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Supersede `ticket` if it is still the live one. Older tickets are
    /// already superseded, so this never affects a newer search.
    pub fn cancel(&self, ticket: &SearchTicket) {
        let _ = self.latest.compare_exchange(
            ticket.generation,
            ticket.generation + 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Supersede every ticket issued so far.
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

impl SearchTicket {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.generation
    }

    /// Drive `fut` to completion and hand back its output only if this ticket
    /// is still live once it resolves.
    pub async fn guard<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        let output = fut.await;
        (!self.is_superseded()).then_some(output)
    }
}
