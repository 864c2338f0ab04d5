//! # Typeahead Core
//!
//! Search-as-you-type orchestration: debounced input, last-issued-wins
//! lookups, and a filter/sort view pipeline over the results.
//!
//! ## Flow
//!
//! ```text
//! text change
//!     │
//!     ├──> InputDebouncer (min length + quiet period)
//!     │      └─> SearchSession::search(text, lookup)
//!     │
//!     ├──> SearchGate (generation tickets)
//!     │      └─> superseded results dropped
//!     │
//!     └──> ListState (canonical / filtered / sorted)
//!            └─> SearchListener::on_list_changed(visible)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use typeahead_core::{
//!     lookup_fn, ChannelListener, InputDebouncer, SearchConfig, SearchSession, SharedLookup,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (listener, mut events) = ChannelListener::<String, std::io::Error>::new();
//!     let session: SearchSession<String, std::io::Error> = SearchSession::start(Arc::new(listener));
//!     let lookup: SharedLookup<String, std::io::Error> =
//!         Arc::new(lookup_fn(|query: String| async move { Ok::<_, std::io::Error>(vec![query]) }));
//!
//!     let input = InputDebouncer::start(session.clone(), lookup, SearchConfig::default())?;
//!     input.text_changed("rust")?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod cancel;
mod config;
mod debounce;
mod error;
mod listener;
mod lookup;
mod pipeline;
mod session;

pub use cancel::{SearchGate, SearchTicket};
pub use config::{SearchConfig, DEFAULT_DEBOUNCE, DEFAULT_MIN_QUERY_LEN};
pub use debounce::InputDebouncer;
pub use error::{Result, SessionError};
pub use listener::{ChannelListener, SearchEvent, SearchListener};
pub use lookup::{lookup_fn, Lookup, LookupFn, SharedLookup};
pub use pipeline::{derive_filtered, derive_sorted, Comparator, ListState, Transition};
pub use session::{SearchSession, SessionStatus};
