use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// The caller-supplied search backend.
///
/// The session never inspects the error type; failures are forwarded to the
/// listener exactly as returned.
#[async_trait]
pub trait Lookup<T>: Send + Sync {
    type Error: Send + 'static;

    async fn lookup(&self, query: &str) -> Result<Vec<T>, Self::Error>;
}

pub type SharedLookup<T, E> = Arc<dyn Lookup<T, Error = E>>;

/// Adapter turning an async closure into a [`Lookup`].
pub struct LookupFn<F> {
    f: F,
}

/// Wrap `f` so it can be handed to a session.
///
/// ```
/// use std::sync::Arc;
/// use typeahead_core::{lookup_fn, SharedLookup};
///
/// let words: SharedLookup<String, std::io::Error> = Arc::new(lookup_fn(|query: String| async move {
///     Ok::<_, std::io::Error>(vec![query.to_uppercase()])
/// }));
/// # let _ = words;
/// ```
pub const fn lookup_fn<F>(f: F) -> LookupFn<F> {
    LookupFn { f }
}

#[async_trait]
impl<T, E, F, Fut> Lookup<T> for LookupFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, E>> + Send,
    T: Send + 'static,
    E: Send + 'static,
{
    type Error = E;

    async fn lookup(&self, query: &str) -> Result<Vec<T>, E> {
        (self.f)(query.to_string()).await
    }
}
