use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;
use typeahead_core::{
    lookup_fn, ChannelListener, InputDebouncer, SearchConfig, SearchEvent, SearchSession,
    SessionError, SharedLookup,
};

type Event = SearchEvent<String, String>;

struct Harness {
    session: SearchSession<String, String>,
    input: InputDebouncer,
    events: UnboundedReceiver<Event>,
    queries: Arc<Mutex<Vec<String>>>,
}

/// Lookup that records each query and answers after `latency`.
fn recording(queries: Arc<Mutex<Vec<String>>>, latency: Duration) -> SharedLookup<String, String> {
    Arc::new(lookup_fn(move |query: String| {
        let queries = Arc::clone(&queries);
        async move {
            queries.lock().unwrap().push(query.clone());
            sleep(latency).await;
            Ok::<_, String>(vec![format!("{query}-1"), format!("{query}-2")])
        }
    }))
}

fn harness(min_query_len: usize, debounce_ms: u64, latency: Duration) -> Harness {
    let (listener, events) = ChannelListener::new();
    let session: SearchSession<String, String> = SearchSession::start(Arc::new(listener));
    let queries = Arc::new(Mutex::new(Vec::new()));
    let config = SearchConfig::default()
        .with_min_query_len(min_query_len)
        .with_debounce(Duration::from_millis(debounce_ms));
    let input = InputDebouncer::start(
        session.clone(),
        recording(Arc::clone(&queries), latency),
        config,
    )
    .unwrap();
    Harness {
        session,
        input,
        events,
        queries,
    }
}

fn drain(events: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn list(items: &[&str]) -> Event {
    SearchEvent::ListChanged(items.iter().map(|s| (*s).to_string()).collect())
}

fn queries(h: &Harness) -> Vec<String> {
    h.queries.lock().unwrap().clone()
}

#[tokio::test(start_paused = true)]
async fn rapid_typing_issues_one_search_after_quiet_period() {
    let mut h = harness(3, 300, Duration::ZERO);

    h.input.text_changed("a").unwrap();
    sleep(Duration::from_millis(100)).await;
    h.input.text_changed("ab").unwrap();
    sleep(Duration::from_millis(100)).await;
    h.input.text_changed("abc").unwrap();

    sleep(Duration::from_millis(250)).await;
    assert!(queries(&h).is_empty());

    sleep(Duration::from_millis(100)).await;
    assert_eq!(queries(&h), vec!["abc".to_string()]);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(queries(&h), vec!["abc".to_string()]);
    assert_eq!(
        drain(&mut h.events),
        vec![
            list(&[]),
            list(&[]),
            SearchEvent::Loading,
            list(&["abc-1", "abc-2"]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn input_below_minimum_never_searches() {
    let mut h = harness(3, 300, Duration::ZERO);

    h.input.text_changed("ab").unwrap();
    sleep(Duration::from_secs(2)).await;

    assert!(queries(&h).is_empty());
    assert_eq!(drain(&mut h.events), vec![list(&[])]);
}

#[tokio::test(start_paused = true)]
async fn shortening_input_cancels_armed_trigger() {
    let mut h = harness(3, 300, Duration::ZERO);

    h.input.text_changed("abcd").unwrap();
    sleep(Duration::from_millis(100)).await;
    h.input.text_changed("ab").unwrap();
    sleep(Duration::from_secs(2)).await;

    assert!(queries(&h).is_empty());
    assert_eq!(drain(&mut h.events), vec![list(&[])]);
}

#[tokio::test(start_paused = true)]
async fn clearing_input_discards_in_flight_results() {
    let mut h = harness(3, 300, Duration::from_millis(500));

    h.input.text_changed("rust").unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(queries(&h), vec!["rust".to_string()]);

    h.input.text_changed("r").unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(
        drain(&mut h.events),
        vec![SearchEvent::Loading, list(&[])]
    );
    assert!(h.session.snapshot().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn flush_fires_pending_trigger_once() {
    let mut h = harness(3, 300, Duration::ZERO);

    h.input.text_changed("hello").unwrap();
    h.input.flush().await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(queries(&h), vec!["hello".to_string()]);
    assert_eq!(
        drain(&mut h.events),
        vec![SearchEvent::Loading, list(&["hello-1", "hello-2"])]
    );
}

#[tokio::test(start_paused = true)]
async fn flush_without_pending_text_is_a_no_op() {
    let mut h = harness(3, 300, Duration::ZERO);

    h.input.flush().await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert!(queries(&h).is_empty());
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn debouncer_reports_closed_after_shutdown() {
    let h = harness(3, 300, Duration::ZERO);

    h.input.shutdown();
    sleep(Duration::from_millis(10)).await;

    assert!(matches!(
        h.input.text_changed("abc"),
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn rejects_invalid_config() {
    let (listener, _events) = ChannelListener::new();
    let session: SearchSession<String, String> = SearchSession::start(Arc::new(listener));
    let config = SearchConfig::default().with_debounce(Duration::ZERO);

    let result = InputDebouncer::start(
        session,
        recording(Arc::new(Mutex::new(Vec::new())), Duration::ZERO),
        config,
    );
    assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
}
