use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use typeahead_core::SearchListener;

const MAX_TEXT_ITEMS: usize = 20;

/// Prints every session transition to stdout, one line per event.
pub struct PrintListener {
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutputEvent<'a> {
    Loading,
    Results { count: usize, items: &'a [String] },
    Error { message: String },
}

impl PrintListener {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit(&self, event: &OutputEvent<'_>) {
        let line = if self.json {
            serde_json::to_string(event).unwrap_or_else(|err| {
                format!(r#"{{"event":"error","message":"unserializable event: {err}"}}"#)
            })
        } else {
            render_text(event)
        };
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }
}

impl SearchListener<String, std::io::Error> for PrintListener {
    fn on_loading(&self) {
        self.emit(&OutputEvent::Loading);
    }

    fn on_list_changed(&self, list: Arc<[String]>) {
        self.emit(&OutputEvent::Results {
            count: list.len(),
            items: &list,
        });
    }

    fn on_error(&self, error: std::io::Error) {
        self.emit(&OutputEvent::Error {
            message: error.to_string(),
        });
    }
}

fn render_text(event: &OutputEvent<'_>) -> String {
    match event {
        OutputEvent::Loading => "loading".to_string(),
        OutputEvent::Results { count, items } => {
            if items.is_empty() {
                return format!("results {count}");
            }
            let shown = items
                .iter()
                .take(MAX_TEXT_ITEMS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if items.len() > MAX_TEXT_ITEMS {
                format!("results {count}: {shown} (+{} more)", items.len() - MAX_TEXT_ITEMS)
            } else {
                format!("results {count}: {shown}")
            }
        }
        OutputEvent::Error { message } => format!("error: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_results_and_truncates_long_lists() {
        let items: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
        let line = render_text(&OutputEvent::Results {
            count: items.len(),
            items: &items,
        });
        assert!(line.starts_with("results 25: w0, w1"), "{line}");
        assert!(line.ends_with("w19 (+5 more)"), "{line}");

        let empty: Vec<String> = Vec::new();
        assert_eq!(
            render_text(&OutputEvent::Results {
                count: 0,
                items: &empty
            }),
            "results 0"
        );
    }

    #[test]
    fn json_events_are_tagged() {
        let items = vec!["rust".to_string()];
        let value = serde_json::to_value(OutputEvent::Results {
            count: 1,
            items: &items,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"event": "results", "count": 1, "items": ["rust"]})
        );
    }
}
