use anyhow::{anyhow, bail, Result};
use std::cmp::Ordering;

/// One line of harness input: either raw text for the search box, or a
/// `:`-prefixed pipeline command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    Filter(String),
    Sort(SortKey),
    Unfilter,
    Unsort,
    Replay,
    Flush,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Asc,
    Desc,
    Len,
}

impl SortKey {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Asc => a.cmp(b),
            Self::Desc => b.cmp(a),
            Self::Len => a.chars().count().cmp(&b.chars().count()),
        }
    }
}

pub fn parse_line(raw: &str) -> Result<Line> {
    let Some(command) = raw.strip_prefix(':') else {
        return Ok(Line::Text(raw.to_string()));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    let line = match name {
        "filter" => {
            if arg.is_empty() {
                bail!(":filter needs a substring");
            }
            Line::Filter(arg.to_string())
        }
        "sort" => Line::Sort(match arg {
            "" | "asc" => SortKey::Asc,
            "desc" => SortKey::Desc,
            "len" => SortKey::Len,
            other => return Err(anyhow!("unknown sort key {other:?} (expected asc|desc|len)")),
        }),
        "unfilter" => Line::Unfilter,
        "unsort" => Line::Unsort,
        "replay" => Line::Replay,
        "flush" => Line::Flush,
        "quit" | "q" => Line::Quit,
        other => bail!("unknown command :{other}"),
    };
    Ok(line)
}
