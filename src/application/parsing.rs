//! # Parsing Utils
//!
//! Utilities for parsing LLM responses, specifically extracting structured actions
//! (`AgentAction`) from the raw text output.
//!
//! Two independent passes run over the finished response:
//! 1. Tag markup (`<create_file>`, `<execute_command>`, `<create_directory>`,
//!    `<modify_file>`, `<read_file>`). The earliest match of any shape is taken,
//!    then the search resumes after it, so markup inside an action's fields is
//!    content and never becomes an action of its own.
//! 2. Fenced JSON blocks describing files to create. These follow the tag matches,
//!    in document order. A fence inside a tag action's content belongs to that
//!    content and is not read.
//!
//! Malformed or missing markup is not an error; it simply yields fewer actions.

use crate::domain::types::AgentAction;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::ops::Range;
use std::sync::LazyLock;

static CREATE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<create_file>\s*<path>(.*?)</path>\s*<content>(.*?)</content>\s*</create_file>")
        .expect("create_file pattern")
});

static EXECUTE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<execute_command>\s*<command>(.*?)</command>(?:\s*<description>(.*?)</description>)?\s*</execute_command>",
    )
    .expect("execute_command pattern")
});

static CREATE_DIRECTORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<create_directory>\s*<path>(.*?)</path>\s*</create_directory>")
        .expect("create_directory pattern")
});

static MODIFY_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<modify_file>\s*<path>(.*?)</path>\s*<search>(.*?)</search>\s*<replace>(.*?)</replace>\s*</modify_file>",
    )
    .expect("modify_file pattern")
});

static READ_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<read_file>\s*<path>(.*?)</path>\s*</read_file>").expect("read_file pattern")
});

// ```json {...} ``` or ``` [...] ```
static JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\}|\[.*?\])\s*```").expect("json block pattern")
});

/// Top-level keys probed in a JSON object, in this order.
const JSON_SINGLE_KEY: &str = "create_file";
const JSON_LIST_KEYS: [&str; 2] = ["create_files", "files"];

type Build = fn(&Captures<'_>) -> AgentAction;

/// Every tag shape with the constructor for its captures.
static SHAPES: [(&LazyLock<Regex>, Build); 5] = [
    (&CREATE_FILE, |caps| AgentAction::CreateFile {
        path: field(caps, 1),
        content: field(caps, 2),
    }),
    (&EXECUTE_COMMAND, |caps| {
        let description = field(caps, 2);
        AgentAction::ExecuteCommand {
            command: field(caps, 1),
            description: (!description.is_empty()).then_some(description),
        }
    }),
    (&CREATE_DIRECTORY, |caps| AgentAction::CreateDirectory {
        path: field(caps, 1),
    }),
    (&MODIFY_FILE, |caps| AgentAction::ModifyFile {
        path: field(caps, 1),
        search: field(caps, 2),
        replace: field(caps, 3),
    }),
    (&READ_FILE, |caps| AgentAction::ReadFile {
        path: field(caps, 1),
    }),
];

/// Extracts every recognised action from `response`, in a deterministic order.
pub fn extract(response: &str) -> Vec<AgentAction> {
    let (mut actions, spans) = tag_actions(response);

    actions.extend(json_actions(response, &spans));

    if actions.is_empty() && response.contains("<create_file") {
        tracing::warn!("Potential unparsed action markup in response");
    }

    actions
}

/// Tag actions in document order, with the span each one claims.
///
/// Every shape is searched again from the end of the last kept match, so a
/// match that started inside that span (a partial tag quoted in content) does
/// not hide a complete element further on.
fn tag_actions(response: &str) -> (Vec<AgentAction>, Vec<Range<usize>>) {
    let mut actions = Vec::new();
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < response.len() {
        let next = SHAPES
            .iter()
            .filter_map(|(regex, build)| {
                let caps = regex.captures_at(response, pos)?;
                let whole = caps.get(0)?;
                Some((whole.range(), caps, *build))
            })
            .min_by_key(|(span, _, _)| span.start);

        let Some((span, caps, build)) = next else {
            break;
        };
        let action = build(&caps);
        tracing::debug!(kind = action.kind(), offset = span.start, "Matched action markup");
        pos = span.end;
        spans.push(span);
        actions.push(action);
    }

    (actions, spans)
}

/// Trimmed capture group, empty when the group did not participate.
fn field(caps: &Captures<'_>, group: usize) -> String {
    caps.get(group)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// JSON file blocks outside of `taken`, the spans already claimed by tag actions.
fn json_actions(response: &str, taken: &[Range<usize>]) -> Vec<AgentAction> {
    let mut actions = Vec::new();
    for caps in JSON_BLOCK.captures_iter(response) {
        let Some(body) = caps.get(1) else { continue };
        if taken.iter().any(|span| span.contains(&body.start())) {
            continue;
        }
        match serde_json::from_str::<Value>(body.as_str().trim()) {
            Ok(value) => collect_json(&value, &mut actions),
            Err(e) => tracing::debug!(error = %e, "Fenced block is not JSON, ignoring"),
        }
    }
    actions
}

fn collect_json(value: &Value, out: &mut Vec<AgentAction>) {
    match value {
        Value::Array(items) => out.extend(items.iter().filter_map(file_from_json)),
        Value::Object(map) => {
            for (_, single) in keyed(map, JSON_SINGLE_KEY) {
                out.extend(file_from_json(single));
            }
            for key in JSON_LIST_KEYS {
                for (_, list) in keyed(map, key) {
                    if let Value::Array(items) = list {
                        out.extend(items.iter().filter_map(file_from_json));
                    }
                }
            }
        }
        _ => {}
    }
}

/// Entries whose key equals `key` ignoring ASCII case.
fn keyed<'a>(map: &'a Map<String, Value>, key: &'a str) -> impl Iterator<Item = (&'a String, &'a Value)> {
    map.iter().filter(move |(k, _)| k.eq_ignore_ascii_case(key))
}

/// A file object: path from `path` or `name`, content from `content` or `body`.
fn file_from_json(value: &Value) -> Option<AgentAction> {
    let obj = value.as_object()?;
    let path = probe(obj, &["path", "name"])?.trim();
    let content = probe(obj, &["content", "body"])?;
    if path.is_empty() {
        return None;
    }
    Some(AgentAction::CreateFile {
        path: path.to_string(),
        content: content.to_string(),
    })
}

/// First key holding a non-empty string.
fn probe<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}
