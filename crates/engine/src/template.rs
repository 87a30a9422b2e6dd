//! Template resolver (C1, `§4.1`): substitute `{{path.to.field}}` against
//! an [`ExecutionContext`].
//!
//! Deliberately distinct from `nebula_expression::Template`: that engine
//! parses `{{ $expr }}` as a full expression (functions, operators) and
//! errors on an unresolved variable. This resolver implements the spec's
//! narrower, more forgiving contract: a bare dotted path, and an
//! unresolvable placeholder is left verbatim rather than raised as an
//! error — "a deliberate contract, not an error, because upstream outputs
//! may legitimately be absent during partial execution."

use std::sync::OnceLock;

use nebula_execution::ExecutionContext;
use regex::Regex;
use serde_json::Value;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("static pattern"))
}

/// Resolve every `{{path.to.field}}` placeholder in `input` against
/// `context`. Placeholders whose path cannot be fully resolved (missing
/// key, or indexing a non-mapping scalar) are left verbatim.
#[must_use]
pub fn resolve(input: &str, context: &ExecutionContext) -> String {
    if !input.contains("{{") {
        return input.to_string();
    }
    placeholder_re()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let path = &caps[1];
            match resolve_path(path, context) {
                Some(value) => stringify(&value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolve every string leaf of a JSON value recursively against `context`
/// (`§4.1`: "applied recursively to every string leaf of an MCP node's
/// parameter structure").
#[must_use]
pub fn resolve_value(input: &Value, context: &ExecutionContext) -> Value {
    match input {
        Value::String(s) => Value::String(resolve(s, context)),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, context)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Split `path` on `.` and walk it through `context`: the first segment
/// looks up a context key, every further segment indexes into a mapping
/// field. Returns `None` on any unresolvable segment (missing key, or
/// indexing a non-mapping scalar).
fn resolve_path(path: &str, context: &ExecutionContext) -> Option<Value> {
    let mut segments = path.split('.');
    let first = segments.next()?.trim();
    let mut current = context.get(first)?.clone();

    for segment in segments {
        let segment = segment.trim();
        match current {
            Value::Object(ref map) => current = map.get(segment)?.clone(),
            Value::Array(ref items) => {
                let idx: usize = segment.parse().ok()?;
                current = items.get(idx)?.clone();
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Stringify a resolved value for substitution into template text: strings
/// render verbatim, booleans as `True`/`False`, numbers in natural decimal
/// form, everything else as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
