//! Dotted-path template substitution: `{{path.to.field}}` resolved against a
//! string-keyed context.
//!
//! This is deliberately simpler than [`crate::template::Template`]: it knows
//! nothing of operators, function calls, or whitespace control. Resolution
//! splits the path on `.`, looks the first segment up in the context map,
//! then indexes into a nested mapping field for each further segment. If any
//! segment is missing, or a segment indexes a non-mapping scalar, the
//! `{{ }}` placeholder is left untouched in the output — a missing upstream
//! value during partial execution is not an error here.

use serde_json::{Map, Value};

/// Resolve a dotted path (`a.b.c`) against `context`, indexing into nested
/// objects one segment at a time. Returns `None` as soon as a segment is
/// missing or the current value is not an object.
#[must_use]
pub fn resolve_path<'a>(context: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = context.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Stringify a resolved value for substitution into template text. Strings
/// pass through verbatim; booleans render `True`/`False`; numbers use their
/// natural decimal form; everything else (arrays, objects, null) falls back
/// to compact JSON.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Substitute every `{{path.to.field}}` placeholder in `template` against
/// `context`. Unresolvable placeholders are left verbatim, braces included.
#[must_use]
pub fn render_template(template: &str, context: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find("}}") {
            Some(end) => {
                let path = after_open[..end].trim();
                match resolve_path(context, path) {
                    Some(value) => out.push_str(&stringify(value)),
                    None => {
                        out.push_str("{{");
                        out.push_str(&after_open[..end]);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[end + 2..];
            }
            None => {
                // Unterminated `{{`: emit it verbatim and stop scanning.
                out.push_str("{{");
                rest = after_open;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Apply [`render_template`] recursively to every string leaf of `value`,
/// preserving its shape. Used to resolve an MCP node's parameter structure.
#[must_use]
pub fn render_value(value: &Value, context: &Map<String, Value>) -> Value {
    match value {
        Value::String(s) => Value::String(render_template(s, context)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| render_value(v, context)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Map<String, Value> {
        serde_json::json!({
            "input": {"name": "Ada", "active": true, "score": 3.5},
            "count": 7,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn resolves_nested_path() {
        let c = ctx();
        assert_eq!(
            resolve_path(&c, "input.name"),
            Some(&Value::String("Ada".to_string()))
        );
    }

    #[test]
    fn missing_segment_resolves_to_none() {
        let c = ctx();
        assert_eq!(resolve_path(&c, "input.missing"), None);
    }

    #[test]
    fn indexing_a_scalar_resolves_to_none() {
        let c = ctx();
        assert_eq!(resolve_path(&c, "count.nope"), None);
    }

    #[test]
    fn render_substitutes_resolvable_paths() {
        let c = ctx();
        let out = render_template("Hello {{input.name}}, score={{input.score}}", &c);
        assert_eq!(out, "Hello Ada, score=3.5");
    }

    #[test]
    fn render_leaves_unresolvable_placeholder_verbatim() {
        let c = ctx();
        let out = render_template("Value: {{input.nonexistent}}", &c);
        assert_eq!(out, "Value: {{input.nonexistent}}");
    }

    #[test]
    fn render_stringifies_booleans_python_style() {
        let c = ctx();
        let out = render_template("{{input.active}}", &c);
        assert_eq!(out, "True");
    }

    #[test]
    fn render_value_applies_recursively_to_string_leaves() {
        let c = ctx();
        let params = serde_json::json!({
            "query": "find {{input.name}}",
            "nested": {"greeting": "hi {{input.name}}", "count": 1},
            "list": ["{{input.name}}", "{{input.missing}}"],
        });
        let out = render_value(&params, &c);
        assert_eq!(out["query"], "find Ada");
        assert_eq!(out["nested"]["greeting"], "hi Ada");
        assert_eq!(out["nested"]["count"], 1);
        assert_eq!(out["list"][0], "Ada");
        assert_eq!(out["list"][1], "{{input.missing}}");
    }

    #[test]
    fn unterminated_braces_are_left_verbatim() {
        let c = ctx();
        let out = render_template("broken {{input.name", &c);
        assert_eq!(out, "broken {{input.name");
    }
}
