use serde_json::Value;
use tracing::{debug, warn};

use crate::assemble::{replace_schema_segment, schema_segment};

const DEFAULT_KEY: &str = "\"default\":";

#[derive(Clone, Debug, PartialEq)]
pub struct QuoteRepair {
    pub liquid: String,
    /// Number of `default` values that needed escaping.
    pub repaired: usize,
    /// Whether the schema segment parses after repair.
    pub valid: bool,
}

/// Escapes `"` characters that are not already preceded by an odd run of backslashes.
fn escape_inner_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut backslashes = 0;
    for ch in value.chars() {
        if ch == '"' && backslashes % 2 == 0 {
            out.push('\\');
        }
        backslashes = if ch == '\\' { backslashes + 1 } else { 0 };
        out.push(ch);
    }
    out
}

/// Repairs a single `"default": "..."` line, if it needs it.
fn repair_line(line: &str) -> Option<String> {
    let key = line.find(DEFAULT_KEY)?;
    let after_key = key + DEFAULT_KEY.len();
    let open = after_key + line[after_key..].find('"')?;
    if !line[after_key..open].trim().is_empty() {
        return None;
    }
    let body = line[open + 1..].trim_end();
    let (body, tail) = match body.strip_suffix(',') {
        Some(stripped) => (stripped, ","),
        None => (body, ""),
    };
    let inner = body.strip_suffix('"')?;
    let escaped = escape_inner_quotes(inner);
    if escaped == inner {
        return None;
    }
    Some(format!("{}\"{}\"{}", &line[..open], escaped, tail))
}

/// Escapes stray quotes inside string `default` values of the schema segment.
/// Idempotent; the rest of the template is left untouched.
pub fn repair_schema_quotes(liquid: &str) -> QuoteRepair {
    let Some(segment) = schema_segment(liquid) else {
        return QuoteRepair {
            liquid: liquid.to_string(),
            repaired: 0,
            valid: false,
        };
    };
    let mut repaired = 0;
    let lines: Vec<String> = segment
        .lines()
        .map(|line| match repair_line(line) {
            Some(fixed) => {
                repaired += 1;
                fixed
            }
            None => line.to_string(),
        })
        .collect();
    let candidate = lines.join("\n");
    match serde_json::from_str::<Value>(&candidate) {
        Ok(schema) if repaired > 0 => {
            debug!(repaired, "schema defaults escaped");
            let pretty = serde_json::to_string_pretty(&schema).unwrap_or(candidate);
            QuoteRepair {
                liquid: replace_schema_segment(liquid, &pretty).unwrap_or_else(|| liquid.to_string()),
                repaired,
                valid: true,
            }
        }
        Ok(_) => QuoteRepair {
            liquid: liquid.to_string(),
            repaired: 0,
            valid: true,
        },
        Err(err) => {
            warn!(%err, repaired, "schema still invalid after quote repair");
            let liquid = if repaired > 0 {
                replace_schema_segment(liquid, &candidate).unwrap_or_else(|| liquid.to_string())
            } else {
                liquid.to_string()
            };
            QuoteRepair {
                liquid,
                repaired,
                valid: false,
            }
        }
    }
}
