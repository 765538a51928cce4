//! Rhai literal and identifier rendering.

use crate::value::MockValue;
use std::collections::HashSet;
use std::fmt::Write;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Quote `s` as a Rhai string literal.
pub fn rhai_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a constant value as a Rhai expression.
pub fn rhai_literal(value: &MockValue) -> String {
    match value {
        MockValue::Null => "()".to_string(),
        MockValue::Bool(b) => b.to_string(),
        MockValue::Number(n) => number_literal(*n),
        MockValue::String(s) => rhai_string_literal(s),
        MockValue::Sequence(items) => {
            let items: Vec<String> = items.iter().map(rhai_literal).collect();
            format!("[{}]", items.join(", "))
        }
        MockValue::Object(map) => {
            if map.is_empty() {
                return "#{}".to_string();
            }
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", rhai_string_literal(key), rhai_literal(value)))
                .collect();
            format!("#{{ {} }}", entries.join(", "))
        }
    }
}

fn number_literal(n: f64) -> String {
    if !n.is_finite() {
        "()".to_string()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        // Display never uses exponent notation and always keeps the dot here.
        format!("{n}")
    }
}

/// Allocates unique Rhai identifiers from arbitrary schema names.
#[derive(Debug, Default)]
pub struct IdentAllocator {
    used: HashSet<String>,
}

impl IdentAllocator {
    pub fn allocate(&mut self, prefix: &str, parts: &[&str]) -> String {
        let mut base = prefix.to_string();
        for part in parts {
            base.push('_');
            base.push_str(&sanitize(part));
        }

        let mut ident = base.clone();
        let mut n = 2;
        while !self.used.insert(ident.clone()) {
            ident = format!("{base}_{n}");
            n += 1;
        }
        ident
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Write `text` as `//` comment lines at `indent`. Blank text writes nothing.
pub fn write_comment(out: &mut String, indent: &str, text: &str) {
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let _ = writeln!(out, "{indent}// {line}");
    }
}
