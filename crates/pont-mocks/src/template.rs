//! Randomized-value templates in served mock data.
//!
//! Hand-edited mock data may contain placeholders that are resolved fresh on
//! every request.
//!
//! # Placeholders
//!
//! A string value that is exactly one placeholder is replaced:
//!
//! - `@string`, `@word`, `@sentence`, `@paragraph` - lorem text
//! - `@name`, `@first`, `@last`, `@email` - fake people
//! - `@city`, `@country` - fake places
//! - `@uuid` / `@guid` - a v4 UUID
//! - `@boolean` - a random boolean
//! - `@integer(min, max)` - an integer in `[min, max]` (default `0, 100`)
//! - `@float(min, max)` - a float in `[min, max)` (default `0, 100`)
//! - `@pick(a, b, ...)` - one of the arguments, parsed as JSON when possible
//!
//! `@@text` escapes to the literal `@text`. Unknown placeholders are kept.
//!
//! # Key rules
//!
//! An object key `name|min-max` or `name|count` applies a rule to its value
//! and is renamed to `name`:
//!
//! ```json
//! { "list|2-5": [{ "id": "@integer(1, 9)" }], "star|3": "*", "pet|1": ["cat", "dog"] }
//! ```
//!
//! Arrays repeat their items (`|1` picks a single item instead), strings
//! repeat, numbers become a random integer in range, booleans become random.

use fake::faker::address::en::{CityName, CountryName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::Fake;
use pont_mocks_core::MockValue;
use rand::Rng;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Upper bound on repetitions produced by a key rule.
pub const MAX_REPEAT: u64 = 1000;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static RULE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"^@([A-Za-z]+)(?:\((.*)\))?$").unwrap())
}

fn get_rule_regex() -> &'static Regex {
    RULE_REGEX.get_or_init(|| Regex::new(r"^(.+)\|(\d+)(?:-(\d+))?$").unwrap())
}

/// A parsed `|min-max` or `|count` key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRule {
    pub min: u64,
    pub max: u64,
    /// Written as a range rather than a single count.
    pub ranged: bool,
}

impl KeyRule {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }

    fn picks_one(&self) -> bool {
        !self.ranged && self.min == 1
    }
}

/// Split `name|rule` into the name and its rule.
pub fn parse_key(key: &str) -> Option<(&str, KeyRule)> {
    let caps = get_rule_regex().captures(key)?;
    let name = caps.get(1)?.as_str();
    let first: u64 = caps.get(2)?.as_str().parse().ok()?;
    let rule = match caps.get(3) {
        Some(second) => {
            let second: u64 = second.as_str().parse().ok()?;
            KeyRule {
                min: first.min(second),
                max: first.max(second),
                ranged: true,
            }
        }
        None => KeyRule {
            min: first,
            max: first,
            ranged: false,
        },
    };
    Some((name, rule))
}

/// Resolve every placeholder and key rule in `value`.
pub fn resolve_templates(value: &MockValue) -> MockValue {
    resolve_templates_with(value, &mut rand::thread_rng())
}

pub fn resolve_templates_with<R: Rng + ?Sized>(value: &MockValue, rng: &mut R) -> MockValue {
    match value {
        MockValue::String(s) => resolve_string(s, rng),
        MockValue::Sequence(items) => {
            MockValue::Sequence(items.iter().map(|item| resolve_templates_with(item, rng)).collect())
        }
        MockValue::Object(map) => {
            let mut object = BTreeMap::new();
            for (key, value) in map {
                match parse_key(key) {
                    Some((name, rule)) => {
                        object.insert(name.to_string(), apply_rule(value, rule, rng));
                    }
                    None => {
                        object.insert(key.clone(), resolve_templates_with(value, rng));
                    }
                }
            }
            MockValue::Object(object)
        }
        other => other.clone(),
    }
}

fn apply_rule<R: Rng + ?Sized>(value: &MockValue, rule: KeyRule, rng: &mut R) -> MockValue {
    match value {
        MockValue::Sequence(items) if items.is_empty() => MockValue::Sequence(Vec::new()),
        MockValue::Sequence(items) if rule.picks_one() => {
            let picked = &items[rng.gen_range(0..items.len())];
            resolve_templates_with(picked, rng)
        }
        MockValue::Sequence(items) => {
            let count = rule.sample(rng).min(MAX_REPEAT);
            let mut out = Vec::new();
            for _ in 0..count {
                out.extend(items.iter().map(|item| resolve_templates_with(item, rng)));
            }
            MockValue::Sequence(out)
        }
        MockValue::String(s) => match resolve_string(s, rng) {
            MockValue::String(resolved) => {
                let count = rule.sample(rng).min(MAX_REPEAT);
                MockValue::String(resolved.repeat(count as usize))
            }
            other => other,
        },
        MockValue::Number(_) => MockValue::Number(rule.sample(rng) as f64),
        MockValue::Bool(_) => MockValue::Bool(rng.gen_bool(0.5)),
        other => resolve_templates_with(other, rng),
    }
}

fn resolve_string<R: Rng + ?Sized>(s: &str, rng: &mut R) -> MockValue {
    if let Some(escaped) = s.strip_prefix("@@") {
        return MockValue::String(format!("@{escaped}"));
    }

    let Some(caps) = get_placeholder_regex().captures(s) else {
        return MockValue::String(s.to_string());
    };
    let name = caps.get(1).map(|m| m.as_str().to_ascii_lowercase()).unwrap_or_default();
    let args: Vec<&str> = caps
        .get(2)
        .map(|m| m.as_str().split(',').map(str::trim).filter(|a| !a.is_empty()).collect())
        .unwrap_or_default();

    placeholder(&name, &args, rng).unwrap_or_else(|| MockValue::String(s.to_string()))
}

fn placeholder<R: Rng + ?Sized>(name: &str, args: &[&str], rng: &mut R) -> Option<MockValue> {
    let text = |s: String| Some(MockValue::String(s));
    match name {
        "string" | "word" => text(Word().fake_with_rng::<String, _>(rng)),
        "sentence" => text(Sentence(3..10).fake_with_rng::<String, _>(rng)),
        "paragraph" => text(Paragraph(1..3).fake_with_rng::<String, _>(rng)),
        "name" => text(Name().fake_with_rng::<String, _>(rng)),
        "first" => text(FirstName().fake_with_rng::<String, _>(rng)),
        "last" => text(LastName().fake_with_rng::<String, _>(rng)),
        "email" => text(SafeEmail().fake_with_rng::<String, _>(rng)),
        "city" => text(CityName().fake_with_rng::<String, _>(rng)),
        "country" => text(CountryName().fake_with_rng::<String, _>(rng)),
        "uuid" | "guid" => text(uuid::Uuid::new_v4().to_string()),
        "boolean" => Some(MockValue::Bool(rng.gen_bool(0.5))),
        "integer" => {
            let (min, max) = bounds::<i64>(args, 0, 100)?;
            let n = if min >= max { min } else { rng.gen_range(min..=max) };
            Some(MockValue::Number(n as f64))
        }
        "float" => {
            let (min, max) = bounds::<f64>(args, 0.0, 100.0)?;
            let n = if min >= max { min } else { rng.gen_range(min..max) };
            Some(MockValue::Number(n))
        }
        "pick" => {
            if args.is_empty() {
                return None;
            }
            let choice = args[rng.gen_range(0..args.len())];
            Some(
                serde_json::from_str::<MockValue>(choice)
                    .unwrap_or_else(|_| MockValue::String(choice.to_string())),
            )
        }
        _ => None,
    }
}

/// `(min, max)` from up to two arguments. `None` when an argument is malformed.
fn bounds<T: std::str::FromStr + Copy>(args: &[&str], min: T, max: T) -> Option<(T, T)> {
    match args {
        [] => Some((min, max)),
        [lo] => Some((lo.parse().ok()?, max)),
        [lo, hi] => Some((lo.parse().ok()?, hi.parse().ok()?)),
        _ => None,
    }
}
