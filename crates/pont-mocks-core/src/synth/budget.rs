use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounds on base-class expansion during one top-level synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisLimits {
    /// How many times a single base class may be expanded.
    #[serde(default = "default_max_calls")]
    pub max_calls_per_definition: usize,
    /// How many base-class expansions may be nested inside each other.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// How many objects one synthesis may materialize, counting every copy
    /// an enclosing array makes.
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
}

fn default_max_calls() -> usize {
    30
}

fn default_max_depth() -> usize {
    16
}

fn default_max_objects() -> usize {
    1000
}

impl Default for SynthesisLimits {
    fn default() -> Self {
        Self {
            max_calls_per_definition: default_max_calls(),
            max_depth: default_max_depth(),
            max_objects: default_max_objects(),
        }
    }
}

/// Cycle guard for synthesis over self-referential or mutually recursive
/// definitions.
///
/// Every base-class expansion calls [`enter`](Self::enter) before recursing and
/// [`leave`](Self::leave) afterwards. Once a definition has used its call
/// budget, nesting reaches the depth limit, or the materialized object count
/// would pass `max_objects`, `enter` refuses and the caller substitutes an
/// empty object.
///
/// An array item is synthesized once and copied, so the item is built under
/// [`replicate`](Self::replicate): every expansion inside it costs as many
/// objects as there will be copies.
#[derive(Debug, Clone)]
pub struct SynthesisBudget {
    limits: SynthesisLimits,
    calls: HashMap<String, usize>,
    depth: usize,
    objects: usize,
    weight: usize,
}

impl SynthesisBudget {
    pub fn new(limits: SynthesisLimits) -> Self {
        Self {
            limits,
            calls: HashMap::new(),
            depth: 0,
            objects: 0,
            weight: 1,
        }
    }

    /// Charge one expansion of `definition`. Returns false when over budget.
    pub fn enter(&mut self, definition: &str) -> bool {
        if self.depth >= self.limits.max_depth {
            return false;
        }

        let objects = self.objects.saturating_add(self.weight);
        if objects > self.limits.max_objects {
            return false;
        }

        let calls = self.calls.entry(definition.to_string()).or_insert(0);
        if *calls >= self.limits.max_calls_per_definition {
            return false;
        }

        *calls += 1;
        self.depth += 1;
        self.objects = objects;
        true
    }

    /// Close the innermost expansion opened by a successful `enter`.
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn calls(&self, definition: &str) -> usize {
        self.calls.get(definition).copied().unwrap_or(0)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Objects materialized so far, copies included.
    pub fn objects(&self) -> usize {
        self.objects
    }

    /// Multiply the cost of nested expansions by `copies` until the returned
    /// weight is passed to [`restore`](Self::restore).
    pub fn replicate(&mut self, copies: usize) -> usize {
        let previous = self.weight;
        self.weight = previous.saturating_mul(copies);
        previous
    }

    pub fn restore(&mut self, weight: usize) {
        self.weight = weight;
    }
}

impl Default for SynthesisBudget {
    fn default() -> Self {
        Self::new(SynthesisLimits::default())
    }
}
