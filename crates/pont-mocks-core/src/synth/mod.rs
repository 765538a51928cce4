//! Eager mock value synthesis.
//!
//! [`MockSynthesizer`] walks a [`SchemaType`] and builds a [`MockValue`]:
//!
//! 1. references to base classes become objects, one entry per property, with
//!    generic parameters substituted from the reference's type arguments;
//! 2. `Array<T>` becomes [`DEFAULT_ARRAY_LENGTH`] copies of one synthesized `T`;
//! 3. `string`, `number` and `boolean` become leaf values;
//! 4. anything else becomes null.
//!
//! Recursion through base classes is bounded by a [`SynthesisBudget`] that is
//! threaded through every call. Exhausting it yields an empty object. Array
//! copies are charged to the budget, so the size of the result is bounded too.

mod budget;


pub use budget::{SynthesisBudget, SynthesisLimits};

use crate::schema::{BaseClassDef, SchemaType};
use crate::value::MockValue;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use tracing::debug;

/// Number of items synthesized for an array.
pub const DEFAULT_ARRAY_LENGTH: usize = 3;

/// Value synthesized for `string` types.
pub const DEFAULT_STRING: &str = "mock string";

/// Range of values synthesized for `number` types.
pub const NUMBER_RANGE: Range<f64> = 0.0..100.0;

/// Builds mock values from schema types.
pub struct MockSynthesizer<'a> {
    base_classes: HashMap<&'a str, &'a BaseClassDef>,
    limits: SynthesisLimits,
    array_length: usize,
}

impl<'a> MockSynthesizer<'a> {
    pub fn new(base_classes: &'a [BaseClassDef]) -> Self {
        Self {
            base_classes: base_classes
                .iter()
                .map(|class| (class.name.as_str(), class))
                .collect(),
            limits: SynthesisLimits::default(),
            array_length: DEFAULT_ARRAY_LENGTH,
        }
    }

    pub fn with_limits(mut self, limits: SynthesisLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_array_length(mut self, array_length: usize) -> Self {
        self.array_length = array_length;
        self
    }

    /// Synthesize a top-level type (an interface response) with a fresh budget.
    pub fn synthesize(&self, ty: &SchemaType) -> MockValue {
        let mut budget = SynthesisBudget::new(self.limits);
        self.synthesize_with(ty, &[], &mut budget)
    }

    /// Synthesize `ty`, resolving its generic parameters against `type_args`
    /// (the enclosing generic's arguments) and charging `budget` for every
    /// base-class expansion.
    pub fn synthesize_with(
        &self,
        ty: &SchemaType,
        type_args: &[SchemaType],
        budget: &mut SynthesisBudget,
    ) -> MockValue {
        if ty.has_template_params() {
            let resolved = ty.substitute(type_args);
            return self.synthesize_resolved(&resolved, budget);
        }
        self.synthesize_resolved(ty, budget)
    }

    /// `ty` contains no generic parameters.
    fn synthesize_resolved(&self, ty: &SchemaType, budget: &mut SynthesisBudget) -> MockValue {
        if ty.is_defs_type {
            return self.synthesize_base_class(ty, budget);
        }

        match ty.type_name.as_str() {
            "Array" => match ty.type_args.first() {
                Some(item_type) => {
                    let weight = budget.replicate(self.array_length);
                    let item = self.synthesize_resolved(item_type, budget);
                    budget.restore(weight);
                    MockValue::Sequence(vec![item; self.array_length])
                }
                None => MockValue::Sequence(Vec::new()),
            },
            "string" => MockValue::String(DEFAULT_STRING.to_string()),
            "number" => MockValue::Number(rand::thread_rng().gen_range(NUMBER_RANGE)),
            "boolean" => MockValue::Bool(true),
            _ => MockValue::Null,
        }
    }

    fn synthesize_base_class(&self, ty: &SchemaType, budget: &mut SynthesisBudget) -> MockValue {
        let Some(class) = self.base_classes.get(ty.type_name.as_str()) else {
            debug!("Unknown base class '{}', using empty object", ty.type_name);
            return MockValue::empty_object();
        };

        if !budget.enter(&class.name) {
            debug!(
                "Synthesis budget exhausted for '{}' (calls={}, depth={})",
                class.name,
                budget.calls(&class.name),
                budget.depth()
            );
            return MockValue::empty_object();
        }

        // `ty.type_args` is already concrete: the caller resolved it.
        let mut object = BTreeMap::new();
        for prop in &class.properties {
            let prop_type = prop.data_type.substitute(&ty.type_args);
            let value = self.synthesize_resolved(&prop_type, budget);
            object.insert(prop.name.clone(), value);
        }

        budget.leave();
        MockValue::Object(object)
    }
}
