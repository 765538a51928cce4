use fake::faker::address::en::{CityName, CountryName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use parking_lot::Mutex;
use pont_mocks_core::{
    MockValue, SynthesisBudget, SynthesisLimits, DEFAULT_STRING, NUMBER_RANGE,
};
use rand::Rng;
use rhai::{Array, Dynamic, Engine, ImmutableString, Map, FLOAT, INT};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Cycle guard handed to generated mock functions.
///
/// Clones share one [`SynthesisBudget`], so passing the budget into nested
/// definition functions charges the same counters.
#[derive(Clone)]
pub struct CallBudget {
    inner: Arc<Mutex<SynthesisBudget>>,
}

impl CallBudget {
    pub fn new(limits: SynthesisLimits) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SynthesisBudget::new(limits))),
        }
    }

    pub fn enter(&mut self, definition: ImmutableString) -> bool {
        self.inner.lock().enter(definition.as_str())
    }

    pub fn leave(&mut self) {
        self.inner.lock().leave();
    }

    pub fn calls(&mut self, definition: ImmutableString) -> INT {
        to_int(self.inner.lock().calls(definition.as_str()))
    }

    pub fn depth(&mut self) -> INT {
        to_int(self.inner.lock().depth())
    }

    pub fn objects(&mut self) -> INT {
        to_int(self.inner.lock().objects())
    }

    /// Charge nested expansions `copies` times until `restore`.
    pub fn replicate(&mut self, copies: INT) -> INT {
        to_int(self.inner.lock().replicate(to_usize(copies)))
    }

    pub fn restore(&mut self, weight: INT) {
        self.inner.lock().restore(to_usize(weight));
    }
}

fn to_int(n: usize) -> INT {
    INT::try_from(n).unwrap_or(INT::MAX)
}

fn to_usize(n: INT) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Build an engine with the mock helpers registered.
///
/// `limits` seeds budgets created by `new_budget()`.
pub fn create_engine(limits: SynthesisLimits) -> Engine {
    let mut engine = Engine::new();

    // Every nested definition costs a function call plus a closure call.
    engine.set_max_call_levels(limits.max_depth.saturating_mul(4).saturating_add(16));
    engine.set_max_expr_depths(128, 64);

    engine.on_print(|text| info!(target: "pont_mocks::script", "{text}"));
    engine.on_debug(|text, source, pos| {
        debug!(target: "pont_mocks::script", "[{}] {pos:?}: {text}", source.unwrap_or("mocks"));
    });

    // Register CallBudget type
    engine
        .register_type_with_name::<CallBudget>("CallBudget")
        .register_fn("enter", CallBudget::enter)
        .register_fn("leave", CallBudget::leave)
        .register_fn("calls", CallBudget::calls)
        .register_fn("depth", CallBudget::depth)
        .register_fn("objects", CallBudget::objects)
        .register_fn("replicate", CallBudget::replicate)
        .register_fn("restore", CallBudget::restore);

    engine.register_fn("new_budget", move || CallBudget::new(limits));
    engine.register_fn("new_budget", move |calls: INT, depth: INT| {
        CallBudget::new(SynthesisLimits {
            max_calls_per_definition: to_usize(calls),
            max_depth: to_usize(depth),
            ..limits
        })
    });

    // Leaf generators used by generated sources
    engine.register_fn("mock_string", || DEFAULT_STRING.to_string());
    engine.register_fn("mock_number", || -> FLOAT {
        rand::thread_rng().gen_range(NUMBER_RANGE)
    });
    engine.register_fn("mock_bool", || rand::thread_rng().gen_bool(0.5));
    engine.register_fn("mock_array", |item: Dynamic, len: INT| -> Array {
        vec![item; to_usize(len)]
    });

    // Fake data for hand-edited sources
    engine.register_fn("fake_name", || Name().fake::<String>());
    engine.register_fn("fake_email", || SafeEmail().fake::<String>());
    engine.register_fn("fake_sentence", || Sentence(1..10).fake::<String>());
    engine.register_fn("fake_word", || Word().fake::<String>());
    engine.register_fn("fake_city", || CityName().fake::<String>());
    engine.register_fn("fake_country", || CountryName().fake::<String>());
    engine.register_fn("fake_int", |min: INT, max: INT| -> INT {
        if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        }
    });

    engine
}

/// Convert a script result into a [`MockValue`].
pub fn dynamic_to_mock(value: Dynamic) -> MockValue {
    // Values captured by closures come back shared.
    let value = value.flatten();

    if value.is_unit() {
        MockValue::Null
    } else if let Ok(b) = value.as_bool() {
        MockValue::Bool(b)
    } else if let Ok(i) = value.as_int() {
        MockValue::Number(i as f64)
    } else if let Ok(f) = value.as_float() {
        MockValue::Number(f)
    } else if let Ok(c) = value.as_char() {
        MockValue::String(c.to_string())
    } else if let Some(s) = value.clone().try_cast::<String>() {
        MockValue::String(s)
    } else if let Some(arr) = value.clone().try_cast::<Array>() {
        MockValue::Sequence(arr.into_iter().map(dynamic_to_mock).collect())
    } else if let Some(map) = value.clone().try_cast::<Map>() {
        let object: BTreeMap<String, MockValue> = map
            .into_iter()
            .map(|(k, v)| (k.to_string(), dynamic_to_mock(v)))
            .collect();
        MockValue::Object(object)
    } else {
        MockValue::String(format!("{value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(script: &str) -> MockValue {
        let engine = create_engine(SynthesisLimits::default());
        dynamic_to_mock(engine.eval::<Dynamic>(script).unwrap())
    }

    #[test]
    fn test_leaf_helpers() {
        assert_eq!(eval("mock_string()"), MockValue::from(DEFAULT_STRING));
        for _ in 0..200 {
            let n = eval("mock_number()").as_f64().unwrap();
            assert!((0.0..100.0).contains(&n));
        }
        assert!(matches!(eval("mock_bool()"), MockValue::Bool(_)));
        assert_eq!(
            serde_json::Value::from(&eval("mock_array(true, 3)")),
            json!([true, true, true])
        );
        assert_eq!(eval("mock_array(1, -2)"), MockValue::Sequence(vec![]));
    }

    #[test]
    fn test_budget_counts_across_clones() {
        let result = eval(
            r#"
            fn charge(budget) { budget.enter("A") }
            let budget = new_budget(2, 10);
            let first = charge(budget);
            budget.leave();
            let second = charge(budget);
            budget.leave();
            let third = charge(budget);
            [first, second, third, budget.calls("A"), budget.depth()]
            "#,
        );
        assert_eq!(serde_json::Value::from(&result), json!([true, true, false, 2, 0]));
    }

    #[test]
    fn test_budget_depth_limit() {
        let result = eval(
            r#"
            let budget = new_budget(100, 2);
            [budget.enter("A"), budget.enter("B"), budget.enter("C"), budget.depth()]
            "#,
        );
        assert_eq!(serde_json::Value::from(&result), json!([true, true, false, 2]));
    }

    #[test]
    fn test_replicated_items_charge_object_cap() {
        let result = eval(
            r#"
            let budget = new_budget();
            let outer = budget.replicate(10);
            let inner = budget.replicate(10);
            let first = budget.enter("A");
            budget.leave();
            budget.restore(inner);
            let second = budget.enter("A");
            budget.leave();
            budget.restore(outer);
            [first, second, budget.objects()]
            "#,
        );
        // 100 copies fit the default cap of 1000; 10 more do too.
        assert_eq!(serde_json::Value::from(&result), json!([true, true, 110]));

        let result = eval(
            r#"
            let budget = new_budget();
            let weight = budget.replicate(2000);
            let refused = budget.enter("A");
            budget.restore(weight);
            [refused, budget.enter("A"), budget.objects()]
            "#,
        );
        assert_eq!(serde_json::Value::from(&result), json!([false, true, 1]));
    }

    #[test]
    fn test_closures_share_captured_budget() {
        let result = eval(
            r#"
            fn wrap(budget, t0) {
                if !budget.enter("W") { return #{}; }
                let value = #{ "inner": t0.call() };
                budget.leave();
                value
            }
            let budget = new_budget();
            wrap(budget, || wrap(budget, || 1))
            "#,
        );
        assert_eq!(
            serde_json::Value::from(&result),
            json!({ "inner": { "inner": 1 } })
        );
    }

    #[test]
    fn test_fake_helpers_produce_strings() {
        for helper in ["fake_name()", "fake_email()", "fake_sentence()", "fake_city()"] {
            let value = eval(helper);
            assert!(!value.as_str().unwrap().is_empty(), "{helper} was empty");
        }
        assert_eq!(eval("fake_int(5, 5)"), MockValue::Number(5.0));
    }

    #[test]
    fn test_dynamic_conversion() {
        let value = eval(r#"#{ "a": 1, "b": 2.5, "c": "x", "d": (), "e": ['y'], "f": #{} }"#);
        assert_eq!(
            serde_json::Value::from(&value),
            json!({ "a": 1, "b": 2.5, "c": "x", "d": null, "e": ["y"], "f": {} })
        );
    }
}
