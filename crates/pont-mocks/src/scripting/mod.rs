//! Rhai runtime for mock sources.
//!
//! Generated and hand-edited mock sources call a small set of native helpers:
//!
//! | Function | Returns |
//! |----------|---------|
//! | `new_budget()` / `new_budget(calls, depth)` | a `CallBudget` cycle guard |
//! | `budget.enter(name)` / `budget.leave()` | charge / release one expansion |
//! | `budget.replicate(n)` / `budget.restore(w)` | charge nested expansions `n` times while an array item is built |
//! | `mock_string()` | the placeholder string |
//! | `mock_number()` | a float in `[0, 100)` |
//! | `mock_bool()` | a random boolean |
//! | `mock_array(item, len)` | `len` copies of `item` |
//! | `fake_name()`, `fake_email()`, `fake_sentence()`, `fake_word()`, `fake_city()`, `fake_country()` | fake text |
//! | `fake_int(min, max)` | an integer in `[min, max]` |

mod rhai_engine;

pub use rhai_engine::{create_engine, dynamic_to_mock, CallBudget};
