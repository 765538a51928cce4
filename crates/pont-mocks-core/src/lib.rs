//! Mock value synthesis for API schemas.
//!
//! This library turns a read-only API schema snapshot (modules, interfaces and
//! base-class definitions, possibly generic) into mock response data. It can be
//! used two ways:
//!
//! - eagerly, producing [`MockValue`] trees through [`MockSynthesizer`] and
//!   [`MockTable::synthesize`];
//! - as a code generator, producing Rhai source through
//!   [`MockSourceGenerator`] that performs the same computation when executed.
//!
//! # Example
//!
//! ```no_run
//! use pont_mocks_core::{MockTable, SchemaSnapshot, SynthesisLimits, Wrapper};
//! use std::path::Path;
//!
//! let schema = SchemaSnapshot::from_file(Path::new("api-lock.json")).unwrap();
//! let wrapper = Wrapper::parse(r#"{"code": 0, "data": {response}}"#).unwrap();
//! let table = MockTable::synthesize(&schema, &wrapper, SynthesisLimits::default());
//!
//! if let Some(value) = table.get("User", "getUser") {
//!     println!("{}", value.to_json_string());
//! }
//! ```

mod codegen;
mod schema;
mod synth;
mod table;
mod value;
mod wrapper;

pub use codegen::{rhai_literal, rhai_string_literal, MockSourceGenerator};
pub use schema::{
    BaseClassDef, Interface, Module, Property, SchemaError, SchemaSnapshot, SchemaType,
    TemplateArg, NOT_A_TEMPLATE,
};
pub use synth::{
    MockSynthesizer, SynthesisBudget, SynthesisLimits, DEFAULT_ARRAY_LENGTH, DEFAULT_STRING,
    NUMBER_RANGE,
};
pub use table::{MockTable, TableError};
pub use value::MockValue;
pub use wrapper::{Wrapper, WrapperError, DEFAULT_WRAPPER, RESPONSE_PLACEHOLDER};
