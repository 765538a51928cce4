//! Mock data keyed by module and interface name.

use crate::schema::SchemaSnapshot;
use crate::synth::{MockSynthesizer, SynthesisLimits};
use crate::value::MockValue;
use crate::wrapper::Wrapper;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Mock data must be an object of modules, found {0}")]
    NotAnObject(&'static str),
    #[error("Mock data for module '{module}' must be an object of interfaces, found {found}")]
    ModuleNotAnObject {
        module: String,
        found: &'static str,
    },
}

/// `{ module: { interface: value } }`, with values already wrapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockTable {
    modules: BTreeMap<String, BTreeMap<String, MockValue>>,
}

impl MockTable {
    /// Eagerly synthesize every interface response of `schema`.
    pub fn synthesize(schema: &SchemaSnapshot, wrapper: &Wrapper, limits: SynthesisLimits) -> Self {
        let synth = MockSynthesizer::new(&schema.base_classes).with_limits(limits);
        Self::synthesize_with(schema, wrapper, &synth)
    }

    pub fn synthesize_with(
        schema: &SchemaSnapshot,
        wrapper: &Wrapper,
        synth: &MockSynthesizer<'_>,
    ) -> Self {
        let mut table = MockTable::default();
        for module in &schema.mods {
            // Modules without interfaces still get an entry.
            table.modules.entry(module.name.clone()).or_default();
            for inter in &module.interfaces {
                let response = synth.synthesize(&inter.response);
                table.insert(&module.name, &inter.name, wrapper.apply(response));
            }
        }
        table
    }

    /// Interpret loaded mock data.
    pub fn from_value(value: MockValue) -> Result<Self, TableError> {
        let kind = value.kind();
        let MockValue::Object(modules) = value else {
            return Err(TableError::NotAnObject(kind));
        };

        let mut table = MockTable::default();
        for (module, interfaces) in modules {
            match interfaces {
                MockValue::Object(interfaces) => {
                    table.modules.insert(module, interfaces);
                }
                other => {
                    return Err(TableError::ModuleNotAnObject {
                        module,
                        found: other.kind(),
                    })
                }
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, module: &str, interface: &str, value: MockValue) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(interface.to_string(), value);
    }

    pub fn get(&self, module: &str, interface: &str) -> Option<&MockValue> {
        self.modules.get(module).and_then(|m| m.get(interface))
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> MockValue {
        MockValue::Object(
            self.modules
                .iter()
                .map(|(module, interfaces)| (module.clone(), MockValue::Object(interfaces.clone())))
                .collect(),
        )
    }

    /// Pretty JSON, the persisted form of a JSON artifact.
    pub fn to_json_pretty(&self) -> String {
        self.to_value().to_json_string_pretty()
    }
}
