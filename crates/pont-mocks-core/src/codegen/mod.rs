//! Mock artifact generation.
//!
//! [`MockSourceGenerator`] turns a schema snapshot into a Rhai script whose
//! final expression is the mock table. The script mirrors eager synthesis:
//!
//! - each base class becomes `fn def_<Name>(budget, t0, t1, ..)`, where `tN`
//!   are closures producing the generic arguments;
//! - each interface becomes `fn api_<Module>_<Interface>()` returning the
//!   wrapped response with a fresh budget;
//! - the last expression maps module and interface names to those calls.
//!
//! Array items that may expand a base class are built under
//! `budget.replicate(n)`, so every copy counts against the budget's object
//! cap the same way it does in eager synthesis.
//!
//! The script relies on host functions (`new_budget`, `mock_string`,
//! `mock_number`, `mock_array`) registered by the runtime that evaluates it.

mod syntax;

pub use syntax::{rhai_literal, rhai_string_literal};

use crate::schema::{BaseClassDef, Interface, SchemaSnapshot, SchemaType};
use crate::synth::DEFAULT_ARRAY_LENGTH;
use crate::value::MockValue;
use crate::wrapper::Wrapper;
use std::collections::HashMap;
use std::fmt::Write;
use syntax::{write_comment, IdentAllocator};

const INDENT: &str = "    ";

/// Generates the Rhai mock artifact for a schema.
pub struct MockSourceGenerator<'a> {
    schema: &'a SchemaSnapshot,
    wrapper: &'a Wrapper,
    array_length: usize,
    def_fns: HashMap<&'a str, (String, &'a BaseClassDef)>,
    api_fns: Vec<String>,
}

/// One module in the final table, interfaces deduplicated by name.
struct TableModule<'a> {
    name: &'a str,
    description: &'a str,
    entries: Vec<(&'a Interface, &'a str)>,
}

impl<'a> MockSourceGenerator<'a> {
    pub fn new(schema: &'a SchemaSnapshot, wrapper: &'a Wrapper) -> Self {
        let mut idents = IdentAllocator::default();

        let mut def_fns = HashMap::new();
        for class in &schema.base_classes {
            let ident = idents.allocate("def", &[&class.name]);
            def_fns.insert(class.name.as_str(), (ident, class));
        }

        let api_fns = schema
            .interfaces()
            .map(|(module, inter)| idents.allocate("api", &[&module.name, &inter.name]))
            .collect();

        Self {
            schema,
            wrapper,
            array_length: DEFAULT_ARRAY_LENGTH,
            def_fns,
            api_fns,
        }
    }

    pub fn with_array_length(mut self, array_length: usize) -> Self {
        self.array_length = array_length;
        self
    }

    /// Render the complete script.
    pub fn generate(&self) -> String {
        let mut out = String::new();
        self.write_header(&mut out);

        for class in &self.schema.base_classes {
            self.write_definition(&mut out, class);
        }

        for ((module, inter), ident) in self.schema.interfaces().zip(&self.api_fns) {
            self.write_interface(&mut out, &module.name, inter, ident);
        }

        self.write_table(&mut out);
        out
    }

    fn write_header(&self, out: &mut String) {
        let _ = writeln!(out, "// Mock data generated by pont-mocks.");
        if let Some(name) = &self.schema.name {
            let _ = writeln!(out, "// Data source: {}", name.replace('\n', " "));
        }
        let _ = writeln!(
            out,
            "// {} base classes, {} interfaces.",
            self.schema.base_classes.len(),
            self.schema.interface_count()
        );
        let _ = writeln!(out, "// Edit freely: existing files are never overwritten.");
        out.push('\n');
    }

    fn write_definition(&self, out: &mut String, class: &BaseClassDef) {
        // Only the last of several same-named classes is reachable.
        let Some((ident, registered)) = self.def_fns.get(class.name.as_str()) else {
            return;
        };
        if !std::ptr::eq(*registered, class) {
            return;
        }

        let arity = class.template_args.len();
        let mut params = vec!["budget".to_string()];
        params.extend((0..arity).map(|i| format!("t{i}")));

        if let Some(description) = &class.description {
            write_comment(out, "", description);
        }
        let _ = writeln!(out, "fn {ident}({}) {{", params.join(", "));
        let _ = writeln!(
            out,
            "{INDENT}if !budget.enter({}) {{",
            rhai_string_literal(&class.name)
        );
        let _ = writeln!(out, "{INDENT}{INDENT}return #{{}};");
        let _ = writeln!(out, "{INDENT}}}");

        if class.properties.is_empty() {
            let _ = writeln!(out, "{INDENT}let value = #{{}};");
        } else {
            let _ = writeln!(out, "{INDENT}let value = #{{");
            let last = class.properties.len() - 1;
            for (i, prop) in class.properties.iter().enumerate() {
                if let Some(description) = &prop.description {
                    write_comment(out, &INDENT.repeat(2), description);
                }
                let separator = if i == last { "" } else { "," };
                let _ = writeln!(
                    out,
                    "{INDENT}{INDENT}{}: {}{separator}",
                    rhai_string_literal(&prop.name),
                    self.expr(&prop.data_type, arity)
                );
            }
            let _ = writeln!(out, "{INDENT}}};");
        }

        let _ = writeln!(out, "{INDENT}budget.leave();");
        let _ = writeln!(out, "{INDENT}value");
        out.push_str("}\n\n");
    }

    fn write_interface(&self, out: &mut String, module: &str, inter: &Interface, ident: &str) {
        let _ = writeln!(
            out,
            "// {} {} ({module}.{})",
            inter.method.to_uppercase(),
            inter.path,
            inter.name
        );
        write_comment(out, "", &inter.description);
        let _ = writeln!(out, "fn {ident}() {{");
        let _ = writeln!(out, "{INDENT}let budget = new_budget();");
        let response = self.expr(&inter.response, 0);
        let _ = writeln!(out, "{INDENT}{}", self.wrap(self.wrapper.shape(), &response));
        out.push_str("}\n\n");
    }

    fn write_table(&self, out: &mut String) {
        let modules = self.table_modules();
        if modules.is_empty() {
            out.push_str("#{}\n");
            return;
        }

        out.push_str("#{\n");
        let last_module = modules.len() - 1;
        for (m, module) in modules.iter().enumerate() {
            write_comment(out, INDENT, module.description);
            let module_separator = if m == last_module { "" } else { "," };
            let key = rhai_string_literal(module.name);

            if module.entries.is_empty() {
                let _ = writeln!(out, "{INDENT}{key}: #{{}}{module_separator}");
                continue;
            }

            let _ = writeln!(out, "{INDENT}{key}: #{{");
            let last_entry = module.entries.len() - 1;
            for (e, (inter, ident)) in module.entries.iter().enumerate() {
                let separator = if e == last_entry { "" } else { "," };
                let _ = writeln!(
                    out,
                    "{INDENT}{INDENT}{}: {ident}(){separator}",
                    rhai_string_literal(&inter.name)
                );
            }
            let _ = writeln!(out, "{INDENT}}}{module_separator}");
        }
        out.push_str("}\n");
    }

    /// Group interfaces by module. Rhai rejects duplicate map keys, so repeated
    /// module names merge and a repeated interface name keeps the last one.
    fn table_modules(&self) -> Vec<TableModule<'_>> {
        let mut modules: Vec<TableModule<'_>> = Vec::new();
        let mut api_fns = self.api_fns.iter();

        for module in &self.schema.mods {
            let position = match modules.iter().position(|m| m.name == module.name) {
                Some(position) => position,
                None => {
                    modules.push(TableModule {
                        name: &module.name,
                        description: &module.description,
                        entries: Vec::new(),
                    });
                    modules.len() - 1
                }
            };

            for inter in &module.interfaces {
                let Some(ident) = api_fns.next() else {
                    break;
                };
                let entries = &mut modules[position].entries;
                match entries.iter().position(|(existing, _)| existing.name == inter.name) {
                    Some(i) => entries[i] = (inter, ident),
                    None => entries.push((inter, ident)),
                }
            }
        }
        modules
    }

    /// Expression producing a mock value for `ty`. `arity` is the number of
    /// generic parameters in scope (`t0..`).
    fn expr(&self, ty: &SchemaType, arity: usize) -> String {
        if ty.is_template_param() {
            return match ty.template_position() {
                Some(index) if index < arity => format!("t{index}.call()"),
                _ => "()".to_string(),
            };
        }

        if ty.is_defs_type {
            let Some((ident, class)) = self.def_fns.get(ty.type_name.as_str()) else {
                return "#{}".to_string();
            };
            let mut args = vec!["budget".to_string()];
            for i in 0..class.template_args.len() {
                let arg = ty
                    .type_args
                    .get(i)
                    .map(|arg| self.expr(arg, arity))
                    .unwrap_or_else(|| "()".to_string());
                args.push(format!("|| {arg}"));
            }
            return format!("{ident}({})", args.join(", "));
        }

        match ty.type_name.as_str() {
            "Array" => match ty.type_args.first() {
                Some(item) if expands(item) => format!(
                    "{{ let weight = budget.replicate({len}); let item = {}; budget.restore(weight); mock_array(item, {len}) }}",
                    self.expr(item, arity),
                    len = self.array_length
                ),
                Some(item) => format!("mock_array({}, {})", self.expr(item, arity), self.array_length),
                None => "[]".to_string(),
            },
            "string" => "mock_string()".to_string(),
            "number" => "mock_number()".to_string(),
            "boolean" => "true".to_string(),
            _ => "()".to_string(),
        }
    }

    /// Render the wrapper shape with `response` at the slot.
    fn wrap(&self, node: &MockValue, response: &str) -> String {
        if Wrapper::is_slot(node) {
            return response.to_string();
        }

        match node {
            MockValue::Sequence(items) => {
                let items: Vec<String> = items.iter().map(|item| self.wrap(item, response)).collect();
                format!("[{}]", items.join(", "))
            }
            MockValue::Object(map) if !map.is_empty() => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(key, value)| format!("{}: {}", rhai_string_literal(key), self.wrap(value, response)))
                    .collect();
                format!("#{{ {} }}", entries.join(", "))
            }
            other => rhai_literal(other),
        }
    }
}

/// Whether synthesizing `ty` may expand a base class. Such array items are
/// built under `budget.replicate` so their copies are charged.
fn expands(ty: &SchemaType) -> bool {
    ty.is_defs_type || ty.is_template_param() || ty.type_args.iter().any(expands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Property;
    use crate::wrapper::DEFAULT_WRAPPER;

    fn schema() -> SchemaSnapshot {
        SchemaSnapshot::from_json_str(
            r#"{
            "name": "petstore",
            "mods": [
                { "name": "User", "description": "user management", "interfaces": [
                    { "name": "getUser", "path": "/users/{id}", "method": "get",
                      "description": "Get a user",
                      "response": { "typeName": "User", "isDefsType": true } },
                    { "name": "list", "path": "/users", "method": "GET",
                      "response": { "typeName": "Page", "isDefsType": true,
                                    "typeArgs": [{ "typeName": "User", "isDefsType": true }] } }
                ]},
                { "name": "Empty", "interfaces": [] }
            ],
            "baseClasses": [
                { "name": "User", "description": "A user", "properties": [
                    { "name": "id", "dataType": { "typeName": "number" }, "description": "primary key" },
                    { "name": "name", "dataType": { "typeName": "string" } },
                    { "name": "friend", "dataType": { "typeName": "User", "isDefsType": true } }
                ]},
                { "name": "Page", "templateArgs": ["T"], "properties": [
                    { "name": "items", "dataType": { "typeName": "Array", "typeArgs": [{ "typeName": "T", "templateIndex": 0 }] } },
                    { "name": "extra", "dataType": { "typeName": "U", "templateIndex": 4 } },
                    { "name": "ok", "dataType": { "typeName": "boolean" } }
                ]}
            ]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_definitions_are_guarded() {
        let schema = schema();
        let wrapper = Wrapper::identity();
        let source = MockSourceGenerator::new(&schema, &wrapper).generate();

        assert!(source.contains("fn def_User(budget) {"));
        assert!(source.contains("if !budget.enter(\"User\") {"));
        assert!(source.contains("\"friend\": def_User(budget)"));
        assert!(source.contains("budget.leave();"));
        assert!(source.contains("// primary key"));
        assert!(source.contains("// A user"));
    }

    #[test]
    fn test_generic_arguments_are_closures() {
        let schema = schema();
        let wrapper = Wrapper::identity();
        let source = MockSourceGenerator::new(&schema, &wrapper).generate();

        assert!(source.contains("fn def_Page(budget, t0) {"));
        assert!(source.contains(
            "\"items\": { let weight = budget.replicate(3); let item = t0.call(); budget.restore(weight); mock_array(item, 3) }"
        ));
        assert!(source.contains("\"extra\": ()"));
        assert!(source.contains("def_Page(budget, || def_User(budget))"));
    }

    #[test]
    fn test_interfaces_apply_wrapper() {
        let schema = schema();
        let wrapper = Wrapper::parse(DEFAULT_WRAPPER).unwrap();
        let source = MockSourceGenerator::new(&schema, &wrapper).generate();

        assert!(source.contains("// GET /users/{id} (User.getUser)"));
        assert!(source.contains("fn api_User_getUser() {"));
        assert!(source.contains("let budget = new_budget();"));
        assert!(source.contains(r#"#{ "code": 0, "data": def_User(budget), "message": "" }"#));
    }

    #[test]
    fn test_table_lists_every_module() {
        let schema = schema();
        let wrapper = Wrapper::identity();
        let source = MockSourceGenerator::new(&schema, &wrapper).generate();

        let table = &source[source.rfind("\n#{").unwrap()..];
        assert!(table.contains("\"getUser\": api_User_getUser(),"));
        assert!(table.contains("\"list\": api_User_list()\n"));
        assert!(table.contains("\"Empty\": #{}\n"));
        assert!(table.trim_end().ends_with('}'));
    }

    #[test]
    fn test_array_length_is_configurable() {
        let mut schema = SchemaSnapshot::default();
        schema.base_classes.push(BaseClassDef::new(
            "Tags",
            vec![Property::new("values", SchemaType::array(SchemaType::primitive("string")))],
        ));
        let wrapper = Wrapper::identity();
        let source = MockSourceGenerator::new(&schema, &wrapper)
            .with_array_length(7)
            .generate();
        assert!(source.contains("mock_array(mock_string(), 7)"));
        assert!(source.trim_end().ends_with("#{}"));
    }

    #[test]
    fn test_duplicate_interface_names_keep_last() {
        let schema = SchemaSnapshot::from_json_str(
            r#"{ "mods": [
                { "name": "A", "interfaces": [{ "name": "x", "path": "/one", "method": "GET" }] },
                { "name": "A", "interfaces": [{ "name": "x", "path": "/two", "method": "GET" }] }
            ] }"#,
        )
        .unwrap();
        let wrapper = Wrapper::identity();
        let source = MockSourceGenerator::new(&schema, &wrapper).generate();

        assert!(source.contains("fn api_A_x() {"));
        assert!(source.contains("fn api_A_x_2() {"));
        let table = &source[source.rfind("\n#{").unwrap()..];
        assert_eq!(table.matches("\"A\":").count(), 1);
        assert!(table.contains("\"x\": api_A_x_2()"));
        assert!(!table.contains("api_A_x()"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let schema = schema();
        let wrapper = Wrapper::parse(DEFAULT_WRAPPER).unwrap();
        let generator = MockSourceGenerator::new(&schema, &wrapper);
        assert_eq!(generator.generate(), generator.generate());
    }
}
