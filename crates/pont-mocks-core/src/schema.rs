//! Read-only API schema model.
//!
//! The snapshot is produced by an external schema manager (for example a
//! `api-lock.json` file) and is never mutated here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// `templateIndex` value for types that are not generic parameters.
pub const NOT_A_TEMPLATE: i32 = -1;

/// Errors raised while reading a schema snapshot.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML schema: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Base class '{0}' is defined more than once")]
    DuplicateBaseClass(String),
}

/// A node in the schema's type description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    #[serde(default)]
    pub type_name: String,
    /// True when `type_name` refers to a [`BaseClassDef`].
    #[serde(default)]
    pub is_defs_type: bool,
    #[serde(default)]
    pub type_args: Vec<SchemaType>,
    /// Index into the enclosing generic's type arguments, or [`NOT_A_TEMPLATE`].
    #[serde(default = "default_template_index")]
    pub template_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<serde_json::Value>,
}

fn default_template_index() -> i32 {
    NOT_A_TEMPLATE
}

impl Default for SchemaType {
    fn default() -> Self {
        Self {
            type_name: String::new(),
            is_defs_type: false,
            type_args: Vec::new(),
            template_index: NOT_A_TEMPLATE,
            initial_value: None,
        }
    }
}

impl SchemaType {
    /// A primitive (or otherwise non-reference) type such as `string`.
    pub fn primitive(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// A reference to a base-class definition with the given type arguments.
    pub fn defs(type_name: impl Into<String>, type_args: Vec<SchemaType>) -> Self {
        Self {
            type_name: type_name.into(),
            is_defs_type: true,
            type_args,
            ..Default::default()
        }
    }

    /// `Array<item>`.
    pub fn array(item: SchemaType) -> Self {
        Self {
            type_name: "Array".to_string(),
            type_args: vec![item],
            ..Default::default()
        }
    }

    /// The generic parameter at `index` of the enclosing definition.
    pub fn template_param(type_name: impl Into<String>, index: usize) -> Self {
        Self {
            type_name: type_name.into(),
            template_index: i32::try_from(index).unwrap_or(i32::MAX),
            ..Default::default()
        }
    }

    /// Placeholder for a generic parameter that had no matching type argument.
    /// Synthesizes to null.
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_template_param(&self) -> bool {
        self.template_index != NOT_A_TEMPLATE
    }

    /// The template index as a usable position, if this is a generic parameter.
    pub fn template_position(&self) -> Option<usize> {
        if self.is_template_param() {
            usize::try_from(self.template_index).ok()
        } else {
            None
        }
    }

    /// Replace every generic parameter in this type, at any depth, with the
    /// matching entry of `args`.
    ///
    /// `args` must already be concrete. Parameters without a matching argument
    /// become [`SchemaType::unresolved`].
    pub fn substitute(&self, args: &[SchemaType]) -> SchemaType {
        if self.is_template_param() {
            return self
                .template_position()
                .and_then(|index| args.get(index))
                .cloned()
                .unwrap_or_else(SchemaType::unresolved);
        }

        SchemaType {
            type_name: self.type_name.clone(),
            is_defs_type: self.is_defs_type,
            type_args: self.type_args.iter().map(|arg| arg.substitute(args)).collect(),
            template_index: NOT_A_TEMPLATE,
            initial_value: self.initial_value.clone(),
        }
    }

    /// True if a generic parameter appears anywhere in this type.
    pub fn has_template_params(&self) -> bool {
        self.is_template_param() || self.type_args.iter().any(SchemaType::has_template_params)
    }
}

/// A generic parameter declared on a base class.
///
/// Schema managers emit either bare names or full type nodes; both carry the
/// parameter name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateArg {
    Name(String),
    Type(SchemaType),
}

impl TemplateArg {
    pub fn name(&self) -> &str {
        match self {
            TemplateArg::Name(name) => name,
            TemplateArg::Type(ty) => &ty.type_name,
        }
    }
}

/// A property of a base class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub data_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, data_type: SchemaType) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: None,
        }
    }
}

/// A named, reusable structured type ("defs"), optionally generic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseClassDef {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub template_args: Vec<TemplateArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BaseClassDef {
    pub fn new(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            properties,
            template_args: Vec::new(),
            description: None,
        }
    }

    /// Declare generic parameters by name.
    pub fn with_template_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_args = names
            .into_iter()
            .map(|name| TemplateArg::Name(name.into()))
            .collect();
        self
    }

    pub fn template_arg_names(&self) -> impl Iterator<Item = &str> {
        self.template_args.iter().map(TemplateArg::name)
    }

    pub fn is_generic(&self) -> bool {
        !self.template_args.is_empty()
    }
}

/// A single API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub name: String,
    /// Route template, possibly containing `{param}` segments.
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub response: SchemaType,
}

/// A group of interfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

/// Immutable snapshot of an API schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    /// Data source name, when the schema manager provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub mods: Vec<Module>,
    #[serde(default)]
    pub base_classes: Vec<BaseClassDef>,
}

impl SchemaSnapshot {
    /// Load a snapshot from a JSON or YAML file (chosen by extension).
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        let snapshot: SchemaSnapshot = if is_yaml {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };

        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let snapshot: SchemaSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check that base-class names are unique.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for class in &self.base_classes {
            if !seen.insert(class.name.as_str()) {
                return Err(SchemaError::DuplicateBaseClass(class.name.clone()));
            }
        }
        Ok(())
    }

    pub fn base_class(&self, name: &str) -> Option<&BaseClassDef> {
        self.base_classes.iter().find(|class| class.name == name)
    }

    /// All interfaces with their module, in module-then-interface declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = (&Module, &Interface)> {
        self.mods
            .iter()
            .flat_map(|module| module.interfaces.iter().map(move |inter| (module, inter)))
    }

    pub fn interface_count(&self) -> usize {
        self.mods.iter().map(|module| module.interfaces.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "name": "petstore",
        "mods": [{
            "name": "User",
            "description": "user management",
            "interfaces": [{
                "name": "getUser",
                "path": "/users/{id}",
                "method": "GET",
                "description": "Get a user",
                "response": { "typeName": "UserDto", "isDefsType": true }
            }]
        }],
        "baseClasses": [{
            "name": "UserDto",
            "properties": [
                { "name": "id", "dataType": { "typeName": "number" } },
                { "name": "tags", "dataType": { "typeName": "Array", "typeArgs": [{ "typeName": "string" }] } }
            ]
        }, {
            "name": "Page",
            "templateArgs": [{ "typeName": "T" }],
            "properties": [
                { "name": "item", "dataType": { "typeName": "T", "templateIndex": 0 } }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_snapshot_defaults() {
        let schema = SchemaSnapshot::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(schema.name.as_deref(), Some("petstore"));
        assert_eq!(schema.interface_count(), 1);

        let user = schema.base_class("UserDto").unwrap();
        let id = &user.properties[0].data_type;
        assert_eq!(id.template_index, NOT_A_TEMPLATE);
        assert!(!id.is_defs_type);
        assert!(id.type_args.is_empty());
        assert!(!user.is_generic());
    }

    #[test]
    fn test_template_args_accept_names_and_types() {
        let json = r#"{
            "baseClasses": [
                { "name": "A", "templateArgs": ["T", "U"] },
                { "name": "B", "templateArgs": [{ "typeName": "K" }] }
            ]
        }"#;
        let schema = SchemaSnapshot::from_json_str(json).unwrap();
        let a: Vec<&str> = schema.base_classes[0].template_arg_names().collect();
        let b: Vec<&str> = schema.base_classes[1].template_arg_names().collect();
        assert_eq!(a, vec!["T", "U"]);
        assert_eq!(b, vec!["K"]);
    }

    #[test]
    fn test_duplicate_base_class_rejected() {
        let json = r#"{ "baseClasses": [{ "name": "A" }, { "name": "A" }] }"#;
        let err = SchemaSnapshot::from_json_str(json).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateBaseClass(name) if name == "A"));
    }

    #[test]
    fn test_substitute_nested_template_params() {
        // Array<T> with T = UserDto
        let ty = SchemaType::array(SchemaType::template_param("T", 0));
        let resolved = ty.substitute(&[SchemaType::defs("UserDto", vec![])]);
        assert_eq!(resolved.type_name, "Array");
        assert_eq!(resolved.type_args[0].type_name, "UserDto");
        assert!(resolved.type_args[0].is_defs_type);
        assert!(!resolved.has_template_params());
    }

    #[test]
    fn test_substitute_out_of_range_is_unresolved() {
        let ty = SchemaType::template_param("U", 3);
        let resolved = ty.substitute(&[SchemaType::primitive("string")]);
        assert_eq!(resolved, SchemaType::unresolved());
    }

    #[test]
    fn test_interfaces_in_declaration_order() {
        let json = r#"{
            "mods": [
                { "name": "B", "interfaces": [
                    { "name": "b1", "path": "/b1", "method": "GET" },
                    { "name": "b2", "path": "/b2", "method": "GET" }
                ]},
                { "name": "A", "interfaces": [
                    { "name": "a1", "path": "/a1", "method": "POST" }
                ]}
            ]
        }"#;
        let schema = SchemaSnapshot::from_json_str(json).unwrap();
        let order: Vec<(&str, &str)> = schema
            .interfaces()
            .map(|(m, i)| (m.name.as_str(), i.name.as_str()))
            .collect();
        assert_eq!(order, vec![("B", "b1"), ("B", "b2"), ("A", "a1")]);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(
            &path,
            "mods:\n  - name: User\n    interfaces:\n      - name: list\n        path: /users\n        method: get\n",
        )
        .unwrap();

        let schema = SchemaSnapshot::from_file(&path).unwrap();
        assert_eq!(schema.mods[0].interfaces[0].method, "get");
        assert_eq!(schema.mods[0].interfaces[0].response, SchemaType::default());
    }
}
