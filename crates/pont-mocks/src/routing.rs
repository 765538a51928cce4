//! Interface route matching.
//!
//! Every interface path template is compiled once per schema snapshot into an
//! anchored regex: `{param}` segments match `[0-9a-zA-Z_-]+`, everything else
//! matches literally.

use pont_mocks_core::{Interface, Module, SchemaSnapshot};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Pattern substituted for each `{param}` segment.
pub const PARAM_PATTERN: &str = "[0-9a-zA-Z_-]+";

static PARAM_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_param_regex() -> &'static Regex {
    PARAM_REGEX.get_or_init(|| Regex::new(r"\{[^}]+\}").unwrap())
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Invalid route '{path}' for {module}.{interface}: {source}")]
    InvalidPattern {
        module: String,
        interface: String,
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// Regex source for a path template.
pub fn route_pattern(template: &str) -> String {
    let mut pattern = String::from("^");
    let mut last = 0;
    for param in get_param_regex().find_iter(template) {
        pattern.push_str(&regex::escape(&template[last..param.start()]));
        pattern.push_str(PARAM_PATTERN);
        last = param.end();
    }
    pattern.push_str(&regex::escape(&template[last..]));
    pattern.push('$');
    pattern
}

/// One interface's matcher.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub module: String,
    pub interface: String,
    method: String,
    template: String,
    regex: Regex,
}

impl CompiledRoute {
    pub fn compile(module: &Module, inter: &Interface) -> Result<Self, RouteError> {
        let regex = Regex::new(&route_pattern(&inter.path)).map_err(|source| {
            RouteError::InvalidPattern {
                module: module.name.clone(),
                interface: inter.name.clone(),
                path: inter.path.clone(),
                source,
            }
        })?;

        Ok(Self {
            module: module.name.clone(),
            interface: inter.name.clone(),
            method: inter.method.to_uppercase(),
            template: inter.path.clone(),
            regex,
        })
    }

    /// `method` compares case-insensitively; `path` excludes the query string.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.method.eq_ignore_ascii_case(method) && self.regex.is_match(path)
    }

    /// Upper-cased HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// `Module.interface`
    pub fn key(&self) -> String {
        format!("{}.{}", self.module, self.interface)
    }
}

/// Matchers for every interface, in module-then-interface declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn compile(schema: &SchemaSnapshot) -> Result<Self, RouteError> {
        let routes = schema
            .interfaces()
            .map(|(module, inter)| CompiledRoute::compile(module, inter))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    /// First route matching the request.
    pub fn find(&self, method: &str, path: &str) -> Option<&CompiledRoute> {
        self.routes.iter().find(|route| route.matches(method, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }
}
