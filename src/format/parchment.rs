//! Parchment JSON exports.
//!
//! Parchment documents names that already exist; it renames nothing except
//! parameters. Every class, field, method and package maps to itself and
//! carries its javadoc under [`JAVADOC`], joined with newlines.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::table::{Annotated, MappingTable};

/// Metadata key for Parchment javadoc. Kept apart from Tiny comments.
pub const JAVADOC: &str = "parchment_javadoc";

/// Which javadoc a documented parameter receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDocs {
    /// The enclosing method's javadoc, as older tooling attached it
    #[default]
    #[serde(rename = "method")]
    MethodLevel,
    /// The parameter's own javadoc
    #[serde(rename = "parameter")]
    PerParameter,
}

#[derive(Debug, Deserialize)]
struct Container {
    #[serde(default)]
    packages: Vec<Package>,
    #[serde(default)]
    classes: Vec<Class>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    #[serde(default)]
    javadoc: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Class {
    name: String,
    #[serde(default)]
    javadoc: Vec<String>,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    methods: Vec<Method>,
}

#[derive(Debug, Deserialize)]
struct Field {
    name: String,
    descriptor: String,
    #[serde(default)]
    javadoc: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Method {
    name: String,
    descriptor: String,
    #[serde(default)]
    javadoc: Vec<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
struct Parameter {
    index: u32,
    name: Option<String>,
    javadoc: Option<String>,
}

fn join(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Parse a Parchment export into an identity table carrying documentation.
pub fn parse(text: &str, docs: ParameterDocs) -> Result<MappingTable, FormatError> {
    let container: Container = serde_json::from_str(text)?;
    let mut table = MappingTable::new();

    for parchment_class in &container.classes {
        let class = table.add_class(&parchment_class.name, &parchment_class.name);
        if let Some(javadoc) = join(&parchment_class.javadoc) {
            class.meta(JAVADOC, javadoc);
        }

        for parchment_field in &parchment_class.fields {
            let field = class.add_field(
                &parchment_field.name,
                &parchment_field.name,
                Some(parchment_field.descriptor.clone()),
            );
            if let Some(javadoc) = join(&parchment_field.javadoc) {
                field.meta(JAVADOC, javadoc);
            }
        }

        for parchment_method in &parchment_class.methods {
            let method_javadoc = join(&parchment_method.javadoc);
            let method = class.add_method(
                &parchment_method.name,
                &parchment_method.descriptor,
                &parchment_method.name,
            );
            if let Some(javadoc) = &method_javadoc {
                method.meta(JAVADOC, javadoc.as_str());
            }

            for parchment_parameter in &parchment_method.parameters {
                let parameter = method.add_parameter(
                    parchment_parameter.index,
                    None,
                    parchment_parameter.name.clone(),
                );
                let Some(own) = &parchment_parameter.javadoc else {
                    continue;
                };
                let javadoc = match docs {
                    ParameterDocs::MethodLevel => method_javadoc.as_deref(),
                    ParameterDocs::PerParameter => Some(own.as_str()),
                };
                if let Some(javadoc) = javadoc {
                    parameter.meta(JAVADOC, javadoc);
                }
            }
        }
    }

    for parchment_package in &container.packages {
        let package = table.add_package(&parchment_package.name, &parchment_package.name);
        if let Some(javadoc) = join(&parchment_package.javadoc) {
            package.meta(JAVADOC, javadoc);
        }
    }

    Ok(table)
}
