//! Code Table Schema
//!
//! TOML shape of a recognized-code table and the runtime table built from it.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::command::code_name;

/// Root code table file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CodeTableFile {
    pub table: TableMeta,
    #[serde(default)]
    pub codes: Vec<CodeDef>,
}

/// Code table metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TableMeta {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Runtime code table keyed by canonical code name
#[derive(Debug, Clone, PartialEq)]
pub struct CodeTable {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub codes: HashMap<String, CodeDef>,
}

/// A recognized G or M code
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CodeDef {
    pub name: String,
    pub description_short: Option<String>,
    pub description_long: Option<String>,
    /// Parameter letters the code accepts; `None` accepts anything
    pub parameters: Option<Vec<ParameterDef>>,
}

/// Command parameter definition
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    pub constraints: Option<ParameterConstraints>,
    pub aliases: Option<Vec<String>>,
}

/// Parameter value types
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Int,
    #[default]
    Float,
}

/// Parameter validation constraints
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParameterConstraints {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Canonical form of a code name: "g01" and "G1" are the same code
pub fn normalize_code_name(name: &str) -> String {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    if let Some(letter) = chars.next().filter(char::is_ascii_alphabetic) {
        if let Ok(number) = chars.as_str().trim().parse::<f64>() {
            return code_name(letter.to_ascii_uppercase(), number);
        }
    }
    trimmed.to_ascii_uppercase()
}

impl From<CodeTableFile> for CodeTable {
    fn from(file: CodeTableFile) -> Self {
        let codes = file
            .codes
            .into_iter()
            .map(|mut code| {
                code.name = normalize_code_name(&code.name);
                (code.name.clone(), code)
            })
            .collect();

        Self {
            name: file.table.name,
            version: file.table.version,
            description: file.table.description,
            codes,
        }
    }
}

impl CodeTable {
    /// Parse a table from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CodeTableFile =
            toml::from_str(content).context("Failed to parse code table TOML")?;
        Ok(file.into())
    }

    /// A table recognizing `names` with no parameter restrictions
    pub fn from_names<I, S>(name: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = names
            .into_iter()
            .map(|n| {
                let name = normalize_code_name(n.as_ref());
                let def = CodeDef {
                    name: name.clone(),
                    description_short: None,
                    description_long: None,
                    parameters: None,
                };
                (name, def)
            })
            .collect();

        Self {
            name: name.to_string(),
            version: None,
            description: None,
            codes,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CodeDef> {
        self.codes.get(name)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl CodeDef {
    /// Find parameter by letter (including aliases)
    pub fn find_parameter(&self, letter: char) -> Option<&ParameterDef> {
        self.parameters
            .as_ref()?
            .iter()
            .find(|param| param.matches_letter(letter))
    }

    /// Get required parameters
    pub fn required_parameters(&self) -> Vec<&ParameterDef> {
        self.parameters
            .as_ref()
            .map(|params| params.iter().filter(|p| p.required).collect())
            .unwrap_or_default()
    }
}

impl ParameterDef {
    /// Check if the parameter is written with `letter` (including aliases)
    pub fn matches_letter(&self, letter: char) -> bool {
        let mut buf = [0; 4];
        let letter = letter.encode_utf8(&mut buf);
        if self.name.eq_ignore_ascii_case(letter) {
            return true;
        }

        self.aliases
            .as_ref()
            .map(|aliases| aliases.iter().any(|alias| alias.eq_ignore_ascii_case(letter)))
            .unwrap_or(false)
    }

    /// Validate parameter value
    pub fn validate(&self, value: f64) -> Result<(), String> {
        if self.param_type == ParameterType::Int && value.fract() != 0.0 {
            return Err(format!(
                "Parameter '{}' expects integer, got '{}'",
                self.name, value
            ));
        }

        if let Some(constraints) = &self.constraints {
            if let Some(min) = constraints.min_value {
                if value < min {
                    return Err(format!(
                        "Parameter '{}' value {} below minimum {}",
                        self.name, value, min
                    ));
                }
            }
            if let Some(max) = constraints.max_value {
                if value > max {
                    return Err(format!(
                        "Parameter '{}' value {} exceeds maximum {}",
                        self.name, value, max
                    ));
                }
            }
        }

        Ok(())
    }
}
