//! Typed agent definitions
//!
//! An [`Entity`] is a parsed definition file: the frontmatter, tagged by the
//! schema it conforms to, plus the markdown body. Keys a schema does not
//! model are kept in `extra` so they survive a parse/serialize cycle and can
//! be reported by the validator.

use crate::Format;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// An OpenCode permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Allow,
    Ask,
    Deny,
}

impl Permission {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled { Self::Allow } else { Self::Deny }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Ask => "ask",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" | "true" => Ok(Self::Allow),
            "ask" => Ok(Self::Ask),
            "deny" | "false" => Ok(Self::Deny),
            other => Err(format!("must be 'allow', 'ask', or 'deny', got '{}'", other)),
        }
    }
}

/// The canonical superset schema every other format derives from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseAgent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<BTreeMap<String, bool>>,
    /// Raw permission values; nested maps are flattened on conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_directories: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Claude Code agent schema: tools are a comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaudeCodeAgent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// OpenCode agent schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenCodeAgent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<BTreeMap<String, Permission>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_directories: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Frontmatter tagged by the schema it conforms to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Frontmatter {
    Base(BaseAgent),
    ClaudeCode(ClaudeCodeAgent),
    OpenCode(OpenCodeAgent),
}

impl Frontmatter {
    pub fn format(&self) -> Format {
        match self {
            Self::Base(_) => Format::Base,
            Self::ClaudeCode(_) => Format::ClaudeCode,
            Self::OpenCode(_) => Format::OpenCode,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Base(a) => &a.name,
            Self::ClaudeCode(a) => &a.name,
            Self::OpenCode(a) => &a.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Base(a) => &a.description,
            Self::ClaudeCode(a) => &a.description,
            Self::OpenCode(a) => &a.description,
        }
    }

    /// Keys present in the source that the schema does not model.
    pub fn extra_keys(&self) -> Vec<&str> {
        let extra = match self {
            Self::Base(a) => &a.extra,
            Self::ClaudeCode(a) => &a.extra,
            Self::OpenCode(a) => &a.extra,
        };
        extra.keys().map(String::as_str).collect()
    }
}

/// A parsed definition file.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Frontmatter `name`, or the file stem when the frontmatter has none.
    pub name: String,
    pub frontmatter: Frontmatter,
    /// Everything after the closing frontmatter delimiter, verbatim.
    pub body: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frontmatter,
            body: body.into(),
        }
    }

    pub fn format(&self) -> Format {
        self.frontmatter.format()
    }
}
