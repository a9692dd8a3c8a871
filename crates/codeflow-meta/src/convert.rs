//! Conversion between client schemas
//!
//! Base is the hub: Claude Code and OpenCode convert into each other by way
//! of [`BaseAgent`]. The body is carried over untouched in every direction.

use crate::entity::{BaseAgent, ClaudeCodeAgent, Entity, Frontmatter, OpenCodeAgent, Permission};
use crate::{Error, Format, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;

const CLAUDE_CODE_MODELS: [&str; 4] = ["inherit", "sonnet", "opus", "haiku"];
const OPENCODE_MODELS: [&str; 3] = [
    "opencode/grok-code",
    "opencode/code-supernova",
    "opencode/grok-code-fast-1",
];
const DEFAULT_OPENCODE_MODEL: &str = "opencode/grok-code";
const DEFAULT_MODE: &str = "subagent";

/// Converts an entity into another client schema.
pub trait FormatConverter {
    /// # Errors
    ///
    /// Fails when the source carries values the target schema cannot
    /// express, such as an unknown permission level.
    fn convert(&self, entity: &Entity, target: Format) -> Result<Entity>;
}

/// Default converter covering every pair of [`Format`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaConverter;

impl SchemaConverter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatConverter for SchemaConverter {
    fn convert(&self, entity: &Entity, target: Format) -> Result<Entity> {
        let frontmatter = match (&entity.frontmatter, target) {
            (fm, t) if fm.format() == t => fm.clone(),
            (Frontmatter::Base(base), Format::ClaudeCode) => {
                Frontmatter::ClaudeCode(base_to_claude_code(base))
            }
            (Frontmatter::Base(base), Format::OpenCode) => {
                Frontmatter::OpenCode(base_to_opencode(base, &entity.name)?)
            }
            (Frontmatter::ClaudeCode(claude), Format::Base) => {
                Frontmatter::Base(claude_code_to_base(claude))
            }
            (Frontmatter::ClaudeCode(claude), Format::OpenCode) => {
                Frontmatter::OpenCode(claude_code_to_opencode(claude))
            }
            (Frontmatter::OpenCode(open), Format::Base) => {
                Frontmatter::Base(opencode_to_base(open, &entity.name))
            }
            (Frontmatter::OpenCode(open), Format::ClaudeCode) => {
                Frontmatter::ClaudeCode(base_to_claude_code(&opencode_to_base(open, &entity.name)))
            }
            (fm, t) => {
                return Err(Error::Conversion {
                    agent: entity.name.clone(),
                    target: t.to_string(),
                    message: format!("unsupported conversion from {}", fm.format()),
                });
            }
        };

        tracing::trace!(
            agent = %entity.name,
            from = %entity.format(),
            to = %target,
            "Converted entity"
        );
        Ok(Entity::new(entity.name.clone(), frontmatter, entity.body.clone()))
    }
}

fn base_to_claude_code(base: &BaseAgent) -> ClaudeCodeAgent {
    let tools = match (&base.tools, &base.permission) {
        (Some(tools), _) => join_names(tools.iter().filter(|(_, on)| **on).map(|(t, _)| t)),
        (None, Some(permission)) => join_names(
            permission
                .iter()
                .filter(|(_, v)| v.as_str() == Some("allow"))
                .map(|(t, _)| t),
        ),
        (None, None) => None,
    };

    ClaudeCodeAgent {
        name: base.name.clone(),
        description: base.description.clone(),
        tools,
        model: Some(base.model.as_deref().map_or_else(|| "inherit".to_string(), claude_code_model)),
        extra: BTreeMap::new(),
    }
}

fn base_to_opencode(base: &BaseAgent, entity_name: &str) -> Result<OpenCodeAgent> {
    let name = if base.name.is_empty() { entity_name } else { &base.name };
    let permission = match extract_permissions(base) {
        Ok(Some(permission)) => permission,
        Ok(None) => default_permissions(),
        Err(message) => {
            return Err(Error::Conversion {
                agent: name.to_string(),
                target: Format::OpenCode.to_string(),
                message,
            });
        }
    };

    Ok(OpenCodeAgent {
        name: name.to_string(),
        description: base.description.clone(),
        mode: Some(base.mode.clone().unwrap_or_else(|| DEFAULT_MODE.to_string())),
        model: base.model.as_deref().map(opencode_model),
        temperature: base.temperature,
        permission: Some(permission),
        category: base.category.clone(),
        tags: base.tags.clone(),
        allowed_directories: base.allowed_directories.clone(),
        ..Default::default()
    })
}

fn claude_code_to_base(claude: &ClaudeCodeAgent) -> BaseAgent {
    let tools = claude.tools.as_deref().map(|tools| {
        tools
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| (t.to_string(), true))
            .collect()
    });

    BaseAgent {
        name: claude.name.clone(),
        description: claude.description.clone(),
        model: claude.model.clone(),
        tools,
        extra: claude.extra.clone(),
        ..Default::default()
    }
}

fn claude_code_to_opencode(claude: &ClaudeCodeAgent) -> OpenCodeAgent {
    let base = claude_code_to_base(claude);
    OpenCodeAgent {
        name: base.name,
        description: base.description,
        mode: Some(DEFAULT_MODE.to_string()),
        model: base.model.as_deref().map(opencode_model),
        temperature: base.temperature,
        tools: base.tools,
        ..Default::default()
    }
}

fn opencode_to_base(open: &OpenCodeAgent, entity_name: &str) -> BaseAgent {
    let tools = match &open.permission {
        Some(permission) => Some(
            permission
                .iter()
                .map(|(tool, level)| (tool.clone(), *level == Permission::Allow))
                .collect(),
        ),
        None => open.tools.clone(),
    };

    BaseAgent {
        name: if open.name.is_empty() { entity_name.to_string() } else { open.name.clone() },
        description: open.description.clone(),
        mode: Some(open.mode.clone().unwrap_or_else(|| DEFAULT_MODE.to_string())),
        model: open.model.clone(),
        temperature: open.temperature,
        tools,
        category: open.category.clone(),
        tags: open.tags.clone(),
        allowed_directories: open.allowed_directories.clone(),
        ..Default::default()
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> Option<String> {
    let names: Vec<&str> = names.map(String::as_str).collect();
    if names.is_empty() { None } else { Some(names.join(", ")) }
}

/// Permissions for OpenCode, from `permission` first and `tools` second.
fn extract_permissions(
    base: &BaseAgent,
) -> std::result::Result<Option<BTreeMap<String, Permission>>, String> {
    if let Some(raw) = &base.permission
        && !raw.is_empty()
    {
        let mut permissions = BTreeMap::new();
        for (tool, value) in raw {
            let level =
                flatten_permission(value).map_err(|e| format!("permission '{}' {}", tool, e))?;
            permissions.insert(tool.clone(), level);
        }
        permissions.entry("webfetch".to_string()).or_insert(Permission::Allow);
        return Ok(Some(permissions));
    }

    Ok(base.tools.as_ref().map(tools_to_permissions))
}

/// Collapse a permission value to a single level. Nested rule maps use their
/// `*` entry, else the most permissive level they mention.
fn flatten_permission(value: &Value) -> std::result::Result<Permission, String> {
    match value {
        Value::String(s) => s.parse(),
        Value::Bool(b) => Ok(Permission::from_flag(*b)),
        Value::Mapping(rules) => {
            if let Some(wildcard) = rules.get("*") {
                return flatten_permission(wildcard);
            }
            let levels: Vec<&str> = rules.values().filter_map(Value::as_str).collect();
            Ok(if levels.contains(&"allow") {
                Permission::Allow
            } else if levels.contains(&"ask") {
                Permission::Ask
            } else {
                Permission::Deny
            })
        }
        _ => Ok(Permission::Deny),
    }
}

fn tools_to_permissions(tools: &BTreeMap<String, bool>) -> BTreeMap<String, Permission> {
    let flag = |name: &str, default: bool| {
        Permission::from_flag(tools.get(name).copied().unwrap_or(default))
    };
    let mut permissions = BTreeMap::from([
        ("edit".to_string(), flag("edit", false)),
        ("bash".to_string(), flag("bash", false)),
        ("webfetch".to_string(), flag("webfetch", true)),
    ]);
    for (tool, enabled) in tools {
        permissions
            .entry(tool.clone())
            .or_insert_with(|| Permission::from_flag(*enabled));
    }
    permissions
}

fn default_permissions() -> BTreeMap<String, Permission> {
    BTreeMap::from([
        ("edit".to_string(), Permission::Deny),
        ("bash".to_string(), Permission::Deny),
        ("webfetch".to_string(), Permission::Allow),
        ("read".to_string(), Permission::Allow),
        ("write".to_string(), Permission::Deny),
    ])
}

fn claude_code_model(model: &str) -> String {
    if CLAUDE_CODE_MODELS.contains(&model) {
        return model.to_string();
    }
    let mapped = match model.to_lowercase().as_str() {
        "claude-sonnet" | "anthropic/claude-sonnet-4" | "sonnet" => "sonnet",
        "claude-opus" | "anthropic/claude-opus-4" | "opus" => "opus",
        "claude-haiku" | "anthropic/claude-haiku-4" | "haiku" => "haiku",
        "inherit" | "opencode/grok-code" | "opencode/code-supernova" | "opencode/grok-code-fast-1"
        | "opencode/gpt-5" | "github-copilot/gpt-5" => "inherit",
        _ => {
            tracing::warn!(model, "Unknown model, defaulting to 'inherit' for Claude Code");
            "inherit"
        }
    };
    mapped.to_string()
}

fn opencode_model(model: &str) -> String {
    if model.starts_with("opencode/") {
        if model == "opencode/gpt-5" {
            tracing::warn!(
                model,
                "Model not available from the opencode provider, using github-copilot"
            );
            return "github-copilot/gpt-5".to_string();
        }
        if OPENCODE_MODELS.contains(&model) {
            return model.to_string();
        }
        tracing::warn!(model, "Unknown OpenCode model, defaulting to '{}'", DEFAULT_OPENCODE_MODEL);
        return DEFAULT_OPENCODE_MODEL.to_string();
    }

    let mapped = match model.to_lowercase().as_str() {
        "sonnet"
        | "haiku"
        | "inherit"
        | "anthropic/claude-sonnet-4"
        | "anthropic/claude-haiku-4" => DEFAULT_OPENCODE_MODEL,
        "opus" | "anthropic/claude-opus-4" => "opencode/code-supernova",
        "gpt-5" => "github-copilot/gpt-5",
        _ => {
            tracing::warn!(
                model,
                "Unknown model, defaulting to '{}' for OpenCode",
                DEFAULT_OPENCODE_MODEL
            );
            DEFAULT_OPENCODE_MODEL
        }
    };
    mapped.to_string()
}
