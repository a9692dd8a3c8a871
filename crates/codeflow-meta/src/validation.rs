//! Schema validation for agent definitions
//!
//! Errors make an entity unsyncable; warnings are advisory only.

use crate::entity::{BaseAgent, ClaudeCodeAgent, Entity, Frontmatter, OpenCodeAgent};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("Invalid name pattern regex"));

const MODES: [&str; 3] = ["primary", "subagent", "all"];
const CLAUDE_CODE_FIELDS: [&str; 4] = ["name", "description", "tools", "model"];
const CLAUDE_CODE_MODELS: [&str; 4] = ["inherit", "sonnet", "opus", "haiku"];
const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// One finding from validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Outcome of validating one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// All error messages joined with `"; "`.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks an entity against the rules of its schema.
pub trait EntityValidator {
    fn validate(&self, entity: &Entity) -> ValidationReport;
}

/// Default validator enforcing the Claude Code and OpenCode schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    fn validate_base(&self, agent: &BaseAgent, report: &mut ValidationReport) {
        require(&agent.name, "name", "Name is required and cannot be empty", report);
        require(
            &agent.description,
            "description",
            "Description is required and cannot be empty",
            report,
        );
        check_name_style(&agent.name, report);
        check_description_length(&agent.description, report);
        check_mode(agent.mode.as_deref(), report);
        check_temperature(agent.temperature, report);
    }

    fn validate_claude_code(&self, agent: &ClaudeCodeAgent, report: &mut ValidationReport) {
        if !agent.extra.is_empty() {
            let invalid: Vec<&str> = agent.extra.keys().map(String::as_str).collect();
            report.warnings.push(ValidationIssue::general(format!(
                "Invalid fields for Claude Code: {}. Only allowed: {}",
                invalid.join(", "),
                CLAUDE_CODE_FIELDS.join(", ")
            )));
        }

        require(&agent.name, "name", "Name is required and cannot be empty", report);
        require(
            &agent.description,
            "description",
            "Description is required and cannot be empty",
            report,
        );
        check_name_style(&agent.name, report);
        check_description_length(&agent.description, report);

        if let Some(model) = &agent.model
            && !CLAUDE_CODE_MODELS.contains(&model.as_str())
        {
            report.errors.push(ValidationIssue::field(
                "model",
                format!(
                    "Invalid model '{}'. Must be one of: {}",
                    model,
                    CLAUDE_CODE_MODELS.join(", ")
                ),
            ));
        }

        if let Some(tools) = &agent.tools
            && tools.trim().is_empty()
        {
            report.warnings.push(ValidationIssue::field(
                "tools",
                "No tools specified, agent may have limited functionality",
            ));
        }
    }

    fn validate_opencode(&self, agent: &OpenCodeAgent, report: &mut ValidationReport) {
        if !agent.extra.is_empty() {
            let invalid: Vec<&str> = agent.extra.keys().map(String::as_str).collect();
            report.warnings.push(ValidationIssue::general(format!(
                "Non-standard fields for OpenCode: {}. May cause compatibility issues.",
                invalid.join(", ")
            )));
        }

        require(&agent.name, "name", "Name is required for OpenCode format", report);
        require(
            &agent.description,
            "description",
            "Description is required and cannot be empty",
            report,
        );
        match agent.mode.as_deref() {
            None => report.errors.push(ValidationIssue::field(
                "mode",
                "Mode is required and must be one of: primary, subagent, all",
            )),
            mode => check_mode(mode, report),
        }
        check_name_style(&agent.name, report);
        check_description_length(&agent.description, report);
        check_temperature(agent.temperature, report);

        if agent.tools.is_none() && agent.permission.is_none() {
            report.warnings.push(ValidationIssue::general(
                "Neither tools nor permission specified, agent may have limited functionality",
            ));
        }
    }
}

impl EntityValidator for SchemaValidator {
    fn validate(&self, entity: &Entity) -> ValidationReport {
        let mut report = ValidationReport::default();
        match &entity.frontmatter {
            Frontmatter::Base(agent) => self.validate_base(agent, &mut report),
            Frontmatter::ClaudeCode(agent) => self.validate_claude_code(agent, &mut report),
            Frontmatter::OpenCode(agent) => self.validate_opencode(agent, &mut report),
        }
        report
    }
}

fn require(value: &str, field: &str, message: &str, report: &mut ValidationReport) {
    if value.trim().is_empty() {
        report.errors.push(ValidationIssue::field(field, message));
    }
}

fn check_name_style(name: &str, report: &mut ValidationReport) {
    if !name.is_empty() && !NAME_PATTERN.is_match(name) {
        report.warnings.push(ValidationIssue::field(
            "name",
            "Name should use lowercase letters, numbers, and hyphens only",
        ));
    }
}

fn check_description_length(description: &str, report: &mut ValidationReport) {
    let len = description.chars().count();
    if len == 0 {
        return;
    }
    if len < 10 {
        report.warnings.push(ValidationIssue::field(
            "description",
            "Description is very short, consider adding more detail",
        ));
    }
    if len > 500 {
        report.warnings.push(ValidationIssue::field(
            "description",
            "Description is very long, consider making it more concise",
        ));
    }
}

fn check_mode(mode: Option<&str>, report: &mut ValidationReport) {
    if let Some(mode) = mode
        && !MODES.contains(&mode)
    {
        report.errors.push(ValidationIssue::field(
            "mode",
            format!("Invalid mode '{}'. Must be one of: {}", mode, MODES.join(", ")),
        ));
    }
}

fn check_temperature(temperature: Option<f64>, report: &mut ValidationReport) {
    let (min, max) = TEMPERATURE_RANGE;
    if let Some(t) = temperature
        && !(min..=max).contains(&t)
    {
        report.errors.push(ValidationIssue::field(
            "temperature",
            format!("Temperature must be between {} and {}", min, max),
        ));
    }
}
