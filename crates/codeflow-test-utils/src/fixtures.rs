//! Definition file contents for tests.

/// A base-format agent that passes validation.
pub fn base_agent(name: &str) -> String {
    format!(
        "---\nname: {name}\ndescription: Handles {name} tasks for the team\nmode: subagent\nmodel: sonnet\ntools:\n  read: true\n  edit: false\n---\n\n# {name}\n\nDo the {name} work.\n"
    )
}

/// A base-format agent that parses but fails validation (no description).
pub fn invalid_base_agent(name: &str) -> String {
    format!("---\nname: {name}\nmode: subagent\n---\n\nMissing a description.\n")
}

/// A Claude Code agent that passes validation.
pub fn claude_code_agent(name: &str) -> String {
    format!(
        "---\nname: {name}\ndescription: Handles {name} tasks for the team\ntools: Read, Grep\nmodel: inherit\n---\n\nClaude body for {name}.\n"
    )
}

/// A file whose frontmatter is not valid YAML.
pub fn malformed_agent(name: &str) -> String {
    format!("---\nname: {name}\ntags: [one, two\n---\n\nBody.\n")
}

/// A workflow command file.
pub fn command(name: &str) -> String {
    format!("---\ndescription: Run the {name} workflow\n---\n\nSteps for {name}.\n")
}
