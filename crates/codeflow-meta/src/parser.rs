//! Markdown + YAML frontmatter parsing

use crate::entity::{BaseAgent, ClaudeCodeAgent, Entity, Frontmatter, OpenCodeAgent};
use crate::{Error, Format, Result};
use codeflow_fs::{NormalizedPath, io};
use serde::de::DeserializeOwned;

/// Parses a definition file into an [`Entity`] of the requested format.
pub trait EntityParser {
    /// # Errors
    ///
    /// Fails when the file cannot be read, has no frontmatter block, or the
    /// frontmatter does not deserialize into the requested schema.
    fn parse(&self, path: &NormalizedPath, format: Format) -> Result<Entity>;
}

/// Default parser: a `---` delimited YAML block followed by a markdown body.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrontmatterParser;

impl FrontmatterParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse already-loaded content. `path` is used for error reporting and
    /// as the name fallback.
    pub fn parse_str(
        &self,
        content: &str,
        path: &NormalizedPath,
        format: Format,
    ) -> Result<Entity> {
        let (yaml, body) = split_frontmatter(content, path)?;
        let yaml = if yaml.trim().is_empty() { "{}" } else { yaml };

        let frontmatter = match format {
            Format::Base => Frontmatter::Base(deserialize::<BaseAgent>(yaml, path)?),
            Format::ClaudeCode => {
                Frontmatter::ClaudeCode(deserialize::<ClaudeCodeAgent>(yaml, path)?)
            }
            Format::OpenCode => Frontmatter::OpenCode(deserialize::<OpenCodeAgent>(yaml, path)?),
        };

        let name = if frontmatter.name().trim().is_empty() {
            path.file_stem().unwrap_or_default().to_string()
        } else {
            frontmatter.name().to_string()
        };

        Ok(Entity::new(name, frontmatter, body))
    }
}

impl EntityParser for FrontmatterParser {
    fn parse(&self, path: &NormalizedPath, format: Format) -> Result<Entity> {
        let content = io::read_text(path)?;
        self.parse_str(&content, path, format)
    }
}

fn deserialize<T: DeserializeOwned>(yaml: &str, path: &NormalizedPath) -> Result<T> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Frontmatter {
        path: path.to_native(),
        // +1 for the opening delimiter line
        line: e.location().map(|loc| loc.line() + 1),
        message: e.to_string(),
    })
}

/// Split content into the YAML block and the body that follows it.
fn split_frontmatter<'a>(content: &'a str, path: &NormalizedPath) -> Result<(&'a str, &'a str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().unwrap_or_default();
    if first.trim_end_matches(['\r', '\n']) != "---" {
        return Err(Error::MissingFrontmatter {
            path: path.to_native(),
        });
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(Error::UnterminatedFrontmatter {
        path: path.to_native(),
    })
}
