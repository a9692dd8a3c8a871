//! Agent definition model and the collaborators the sync engine consumes.
//!
//! Each collaborator is a trait with a default implementation so the engine
//! can be driven with test doubles:
//!
//! - [`EntityParser`] / [`FrontmatterParser`]: markdown + YAML frontmatter into an [`Entity`]
//! - [`EntityValidator`] / [`SchemaValidator`]: per-format schema rules
//! - [`FormatConverter`] / [`SchemaConverter`]: conversion between client schemas
//! - [`EntitySerializer`] / [`YamlSerializer`]: [`Entity`] back to markdown
//! - [`ManifestLoader`] / [`ManifestDiscovery`]: the canonical manifest

pub mod convert;
pub mod entity;
pub mod error;
pub mod format;
pub mod manifest;
pub mod parser;
pub mod serialize;
pub mod validation;

pub use convert::{FormatConverter, SchemaConverter};
pub use entity::{BaseAgent, ClaudeCodeAgent, Entity, Frontmatter, OpenCodeAgent, Permission};
pub use error::{Error, Result};
pub use format::Format;
pub use manifest::{
    AgentManifest, CanonicalItem, DiscoveredManifest, ManifestDiscovery, ManifestLoader,
};
pub use parser::{EntityParser, FrontmatterParser};
pub use serialize::{EntitySerializer, YamlSerializer};
pub use validation::{EntityValidator, SchemaValidator, ValidationIssue, ValidationReport};
