//! Entity back to markdown with YAML frontmatter

use crate::entity::Entity;
use crate::{Error, Result};

/// Renders an entity as file content.
pub trait EntitySerializer {
    fn serialize(&self, entity: &Entity) -> Result<String>;
}

/// Default serializer: `---\n<yaml>---\n<body>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlSerializer;

impl YamlSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl EntitySerializer for YamlSerializer {
    fn serialize(&self, entity: &Entity) -> Result<String> {
        let yaml = serde_yaml::to_string(&entity.frontmatter).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        let yaml = if yaml.ends_with('\n') { yaml } else { format!("{}\n", yaml) };
        Ok(format!("---\n{}---\n{}", yaml, entity.body))
    }
}
