use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::document::DocumentSearch;
use crate::policy::FieldPolicy;
use crate::sql::{DateOverride, SqlSearch};

/// Field policies for both backends, usually read from a YAML file:
///
/// ```yaml
/// document:
///   any: [front, back, tag]
///   isString: [front, back]
///   isDate: [nextReview]
/// relational:
///   anyOf: [name, body]
/// dateOverride: defaultOperatorOnly
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub document: FieldPolicy,
    #[serde(default)]
    pub relational: FieldPolicy,
    #[serde(default)]
    pub date_override: DateOverride,
}

impl Config {
    fn validate(&self) -> Result<()> {
        for (backend, policy) in [("document", &self.document), ("relational", &self.relational)] {
            let lists = [
                ("any", policy.any()),
                ("isString", policy.is_string()),
                ("isDate", policy.is_date()),
            ];
            for (name, fields) in lists {
                if fields.unwrap_or_default().iter().any(|f| f.trim().is_empty()) {
                    bail!("{backend}.{name} contains an empty field name");
                }
            }
        }
        Ok(())
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(source).context("config is malformed")?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`; a missing file yields the default config.
    pub fn load_with(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_yaml(&source).with_context(|| format!("in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let source = serde_yml::to_string(self).context("failed to serialize config")?;
        std::fs::write(path, source)
            .with_context(|| format!("failed to write config at {}", path.display()))
    }

    pub fn document_search(&self) -> DocumentSearch {
        DocumentSearch::new(self.document.clone())
    }

    pub fn sql_search(&self) -> SqlSearch {
        SqlSearch::new(self.relational.clone()).with_date_override(self.date_override)
    }
}
