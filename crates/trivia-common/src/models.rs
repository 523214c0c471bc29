//! Upstream model table: per-model generation parameters and the ordered fallback list.

use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Generation parameters for one upstream model. Unset fields are omitted from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Forwarded as `generationConfig.thinkingConfig.thinkingLevel`.
    #[serde(default)]
    pub thinking_level: Option<String>,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl ModelProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: None,
            max_output_tokens: None,
            thinking_level: None,
            system_instruction: None,
        }
    }

    pub fn has_generation_config(&self) -> bool {
        self.temperature.is_some() || self.max_output_tokens.is_some() || self.thinking_level.is_some()
    }
}

/// Built-in table used when no config file provides `[[models]]`.
pub fn default_profiles() -> Vec<ModelProfile> {
    vec![
        ModelProfile {
            name: "gemini-3-pro-preview".to_string(),
            // thinking requires temperature 1
            temperature: Some(1.0),
            max_output_tokens: None,
            thinking_level: Some("MEDIUM".to_string()),
            system_instruction: Some(
                "Always answer in valid JSON. Be educational, use clear analogies, \
                 and explain the real consequences of security risks."
                    .to_string(),
            ),
        },
        ModelProfile::named("gemini-1.5-flash"),
        ModelProfile::named("gemini-pro"),
    ]
}

/// Priority-ordered, non-empty, read-only list of upstream models.
#[derive(Debug, Clone)]
pub struct ModelList {
    models: Vec<ModelProfile>,
}

impl ModelList {
    pub fn new(models: Vec<ModelProfile>) -> Result<Self, ConfigError> {
        if models.is_empty() {
            return Err(ConfigError::EmptyModelList);
        }
        Ok(Self { models })
    }

    /// Bounds-checked lookup; negative or too-large indices are a configuration error.
    pub fn get(&self, index: i64) -> Result<&ModelProfile, ConfigError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.models.get(i))
            .ok_or(ConfigError::ModelIndexOutOfRange { index, len: self.models.len() })
    }

    /// Index of the next less-preferred model, if one exists.
    pub fn next_index(&self, index: i64) -> Option<i64> {
        let next = index.checked_add(1)?;
        self.get(next).ok().map(|_| next)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelProfile> {
        self.models.iter()
    }
}
