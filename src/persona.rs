//! Persona identity and system prompt
//!
//! The default persona is compiled into the binary; a JSON or TOML file can
//! replace it at startup.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Embedded persona data, keyed by persona ID
const EMBEDDED_PERSONAS: &[(&str, &str)] =
    &[("jennifer", include_str!("../personas/jennifer.json"))];

/// ID of the persona used when nothing else is configured
pub const DEFAULT_PERSONA_ID: &str = "jennifer";

/// The identity the model speaks as
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Unique identifier
    pub id: String,

    /// Display name, also used to label assistant turns in alerts
    pub name: String,

    /// Short descriptive phrase
    #[serde(default)]
    pub tagline: Option<String>,

    /// Fixed instruction sent with every model call
    pub system_prompt: String,
}

impl Persona {
    /// Load an embedded persona compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if persona ID is not found in embedded data
    pub fn embedded(persona_id: &str) -> Result<Self> {
        let (_, json) = EMBEDDED_PERSONAS
            .iter()
            .find(|(id, _)| *id == persona_id)
            .ok_or_else(|| Error::PersonaNotFound(persona_id.to_string()))?;
        let persona: Self = serde_json::from_str(json)?;
        tracing::debug!(persona_id, "loaded persona from embedded data");
        Ok(persona)
    }

    /// Load a persona from file (JSON, or TOML when the extension is `.toml`)
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or has an empty
    /// system prompt
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let persona: Self = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        if persona.system_prompt.trim().is_empty() {
            return Err(Error::Config(format!(
                "persona file {} has an empty system prompt",
                path.display()
            )));
        }

        tracing::info!(
            persona_id = %persona.id,
            path = %path.display(),
            "loaded persona from file"
        );
        Ok(persona)
    }
}

// The system prompt stays out of logs; only its size is shown
impl fmt::Debug for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persona")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tagline", &self.tagline)
            .field("system_prompt_chars", &self.system_prompt.chars().count())
            .finish()
    }
}
