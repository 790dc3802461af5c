//! Campaign configuration passed to [`ScriptHost::init`](crate::ScriptHost::init).
//!
//! The configuration is a structured document rooted at `<campaign-script>`:
//!
//! ```text
//! <campaign-script variant="mission" title="Pirate Frontier">
//!   <objective id="destroy-pirate-base" title="..." description="..."/>
//!   <message id="intro" audience="receive" payload="video/intro"/>
//!   ...variant-specific children...
//! </campaign-script>
//! ```
//!
//! The host reads the common part here. Variant-specific children are left
//! in [`ScriptConfig::document`] for the selected script to interpret.

use core::str::FromStr;

use campaign_types::{MessageAudience, Objective, ParseEnumError, VideoMessage, XElement};

use crate::error::ScriptError;
use crate::stores::objective_from_node;

/// Name of the configuration root element.
pub const CONFIG_ROOT: &str = "campaign-script";

/// The script implementations shipped with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptVariant {
    /// Data-driven mission script built from trigger rules.
    Mission,
    /// Free-play script: defeat every rival.
    Skirmish,
}

impl ScriptVariant {
    /// The name used in the `variant` attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::Skirmish => "skirmish",
        }
    }
}

impl FromStr for ScriptVariant {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mission" => Ok(Self::Mission),
            "skirmish" => Ok(Self::Skirmish),
            other => Err(ParseEnumError::new("script variant", other)),
        }
    }
}

/// Parsed campaign configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Variant name, as written in the document.
    pub variant: String,
    /// Campaign title.
    pub title: String,
    /// Objectives seeded at init, in document order.
    pub objectives: Vec<Objective>,
    /// Messages seeded at init, in document order.
    pub messages: Vec<VideoMessage>,
    /// The whole configuration document, for variant-specific parsing.
    pub document: XElement,
}

impl ScriptConfig {
    /// Parse the common part of a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Config`] if the root is wrong, `variant` or
    /// `title` is missing, or any objective or message entry is malformed
    /// or duplicated.
    pub fn from_document(doc: &XElement) -> Result<Self, ScriptError> {
        let root = doc
            .expect_name(CONFIG_ROOT)
            .map_err(|e| ScriptError::config(e.to_string()))?;
        let variant = root
            .require("variant")
            .map_err(|e| ScriptError::config(e.to_string()))?;
        let title = root
            .require("title")
            .map_err(|e| ScriptError::config(e.to_string()))?;

        let mut objectives: Vec<Objective> = Vec::new();
        for node in root.children_named("objective") {
            let objective =
                objective_from_node(node).map_err(|e| ScriptError::config(e.to_string()))?;
            if objectives.iter().any(|o| o.id == objective.id) {
                return Err(ScriptError::config(format!(
                    "objective '{}' is declared twice",
                    objective.id
                )));
            }
            objectives.push(objective);
        }

        let mut messages: Vec<VideoMessage> = Vec::new();
        for node in root.children_named("message") {
            let message = message_from_node(node)?;
            if messages
                .iter()
                .any(|m| m.id == message.id && m.audience == message.audience)
            {
                return Err(ScriptError::config(format!(
                    "message '{}' is declared twice",
                    message.id
                )));
            }
            messages.push(message);
        }

        Ok(Self {
            variant: variant.to_owned(),
            title: title.to_owned(),
            objectives,
            messages,
            document: root.clone(),
        })
    }

    /// The built-in variant named by the document, if it is one.
    pub fn builtin_variant(&self) -> Result<ScriptVariant, ScriptError> {
        self.variant
            .parse()
            .map_err(|e: ParseEnumError| ScriptError::config(e.to_string()))
    }
}

fn message_from_node(node: &XElement) -> Result<VideoMessage, ScriptError> {
    let audience: MessageAudience = node
        .parse("audience")
        .map_err(|e| ScriptError::config(e.to_string()))?
        .unwrap_or(MessageAudience::Receive);
    let id = node
        .require("id")
        .map_err(|e| ScriptError::config(e.to_string()))?;
    let payload = node
        .require("payload")
        .map_err(|e| ScriptError::config(e.to_string()))?;
    Ok(VideoMessage::new(id, audience, payload))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> XElement {
        XElement::new(CONFIG_ROOT)
            .with("variant", "mission")
            .with("title", "Pirate Frontier")
            .with_child(
                XElement::new("objective")
                    .with("id", "destroy-pirate-base")
                    .with("title", "Destroy the pirate base"),
            )
            .with_child(
                XElement::new("message")
                    .with("id", "intro")
                    .with("payload", "video/intro"),
            )
    }

    #[test]
    fn parses_common_part() {
        let parsed = ScriptConfig::from_document(&config()).unwrap();
        assert_eq!(parsed.variant, "mission");
        assert_eq!(parsed.builtin_variant().unwrap(), ScriptVariant::Mission);
        assert_eq!(parsed.objectives.len(), 1);
        assert_eq!(
            parsed.messages.first().map(|m| m.audience),
            Some(MessageAudience::Receive)
        );
    }

    #[test]
    fn missing_variant_is_a_config_error() {
        let doc = XElement::new(CONFIG_ROOT).with("title", "No variant");
        assert!(matches!(
            ScriptConfig::from_document(&doc),
            Err(ScriptError::Config { .. })
        ));
    }

    #[test]
    fn wrong_root_is_a_config_error() {
        let doc = XElement::new("campaign").with("variant", "mission");
        assert!(matches!(
            ScriptConfig::from_document(&doc),
            Err(ScriptError::Config { .. })
        ));
    }

    #[test]
    fn duplicate_objective_is_rejected() {
        let doc = config().with_child(
            XElement::new("objective")
                .with("id", "destroy-pirate-base")
                .with("title", "Again"),
        );
        assert!(ScriptConfig::from_document(&doc).is_err());
    }

    #[test]
    fn unknown_variant_is_reported() {
        let doc = XElement::new(CONFIG_ROOT)
            .with("variant", "tutorial")
            .with("title", "T");
        let parsed = ScriptConfig::from_document(&doc).unwrap();
        assert!(matches!(
            parsed.builtin_variant(),
            Err(ScriptError::Config { .. })
        ));
    }
}
