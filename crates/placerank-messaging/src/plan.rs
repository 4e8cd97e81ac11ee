use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;
use crate::template::MessageTemplate;

/// Backend identifier of a messaging contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The template plus the selected contacts, in send order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignPlan {
    pub template: MessageTemplate,
    pub contacts: Vec<Contact>,
}

impl CampaignPlan {
    /// Check the plan before any backend call is made.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::InvalidPlan`] if the template has no
    /// non-blank part, or a contact id is blank or duplicated.
    pub fn validate(&self) -> Result<(), MessagingError> {
        if self.template.parts.iter().all(|p| p.trim().is_empty()) {
            return Err(MessagingError::InvalidPlan(format!(
                "template '{}' has no message parts",
                self.template.name
            )));
        }

        let mut seen = HashSet::new();
        for contact in &self.contacts {
            if contact.id.0.trim().is_empty() {
                return Err(MessagingError::InvalidPlan(
                    "contact id must be non-empty".to_string(),
                ));
            }
            if !seen.insert(&contact.id) {
                return Err(MessagingError::InvalidPlan(format!(
                    "duplicate contact id: '{}'",
                    contact.id
                )));
            }
        }
        Ok(())
    }
}

/// Load and validate a campaign plan from a YAML file.
///
/// # Errors
///
/// Returns `MessagingError` if the file cannot be read, parsed, or fails validation.
pub fn load_campaign_plan(path: &Path) -> Result<CampaignPlan, MessagingError> {
    let content = std::fs::read_to_string(path).map_err(|e| MessagingError::PlanFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let plan: CampaignPlan = serde_yaml::from_str(&content)?;
    plan.validate()?;
    Ok(plan)
}
