//! Mentor persona registry.
//!
//! Each mentor is a named system-prompt profile presented as a distinct chat
//! identity. The registry is built from config entries when present, falling
//! back to the built-in roster, and is validated once at startup. Unknown
//! mentor ids resolve to the default mentor rather than erroring.

use std::collections::HashMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::MentorConfig;

/// A mentor persona: fixed reference data for one chat identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    pub id: String,
    pub display_name: String,
    pub expertise: String,
    pub system_prompt: String,
    pub welcome_message: String,
}

/// Lookup table of mentors with an explicit default fallback.
#[derive(Debug, Clone)]
pub struct MentorRegistry {
    mentors: HashMap<String, Mentor>,
    default_id: String,
}

pub const DEFAULT_MENTOR_ID: &str = "sarah";

impl MentorRegistry {
    /// The built-in roster: Sarah Chen (Excel) and Marcus Rodriguez (SQL).
    #[must_use]
    pub fn built_in() -> Self {
        let mentors = vec![
            Mentor {
                id: "sarah".to_string(),
                display_name: "Sarah Chen".to_string(),
                expertise: "Excel".to_string(),
                system_prompt: "You are Sarah Chen, an experienced Excel mentor with 10+ years \
                                of business analysis experience. You specialize in Excel \
                                formulas, pivot tables, data visualization, and business \
                                reporting. Provide practical, step-by-step guidance with \
                                real-world examples."
                    .to_string(),
                welcome_message: "Hi! I'm Sarah Chen, your Excel mentor with 10+ years of \
                                  business analysis experience. What Excel challenge can I help \
                                  you with today?"
                    .to_string(),
            },
            Mentor {
                id: "marcus".to_string(),
                display_name: "Marcus Rodriguez".to_string(),
                expertise: "SQL".to_string(),
                system_prompt: "You are Marcus Rodriguez, a senior data engineer with 8+ years \
                                of database experience. You specialize in SQL query \
                                optimization, database design, and performance tuning. Focus on \
                                best practices, efficient queries, and scalable solutions. \
                                Explain concepts clearly and always consider performance \
                                implications."
                    .to_string(),
                welcome_message: "Hello! I'm Marcus Rodriguez, a senior data engineer with 8+ \
                                  years of database experience. I'm here to help you master SQL \
                                  queries, optimization, and database design. What SQL \
                                  challenge are you working on?"
                    .to_string(),
            },
        ];

        Self {
            mentors: mentors.into_iter().map(|m| (m.id.clone(), m)).collect(),
            default_id: DEFAULT_MENTOR_ID.to_string(),
        }
    }

    /// Build a registry from config entries, validating required fields.
    ///
    /// An empty entry list yields the built-in roster. The first configured
    /// mentor becomes the default fallback.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids or empty required fields.
    pub fn from_config(entries: &[MentorConfig]) -> Result<Self> {
        if entries.is_empty() {
            return Ok(Self::built_in());
        }

        let mut mentors = HashMap::new();
        for entry in entries {
            if entry.id.trim().is_empty() {
                bail!("Mentor entry has an empty id");
            }
            for (field, value) in [
                ("display_name", &entry.display_name),
                ("expertise", &entry.expertise),
                ("system_prompt", &entry.system_prompt),
                ("welcome_message", &entry.welcome_message),
            ] {
                if value.trim().is_empty() {
                    bail!("Mentor '{}' is missing required field '{field}'", entry.id);
                }
            }

            let mentor = Mentor {
                id: entry.id.clone(),
                display_name: entry.display_name.clone(),
                expertise: entry.expertise.clone(),
                system_prompt: entry.system_prompt.clone(),
                welcome_message: entry.welcome_message.clone(),
            };

            if mentors.insert(mentor.id.clone(), mentor).is_some() {
                bail!("Duplicate mentor id '{}'", entry.id);
            }
        }

        Ok(Self {
            mentors,
            default_id: entries[0].id.clone(),
        })
    }

    /// Resolve a mentor id, falling back to the default for unknown or
    /// absent ids.
    #[must_use]
    pub fn resolve(&self, id: Option<&str>) -> &Mentor {
        id.and_then(|id| self.mentors.get(id))
            .unwrap_or_else(|| &self.mentors[&self.default_id])
    }

    /// Look up a mentor by exact id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Mentor> {
        self.mentors.get(id)
    }

    /// All mentors, sorted by id for stable display.
    #[must_use]
    pub fn all(&self) -> Vec<&Mentor> {
        let mut mentors: Vec<_> = self.mentors.values().collect();
        mentors.sort_by(|a, b| a.id.cmp(&b.id));
        mentors
    }

    /// The fallback mentor id.
    #[must_use]
    pub fn default_id(&self) -> &str {
        &self.default_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_has_sarah_and_marcus() {
        let registry = MentorRegistry::built_in();
        assert_eq!(registry.get("sarah").unwrap().expertise, "Excel");
        assert_eq!(registry.get("marcus").unwrap().expertise, "SQL");
        assert_eq!(registry.default_id(), "sarah");
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let registry = MentorRegistry::built_in();
        assert_eq!(registry.resolve(Some("nobody")).id, "sarah");
        assert_eq!(registry.resolve(None).id, "sarah");
        assert_eq!(registry.resolve(Some("marcus")).id, "marcus");
    }

    #[test]
    fn empty_config_uses_built_in_roster() {
        let registry = MentorRegistry::from_config(&[]).unwrap();
        assert!(registry.get("sarah").is_some());
    }

    fn entry(id: &str) -> MentorConfig {
        MentorConfig {
            id: id.to_string(),
            display_name: "Name".to_string(),
            expertise: "Topic".to_string(),
            system_prompt: "Prompt".to_string(),
            welcome_message: "Welcome".to_string(),
        }
    }

    #[test]
    fn first_configured_mentor_is_default() {
        let registry = MentorRegistry::from_config(&[entry("ada"), entry("alan")]).unwrap();
        assert_eq!(registry.default_id(), "ada");
        assert_eq!(registry.resolve(Some("grace")).id, "ada");
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = MentorRegistry::from_config(&[entry("ada"), entry("ada")]).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn empty_required_field_rejected() {
        let mut bad = entry("ada");
        bad.system_prompt = "  ".to_string();
        let err = MentorRegistry::from_config(&[bad]).unwrap_err();
        assert!(err.to_string().contains("system_prompt"));
    }
}
