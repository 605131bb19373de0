/// Persisted data model for the Socrates companion extension
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Storage keys under chrome.storage.local
pub mod keys {
    pub const LEARNING_MODE: &str = "learningMode";
    pub const NOTIFICATIONS_ENABLED: &str = "notificationsEnabled";
    pub const LAST_PROBLEM_ID: &str = "lastProblemId";
    pub const SESSION_HISTORY: &str = "sessionHistory";
    pub const CURRENT_QUESTION: &str = "currentQuestion";
    pub const LAST_UPDATED: &str = "lastUpdated";
}

/// How much scaffolding the tutor gives the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningMode {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl LearningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningMode::Beginner => "beginner",
            LearningMode::Intermediate => "intermediate",
            LearningMode::Advanced => "advanced",
        }
    }
}

/// Extension preferences, written once at install time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub learning_mode: LearningMode,
    pub notifications_enabled: bool,
    pub last_problem_id: Option<String>,
    pub session_history: Vec<SessionRecord>,
}

impl Preferences {
    /// Flat key/value entries as chrome.storage.local stores them
    pub fn default_entries() -> Map<String, Value> {
        let defaults = Preferences::default();
        let mut entries = Map::new();
        entries.insert(keys::LEARNING_MODE.to_string(), json!(defaults.learning_mode));
        entries.insert(
            keys::NOTIFICATIONS_ENABLED.to_string(),
            json!(defaults.notifications_enabled),
        );
        entries.insert(keys::LAST_PROBLEM_ID.to_string(), json!(defaults.last_problem_id));
        entries.insert(keys::SESSION_HISTORY.to_string(), json!(defaults.session_history));
        entries
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            learning_mode: LearningMode::default(),
            notifications_enabled: true,
            last_problem_id: None,
            session_history: Vec::new(),
        }
    }
}

/// One entry in the append-only session history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub mode: LearningMode,
    pub started_at: String,
}

impl SessionRecord {
    pub fn new(mode: LearningMode, started_at: String) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4().to_string(),
            mode,
            started_at,
        }
    }
}

/// The question most recently captured from a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuestion {
    pub current_question: String,
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = Preferences::default();

        assert_eq!(prefs.learning_mode, LearningMode::Beginner);
        assert!(prefs.notifications_enabled);
        assert_eq!(prefs.last_problem_id, None);
        assert!(prefs.session_history.is_empty());
    }

    #[test]
    fn test_default_entries_match_install_contract() {
        let entries = Preferences::default_entries();

        assert_eq!(entries.get(keys::LEARNING_MODE), Some(&json!("beginner")));
        assert_eq!(entries.get(keys::NOTIFICATIONS_ENABLED), Some(&json!(true)));
        assert_eq!(entries.get(keys::LAST_PROBLEM_ID), Some(&Value::Null));
        assert_eq!(entries.get(keys::SESSION_HISTORY), Some(&json!([])));
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn test_learning_mode_wire_format() {
        assert_eq!(serde_json::to_value(LearningMode::Beginner).unwrap(), json!("beginner"));
        assert_eq!(serde_json::to_value(LearningMode::Advanced).unwrap(), json!("advanced"));

        let mode: LearningMode = serde_json::from_value(json!("intermediate")).unwrap();
        assert_eq!(mode, LearningMode::Intermediate);
    }

    #[test]
    fn test_session_record_ids_unique() {
        let a = SessionRecord::new(LearningMode::Beginner, "2024-10-28T10:30:00.000Z".to_string());
        let b = SessionRecord::new(LearningMode::Beginner, "2024-10-28T10:30:00.000Z".to_string());

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_current_question_serialization() {
        let question = CurrentQuestion {
            current_question: "What is Big-O?".to_string(),
            last_updated: "2024-10-28T10:30:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&question).unwrap();

        assert_eq!(json["currentQuestion"], "What is Big-O?");
        assert_eq!(json["lastUpdated"], "2024-10-28T10:30:00.000Z");
    }

    #[test]
    fn test_session_record_serialization() {
        let record = SessionRecord::new(LearningMode::Advanced, "2024-10-28T10:30:00.000Z".to_string());

        let json = serde_json::to_string(&record).unwrap();
        let deserialized: SessionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, record);
        assert!(json.contains("\"startedAt\""));
    }
}
