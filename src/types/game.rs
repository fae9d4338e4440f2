//! Game records: rows written to the hosted store, the round history fed
//! to the analysis call, and the analysis report itself.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::chat::{ChatMessage, Role};
use crate::persona::{Gender, Persona};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Server-assigned row id.
///
/// Opaque: whatever scalar the store returns (integer or uuid string) is
/// passed back to it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct RecordId(Value);

impl RecordId {
    /// Wrap a scalar. Null, arrays, objects and empty strings are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match &value {
            Value::Number(_) => Some(Self(value)),
            Value::String(s) if !s.is_empty() => Some(Self(value)),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl TryFrom<Value> for RecordId {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value.clone())
            .ok_or_else(|| format!("expected a number or non-empty string id, got {value}"))
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(Value::from(id))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Insert payload for `users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub nickname: String,
    pub gender: Gender,
    pub marketing_agree: bool,
}

/// Insert payload for `game_sessions`. Outcome fields start out null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameSession {
    pub user_id: RecordId,
    pub final_choice: Option<String>,
    pub my_persona: Option<String>,
    pub ideal_preference: Option<String>,
}

/// Patch applied to `game_sessions` once, when the game ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub final_choice: String,
    pub my_persona: String,
    pub ideal_preference: String,
}

/// Insert payload for `chat_logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatLog {
    pub session_id: RecordId,
    pub partner_type: Persona,
    /// Never contains system entries.
    pub chat_history: Vec<ChatMessage>,
    pub turn_count: u32,
}

impl NewChatLog {
    pub fn new(
        session_id: RecordId,
        partner_type: Persona,
        history: &[ChatMessage],
        turn_count: u32,
    ) -> Self {
        Self {
            session_id,
            partner_type,
            chat_history: history
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned()
                .collect(),
            turn_count,
        }
    }
}

/// Flat insert payload for `analysis_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub session_id: RecordId,
    pub style: Option<String>,
    pub user_type: Option<String>,
    pub keywords: Vec<String>,
    pub strength: Option<String>,
    pub weakness: Option<String>,
    pub best_match: Option<String>,
    pub best_reason: Option<String>,
    pub similar_style: Option<String>,
    pub similar_chemistry: Option<String>,
    pub opposite_style: Option<String>,
    pub opposite_chemistry: Option<String>,
    pub positive: Option<String>,
    pub improvement: Option<String>,
    pub dating_tip: Option<String>,
    pub warning: Option<String>,
    pub summary: Option<String>,
}

// ---------------------------------------------------------------------------
// Round history
// ---------------------------------------------------------------------------

/// One finished round, as handed to the session analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundRecord {
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub persona: Option<Persona>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, alias = "finalScore")]
    pub final_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Analysis report
// ---------------------------------------------------------------------------

/// The player's own dating profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub style: Option<String>,
    pub user_type: Option<String>,
    #[serde(deserialize_with = "lenient_keywords")]
    pub keywords: Vec<String>,
    pub strength: Option<String>,
    pub weakness: Option<String>,
}

/// Accept a keyword list, or one comma-separated string.
fn lenient_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let split = |s: &str| -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    };

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(s) => split(&s),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdealMatch {
    pub best_match: Option<String>,
    pub best_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chemistry {
    pub style: Option<String>,
    pub chemistry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compatibility {
    pub similar: Chemistry,
    pub opposite: Chemistry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    pub positive: Option<String>,
    pub improvement: Option<String>,
    pub dating_tip: Option<String>,
    pub warning: Option<String>,
}

/// Structured compatibility report for a whole session.
///
/// Every section is optional on the wire; absent parts default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionAnalysis {
    pub my_persona: PlayerProfile,
    pub ideal_match: IdealMatch,
    pub compatibility: Compatibility,
    pub feedback: Feedback,
    pub summary: Option<String>,
}

impl SessionAnalysis {
    /// Flatten into the `analysis_results` column set.
    pub fn to_row(&self, session_id: RecordId) -> AnalysisRow {
        AnalysisRow {
            session_id,
            style: self.my_persona.style.clone(),
            user_type: self.my_persona.user_type.clone(),
            keywords: self.my_persona.keywords.clone(),
            strength: self.my_persona.strength.clone(),
            weakness: self.my_persona.weakness.clone(),
            best_match: self.ideal_match.best_match.clone(),
            best_reason: self.ideal_match.best_reason.clone(),
            similar_style: self.compatibility.similar.style.clone(),
            similar_chemistry: self.compatibility.similar.chemistry.clone(),
            opposite_style: self.compatibility.opposite.style.clone(),
            opposite_chemistry: self.compatibility.opposite.chemistry.clone(),
            positive: self.feedback.positive.clone(),
            improvement: self.feedback.improvement.clone(),
            dating_tip: self.feedback.dating_tip.clone(),
            warning: self.feedback.warning.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// Result of the analysis call: a report, or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Failed { error: String },
    Completed(SessionAnalysis),
}

impl AnalysisOutcome {
    pub fn analysis(&self) -> Option<&SessionAnalysis> {
        match self {
            Self::Completed(a) => Some(a),
            Self::Failed { .. } => None,
        }
    }
}
