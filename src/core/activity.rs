use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    Mood,
    Task,
    Note,
    Habit,
    Plan,
    BrainDump,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mood => "mood",
            Self::Task => "task",
            Self::Note => "note",
            Self::Habit => "habit",
            Self::Plan => "plan",
            Self::BrainDump => "brain-dump",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
}

impl Activity {
    pub fn new(text: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            id: super::new_id(),
            text: text.into(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_record_loads() {
        let json = r#"{"id":"1712345678901","text":"Dodano notatkę","timestamp":"2026-10-19T08:15:00.000Z","type":"brain-dump"}"#;
        let a: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(a.kind, ActivityKind::BrainDump);
        assert_eq!(a.kind.as_str(), "brain-dump");
    }
}
