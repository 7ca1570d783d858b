use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::temporal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Primary,
    Secondary,
    Accent,
    Muted,
}

impl NoteColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Accent => "accent",
            Self::Muted => "muted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            "accent" => Some(Self::Accent),
            "muted" => Some(Self::Muted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: NoteColor,
    #[serde(default, with = "temporal::opt_day")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_expanded: Option<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            color: NoteColor::default(),
            date: Some(temporal::today()),
            ai_expanded: None,
        }
    }

    /// Add a tag unless already present. Tags behave as a set.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive match on title, content or tags.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q)
            || self.content.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_note_loads_with_defaults() {
        let json = r#"{"id":"1712","content":"buy milk","date":"19.10.2026","title":"x"}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(note.tags.is_empty());
        assert_eq!(note.color, NoteColor::Primary);
        assert_eq!(note.date, NaiveDate::from_ymd_opt(2026, 10, 19));
    }

    #[test]
    fn tags_are_a_set() {
        let mut n = Note::new("t", "c");
        n.add_tag("work");
        n.add_tag("work");
        n.add_tag("  ");
        assert_eq!(n.tags, vec!["work".to_string()]);
        assert!(n.matches("WOR"));
    }
}
