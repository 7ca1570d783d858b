use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::temporal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Today,
    Later,
    Ideas,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Later => "later",
            Self::Ideas => "ideas",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "later" => Some(Self::Later),
            "ideas" => Some(Self::Ideas),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default, alias = "text")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "dueDate", with = "temporal::opt_day")]
    pub deadline: Option<NaiveDate>,
    #[serde(default = "temporal::now", with = "temporal::datetime")]
    pub created_at: NaiveDateTime,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            title: title.into(),
            description: None,
            completed: false,
            priority: Priority::default(),
            category: Category::default(),
            tags: Vec::new(),
            deadline: None,
            created_at: temporal::now(),
        }
    }

    /// Flip completion and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Tasks that belong on today's plan: filed under "today" or due today
    /// or earlier.
    pub fn is_for_today(&self, today: NaiveDate) -> bool {
        self.category == Category::Today || self.deadline.is_some_and(|d| d <= today)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.deadline.is_some_and(|d| d < today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_selection() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut t = Task::new("write report");
        assert!(t.is_for_today(today));

        t.category = Category::Later;
        assert!(!t.is_for_today(today));

        t.deadline = Some(today);
        assert!(t.is_for_today(today));
        assert!(!t.is_overdue(today));

        t.deadline = today.pred_opt();
        assert!(t.is_overdue(today));
        t.toggle();
        assert!(!t.is_overdue(today));
    }

    #[test]
    fn legacy_task_without_created_at() {
        let json = r#"{"id":"1","text":"call mom","priority":"high","dueDate":"2026-10-20"}"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert_eq!(t.title, "call mom");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.deadline, NaiveDate::from_ymd_opt(2026, 10, 20));
        assert_eq!(t.category, Category::Today);
    }
}
