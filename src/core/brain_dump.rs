use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::temporal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpStatus {
    #[default]
    Unsorted,
    Sorted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainDumpEntry {
    pub id: String,
    #[serde(default, alias = "text")]
    pub content: String,
    #[serde(default, with = "temporal::opt_day")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: DumpStatus,
}

impl BrainDumpEntry {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            content: content.into(),
            date: Some(temporal::today()),
            status: DumpStatus::Unsorted,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.status == DumpStatus::Sorted
    }
}
