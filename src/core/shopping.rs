use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    #[default]
    Daily,
    Wishlist,
}

impl ListType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "wishlist" => Some(Self::Wishlist),
            _ => None,
        }
    }
}

pub const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub list_type: ListType,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub items: Vec<ShoppingItem>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl ShoppingList {
    pub fn new(name: impl Into<String>, list_type: ListType, category: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            list_type,
            category: category.into(),
            items: Vec::new(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Daily shopping", ListType::Daily, "groceries"),
            Self::new("Wishlist", ListType::Wishlist, "personal"),
        ]
    }

    /// Append an item; it inherits the list's category.
    pub fn add_item(&mut self, name: impl Into<String>, price: Option<f64>) -> &ShoppingItem {
        self.items.push(ShoppingItem {
            id: super::new_id(),
            name: name.into(),
            completed: false,
            price,
            notes: None,
            category: self.category.clone(),
        });
        &self.items[self.items.len() - 1]
    }

    /// Returns the item's new state, or `None` when no such item exists.
    pub fn toggle_item(&mut self, item_id: &str) -> Option<bool> {
        let item = self.items.iter_mut().find(|i| i.id == item_id)?;
        item.completed = !item.completed;
        Some(item.completed)
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|i| !i.completed).count()
    }

    /// Sum of known prices for items not yet bought.
    pub fn open_total(&self) -> f64 {
        self.items
            .iter()
            .filter(|i| !i.completed)
            .filter_map(|i| i.price)
            .sum()
    }
}
