//! Collection log documents.
//!
//! Reads the JSON log either as returned by the collectionlog.net API
//! (wrapped in `collectionLog`, entries shaped `{"items": [...]}`) or as a
//! manual export (no wrapper, entries may be bare item lists). Tabs are
//! folded into five fixed sections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AccountVariant, ItemId, ObtainedSet};

/// Treasure trail entries in display order; other clue entries follow.
pub const CLUE_ORDER: [&str; 10] = [
    "Beginner Treasure Trails",
    "Easy Treasure Trails",
    "Medium Treasure Trails",
    "Hard Treasure Trails",
    "Elite Treasure Trails",
    "Master Treasure Trails",
    "Hard Treasure Trails (Rare)",
    "Elite Treasure Trails (Rare)",
    "Master Treasure Trails (Rare)",
    "Shared Treasure Trail Rewards",
];

#[derive(Debug, Error)]
pub enum LogParseError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Collection log must be a JSON object")]
    NotAnObject,
}

/// Top-level grouping of collection log tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Section {
    Bosses,
    Raids,
    Clues,
    Minigames,
    Other,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Bosses,
        Section::Raids,
        Section::Clues,
        Section::Minigames,
        Section::Other,
    ];

    /// Known tab names map to their section; anything else is `Other`.
    pub fn from_tab_name(name: &str) -> Self {
        match name {
            "Bosses" => Section::Bosses,
            "Raids" => Section::Raids,
            "Clues" => Section::Clues,
            "Minigames" => Section::Minigames,
            _ => Section::Other,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Bosses => "Bosses",
            Section::Raids => "Raids",
            Section::Clues => "Clues",
            Section::Minigames => "Minigames",
            Section::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogItem {
    pub id: ItemId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub obtained: bool,

    #[serde(default)]
    pub quantity: u32,

    #[serde(rename = "obtainedAt", default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<String>,
}

impl LogItem {
    fn obtained_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.obtained_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub name: String,
    pub items: Vec<LogItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSection {
    pub section: Section,
    pub entries: Vec<LogEntry>,
}

/// Obtained and total item counts for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub section: Section,
    pub obtained: u32,
    pub total: u32,
}

/// Number of recent items reported by default.
pub const DEFAULT_RECENT_ITEMS: usize = 12;

/// Condensed view of a log for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    pub username: String,
    pub account_type: String,
    pub account_variant: AccountVariant,
    pub unique_obtained: u32,
    pub unique_items: u32,
    pub obtained: Vec<ItemId>,
    pub category_counts: Vec<CategoryCount>,
    pub recent_items: Vec<LogItem>,
}

/// A player's collection log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionLog {
    pub username: String,
    pub account_type: String,
    pub unique_obtained: u32,
    pub unique_items: u32,
    pub sections: Vec<LogSection>,
}

fn entry_items(entry_name: &str, data: &Value) -> Vec<LogItem> {
    let raw = match data {
        Value::Object(obj) => match obj.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        Value::Array(items) => items.as_slice(),
        _ => return Vec::new(),
    };

    raw.iter()
        .filter_map(|item| match serde_json::from_value::<LogItem>(item.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping unreadable item in '{}': {}", entry_name, e);
                None
            }
        })
        .collect()
}

fn sort_entries(section: Section, entries: BTreeMap<String, Vec<LogItem>>) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = entries
        .into_iter()
        .map(|(name, items)| LogEntry { name, items })
        .collect();

    if section == Section::Clues {
        // Known trails by fixed position; the stable sort keeps the rest alphabetical.
        entries.sort_by_key(|e| {
            CLUE_ORDER
                .iter()
                .position(|known| *known == e.name)
                .unwrap_or(CLUE_ORDER.len())
        });
    }
    entries
}

fn count_field(root: &Map<String, Value>, key: &str) -> u32 {
    root.get(key)
        .and_then(Value::as_u64)
        .map_or(0, |v| v.min(u32::MAX as u64) as u32)
}

impl CollectionLog {
    /// Parse a log document.
    pub fn from_json(json: &str) -> Result<Self, LogParseError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parse an already-decoded log document.
    pub fn from_value(value: &Value) -> Result<Self, LogParseError> {
        let root = match value.get("collectionLog") {
            Some(inner) => inner,
            None => value,
        };
        let root = root.as_object().ok_or(LogParseError::NotAnObject)?;

        let tabs = root
            .get("tabs")
            .or_else(|| root.get("sections"))
            .and_then(Value::as_object);

        let mut grouped: BTreeMap<Section, BTreeMap<String, Vec<LogItem>>> = BTreeMap::new();
        if let Some(tabs) = tabs {
            for (tab_name, entries) in tabs {
                let section = Section::from_tab_name(tab_name);
                let Some(entries) = entries.as_object() else {
                    continue;
                };
                for (entry_name, data) in entries {
                    grouped
                        .entry(section)
                        .or_default()
                        .entry(entry_name.clone())
                        .or_default()
                        .extend(entry_items(entry_name, data));
                }
            }
        }

        let sections = Section::ALL
            .iter()
            .map(|&section| LogSection {
                section,
                entries: sort_entries(section, grouped.remove(&section).unwrap_or_default()),
            })
            .collect();

        let log = Self {
            username: root
                .get("username")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            account_type: root
                .get("accountType")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            unique_obtained: count_field(root, "uniqueObtained"),
            unique_items: count_field(root, "uniqueItems"),
            sections,
        };

        debug!(
            "Parsed collection log for '{}': {} obtained items",
            log.username,
            log.obtained_set().len()
        );
        Ok(log)
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn items(&self) -> impl Iterator<Item = &LogItem> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter())
            .flat_map(|e| e.items.iter())
    }

    /// IDs of every obtained item.
    pub fn obtained_set(&self) -> ObtainedSet {
        self.items()
            .filter(|item| item.obtained)
            .map(|item| item.id)
            .collect()
    }

    pub fn account_variant(&self) -> AccountVariant {
        AccountVariant::from_account_type(&self.account_type)
    }

    pub fn section(&self, section: Section) -> Option<&LogSection> {
        self.sections.iter().find(|s| s.section == section)
    }

    /// Obtained and total item counts per section, in section order.
    pub fn category_counts(&self) -> Vec<CategoryCount> {
        self.sections
            .iter()
            .map(|s| {
                let items = s.entries.iter().flat_map(|e| e.items.iter());
                let (obtained, total) = items.fold((0, 0), |(o, t), item| {
                    (o + u32::from(item.obtained), t + 1)
                });
                CategoryCount {
                    section: s.section,
                    obtained,
                    total,
                }
            })
            .collect()
    }

    /// Most recently obtained items with a readable timestamp, newest first.
    pub fn recent_items(&self, limit: usize) -> Vec<&LogItem> {
        let mut dated: Vec<(DateTime<Utc>, &LogItem)> = self
            .items()
            .filter(|item| item.obtained)
            .filter_map(|item| item.obtained_time().map(|t| (t, item)))
            .collect();
        dated.sort_by(|a, b| b.0.cmp(&a.0));
        dated.into_iter().take(limit).map(|(_, item)| item).collect()
    }

    pub fn summary(&self, recent_limit: usize) -> LogSummary {
        LogSummary {
            username: self.username.clone(),
            account_type: self.account_type.clone(),
            account_variant: self.account_variant(),
            unique_obtained: self.unique_obtained,
            unique_items: self.unique_items,
            obtained: self.obtained_set().sorted(),
            category_counts: self.category_counts(),
            recent_items: self.recent_items(recent_limit).into_iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const API_LOG: &str = r#"{
        "collectionLog": {
            "username": "Zezima",
            "accountType": "IRONMAN",
            "uniqueObtained": 3,
            "uniqueItems": 6,
            "tabs": {
                "Bosses": {
                    "Giant Mole": {
                        "items": [
                            {"id": 100, "name": "Baby mole", "obtained": true, "quantity": 1,
                             "obtainedAt": "2024-03-01T10:00:00Z"},
                            {"id": 101, "name": "Long bone", "obtained": false, "quantity": 0}
                        ]
                    },
                    "Barrows Chests": {
                        "items": [
                            {"id": 200, "name": "Ahrim's hood", "obtained": true, "quantity": 2,
                             "obtainedAt": "2024-05-01T10:00:00Z"}
                        ]
                    }
                },
                "Clues": {
                    "Shared Treasure Trail Rewards": {"items": [{"id": 300, "name": "Purple sweets", "obtained": true}]},
                    "Beginner Treasure Trails": {"items": [{"id": 301, "name": "Mole slippers", "obtained": false}]},
                    "Mystery Trails": {"items": []}
                },
                "Skilling": {
                    "Fishing": {"items": [{"id": 400, "name": "Heron", "obtained": false}]}
                }
            }
        }
    }"#;

    const MANUAL_LOG: &str = r#"{
        "tabs": {
            "Raids": {
                "Chambers of Xeric": [
                    {"id": 500, "name": "Olmlet", "obtained": true},
                    {"id": 501, "name": "Twisted bow", "obtained": false},
                    {"name": "broken row"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_api_log() {
        let log = CollectionLog::from_json(API_LOG).unwrap();
        assert_eq!(log.username, "Zezima");
        assert_eq!(log.account_type, "IRONMAN");
        assert_eq!(log.account_variant(), AccountVariant::Iron);
        assert_eq!(log.unique_obtained, 3);
        assert_eq!(log.unique_items, 6);
        assert_eq!(log.obtained_set().sorted(), vec![100, 200, 300]);
    }

    #[test]
    fn test_parse_manual_log() {
        let log = CollectionLog::from_json(MANUAL_LOG).unwrap();
        assert_eq!(log.username, "");
        assert_eq!(log.account_type, "Unknown");
        assert_eq!(log.account_variant(), AccountVariant::Main);
        assert_eq!(log.obtained_set().sorted(), vec![500]);

        let raids = log.section(Section::Raids).unwrap();
        assert_eq!(raids.entries[0].items.len(), 2);
    }

    #[test]
    fn test_unknown_tabs_fold_into_other() {
        let log = CollectionLog::from_json(API_LOG).unwrap();
        let other = log.section(Section::Other).unwrap();
        assert_eq!(other.entries[0].name, "Fishing");
    }

    #[test]
    fn test_entries_sorted() {
        let log = CollectionLog::from_json(API_LOG).unwrap();

        let bosses: Vec<&str> = log
            .section(Section::Bosses)
            .unwrap()
            .entries
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(bosses, vec!["Barrows Chests", "Giant Mole"]);

        let clues: Vec<&str> = log
            .section(Section::Clues)
            .unwrap()
            .entries
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(
            clues,
            vec![
                "Beginner Treasure Trails",
                "Shared Treasure Trail Rewards",
                "Mystery Trails"
            ]
        );
    }

    #[test]
    fn test_category_counts() {
        let log = CollectionLog::from_json(API_LOG).unwrap();
        let counts = log.category_counts();

        assert_eq!(counts.len(), 5);
        assert_eq!(
            counts[0],
            CategoryCount {
                section: Section::Bosses,
                obtained: 2,
                total: 3
            }
        );
        assert_eq!(counts[1].total, 0);
        assert_eq!((counts[2].obtained, counts[2].total), (1, 2));
        assert_eq!((counts[4].obtained, counts[4].total), (0, 1));
    }

    #[test]
    fn test_recent_items() {
        let log = CollectionLog::from_json(API_LOG).unwrap();
        let recent: Vec<ItemId> = log.recent_items(12).iter().map(|i| i.id).collect();
        assert_eq!(recent, vec![200, 100]);

        let recent = log.recent_items(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, 200);
    }

    #[test]
    fn test_summary() {
        let log = CollectionLog::from_json(API_LOG).unwrap();
        let summary = log.summary(DEFAULT_RECENT_ITEMS);

        assert_eq!(summary.account_variant, AccountVariant::Iron);
        assert_eq!(summary.obtained, vec![100, 200, 300]);
        assert_eq!(summary.category_counts.len(), 5);
        assert_eq!(summary.recent_items[0].name, "Ahrim's hood");
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            CollectionLog::from_json("[1, 2, 3]"),
            Err(LogParseError::NotAnObject)
        ));
        assert!(matches!(
            CollectionLog::from_json("{not json"),
            Err(LogParseError::Json(_))
        ));
    }

    #[test]
    fn test_empty_log() {
        let log = CollectionLog::from_json("{}").unwrap();
        assert!(log.obtained_set().is_empty());
        assert_eq!(log.sections.len(), 5);
    }
}
