//! CSV import of the completion-rate and activity-map tables.
//!
//! Numeric cells follow the export's conventions: blank, `n/a` and `None`
//! cells (and anything unparsable) fall back to a default instead of
//! failing the import. Identifier columns must parse.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Catalog, CatalogLoadError, CatalogSource};
use crate::models::{Activity, ActivityIndex, CatalogFingerprint, DropItem, ItemId};

const ACTIVITIES_TABLE: &str = "completion rates";
const DROP_ITEMS_TABLE: &str = "activity map";

/// A recoverable problem found during import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    /// A drop-item row names an activity missing from the activity table.
    DanglingReference {
        line: u64,
        activity_index: ActivityIndex,
        item_id: ItemId,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::DanglingReference {
                line,
                activity_index,
                item_id,
            } => write!(
                f,
                "line {}: activity index {} not found in completion rates (item {})",
                line, activity_index, item_id
            ),
        }
    }
}

/// A freshly built catalog and the rows skipped while building it.
#[derive(Debug)]
pub struct LoadReport {
    pub catalog: Catalog,
    pub warnings: Vec<LoadWarning>,
}

/// Parse a numeric cell, mapping blank, `n/a`, `None` or garbage to `default`.
pub fn safe_float(value: &str, default: f64) -> f64 {
    optional_float(value).unwrap_or(default)
}

/// Parse a numeric cell, mapping blank, `n/a`, `None` or garbage to `None`.
pub fn optional_float(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("n/a") || value == "None" {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Case-insensitive match against `"true"`; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    #[serde(rename = "Index")]
    index: String,
    #[serde(rename = "Activity name")]
    activity_name: String,
    #[serde(rename = "Completions/hr (main)", default)]
    completions_per_hour_main: String,
    #[serde(rename = "Completions/hr (iron)", default)]
    completions_per_hour_iron: String,
    #[serde(rename = "Extra time to first completion (hours)", default)]
    extra_time: String,
    #[serde(rename = "Notes", default)]
    notes: String,
    #[serde(rename = "Verification source", default)]
    verification_source: String,
}

#[derive(Debug, Deserialize)]
struct DropItemRow {
    #[serde(rename = "Activity index")]
    activity_index: String,
    #[serde(rename = "Item ID")]
    item_id: String,
    #[serde(rename = "Item name")]
    item_name: String,
    #[serde(rename = "Requires previous", default)]
    requires_previous: String,
    #[serde(rename = "Exact", default)]
    exact: String,
    #[serde(rename = "Independent", default)]
    independent: String,
    #[serde(rename = "Drop rate (attempts)", default)]
    drop_rate_attempts: String,
    #[serde(rename = "Neither^(-1)", default)]
    neither_inverse: String,
}

fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes)
}

fn parse_id(
    value: &str,
    table: &'static str,
    line: u64,
    column: &str,
) -> Result<u32, CatalogLoadError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|e| CatalogLoadError::Malformed {
            table,
            line,
            message: format!("{} '{}' is not a valid id: {}", column, value, e),
        })
}

fn parse_activities(bytes: &[u8]) -> Result<Vec<Activity>, CatalogLoadError> {
    let mut reader = csv_reader(bytes);
    let headers = reader.headers()?.clone();
    let mut activities = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row: ActivityRow = record.deserialize(Some(&headers))?;

        let index = parse_id(&row.index, ACTIVITIES_TABLE, line, "Index")?;
        activities.push(
            Activity::new(
                index,
                row.activity_name,
                safe_float(&row.completions_per_hour_main, 0.0),
                safe_float(&row.completions_per_hour_iron, 0.0),
            )
            .with_extra_time(safe_float(&row.extra_time, 0.0))
            .with_notes(row.notes, row.verification_source),
        );
    }

    Ok(activities)
}

fn attach_drop_items(
    bytes: &[u8],
    activities: &mut [Activity],
) -> Result<Vec<LoadWarning>, CatalogLoadError> {
    let positions: HashMap<ActivityIndex, usize> = activities
        .iter()
        .enumerate()
        .map(|(pos, a)| (a.activity_index, pos))
        .collect();

    let mut reader = csv_reader(bytes);
    let headers = reader.headers()?.clone();
    let mut warnings = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row: DropItemRow = record.deserialize(Some(&headers))?;

        let activity_index =
            parse_id(&row.activity_index, DROP_ITEMS_TABLE, line, "Activity index")?;
        let item_id = parse_id(&row.item_id, DROP_ITEMS_TABLE, line, "Item ID")?;

        let Some(&pos) = positions.get(&activity_index) else {
            let warning = LoadWarning::DanglingReference {
                line,
                activity_index,
                item_id,
            };
            warn!("Skipping drop item row: {}", warning);
            warnings.push(warning);
            continue;
        };

        let drop_rate_attempts = safe_float(&row.drop_rate_attempts, 0.0);
        let mut item = DropItem::new(item_id, row.item_name, drop_rate_attempts)
            .with_requires_previous(parse_flag(&row.requires_previous))
            .with_models(parse_flag(&row.exact), parse_flag(&row.independent));
        item.neither_inverse = optional_float(&row.neither_inverse);

        let stored = activities[pos].push_item(item);
        debug!(
            "Attached item {} to activity {} at sequence {}",
            stored.item_id, activity_index, stored.sequence
        );
    }

    Ok(warnings)
}

/// Build a catalog from the raw bytes of both tables.
pub fn load_from_bytes(
    activities_csv: &[u8],
    drop_items_csv: &[u8],
) -> Result<LoadReport, CatalogLoadError> {
    let fingerprint = CatalogFingerprint::of_tables(&[activities_csv, drop_items_csv]);

    let mut activities = parse_activities(activities_csv)?;
    let warnings = attach_drop_items(drop_items_csv, &mut activities)?;
    let catalog = Catalog::build(activities, fingerprint)?;

    info!(
        "Loaded catalog {}: {} activities, {} drop items, {} skipped rows",
        catalog.fingerprint().short(),
        catalog.len(),
        catalog.item_count(),
        warnings.len()
    );

    Ok(LoadReport { catalog, warnings })
}

/// Build a catalog from two readers.
pub fn load<A: Read, D: Read>(
    mut activities_csv: A,
    mut drop_items_csv: D,
) -> Result<LoadReport, CatalogLoadError> {
    let mut activities = Vec::new();
    activities_csv.read_to_end(&mut activities)?;
    let mut drop_items = Vec::new();
    drop_items_csv.read_to_end(&mut drop_items)?;
    load_from_bytes(&activities, &drop_items)
}

/// Build a catalog from two files.
pub fn load_from_paths(
    activities_path: &Path,
    drop_items_path: &Path,
) -> Result<LoadReport, CatalogLoadError> {
    debug!(
        "Reading catalog tables {:?} and {:?}",
        activities_path, drop_items_path
    );
    let activities = std::fs::read(activities_path)?;
    let drop_items = std::fs::read(drop_items_path)?;
    load_from_bytes(&activities, &drop_items)
}

/// Build a catalog from a configured source.
pub fn load_source(source: &CatalogSource) -> Result<LoadReport, CatalogLoadError> {
    load_from_paths(&source.activities_path, &source.drop_items_path)
}
