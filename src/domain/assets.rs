use super::{require_coordinates, require_date_order, require_non_negative, require_text};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Active,
    Maintenance,
    Damaged,
    Retired,
}

text_enum!(AssetStatus {
    Active => "active",
    Maintenance => "maintenance",
    Damaged => "damaged",
    Retired => "retired",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Critical,
}

text_enum!(AssetCondition {
    Excellent => "excellent",
    Good => "good",
    Fair => "fair",
    Poor => "poor",
    Critical => "critical",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryChange {
    Created,
    Updated,
    Deleted,
}

text_enum!(HistoryChange {
    Created => "created",
    Updated => "updated",
    Deleted => "deleted",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Amenity {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmenityInput {
    pub name: String,
    pub category: Option<String>,
}

impl AmenityInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub park_id: i64,
    pub amenity_id: Option<i64>,
    pub status: AssetStatus,
    pub condition: AssetCondition,
    pub serial_number: Option<String>,
    pub acquisition_date: Option<NaiveDate>,
    pub acquisition_cost: Option<f64>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetInput {
    pub name: String,
    pub category: String,
    pub park_id: i64,
    pub amenity_id: Option<i64>,
    #[serde(default)]
    pub status: AssetStatus,
    #[serde(default)]
    pub condition: AssetCondition,
    pub serial_number: Option<String>,
    pub acquisition_date: Option<NaiveDate>,
    pub acquisition_cost: Option<f64>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

impl AssetInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_non_negative("acquisition_cost", self.acquisition_cost)?;
        require_coordinates(self.latitude, self.longitude)?;
        require_date_order(
            "last_maintenance_date",
            self.last_maintenance_date,
            "next_maintenance_date",
            self.next_maintenance_date,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFilter {
    pub park_id: Option<i64>,
    pub status: Option<AssetStatus>,
    pub category: Option<String>,
}

/// One append-only audit row per asset mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetHistoryEntry {
    pub id: i64,
    pub asset_id: i64,
    pub change_type: HistoryChange,
    pub description: String,
    /// `{field: {"from": .., "to": ..}}` for updates, the final snapshot for deletes.
    pub changes: Option<serde_json::Value>,
    pub changed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_text_round_trips_with_serde_names() {
        for status in [
            AssetStatus::Active,
            AssetStatus::Maintenance,
            AssetStatus::Damaged,
            AssetStatus::Retired,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.as_str().to_string()));
            assert_eq!(AssetStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(AssetStatus::from_str("lost").is_err());
    }

    #[test]
    fn maintenance_dates_must_be_ordered() {
        let input: AssetInput = serde_json::from_value(serde_json::json!({
            "name": "Bench 4",
            "category": "furniture",
            "park_id": 1,
            "last_maintenance_date": "2024-05-01",
            "next_maintenance_date": "2024-04-01"
        }))
        .unwrap();
        assert_eq!(input.status, AssetStatus::Active);
        assert_eq!(input.condition, AssetCondition::Good);
        assert!(input.validate().is_err());
    }
}
