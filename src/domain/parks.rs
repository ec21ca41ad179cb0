use super::{require_coordinates, require_non_negative, require_text};
use crate::error::Result;
use crate::geo::Point;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Municipality {
    pub id: i64,
    pub name: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MunicipalityInput {
    pub name: String,
    pub state: Option<String>,
}

impl MunicipalityInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Park {
    pub id: i64,
    pub name: String,
    pub municipality_id: Option<i64>,
    pub park_type: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub area_sqm: Option<f64>,
    pub conservation_status: Option<String>,
    pub code_prefix: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParkInput {
    pub name: String,
    pub municipality_id: Option<i64>,
    pub park_type: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub area_sqm: Option<f64>,
    pub conservation_status: Option<String>,
    /// Generated from the name when absent.
    pub code_prefix: Option<String>,
}

impl ParkInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("park_type", &self.park_type)?;
        require_coordinates(self.latitude, self.longitude)?;
        require_non_negative("area_sqm", self.area_sqm)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParkFilter {
    pub municipality_id: Option<i64>,
    pub park_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkArea {
    pub id: i64,
    pub park_id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub polygon: Option<Vec<Point>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AreaInput {
    pub name: String,
    pub description: Option<String>,
    /// Any accepted polygon encoding; stored canonically.
    pub polygon: Option<serde_json::Value>,
}

impl AreaInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: i64,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub origin: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesInput {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub origin: Option<String>,
}

impl SpeciesInput {
    pub fn validate(&self) -> Result<()> {
        require_text("common_name", &self.common_name)
    }

    /// Name the species code is derived from.
    pub fn code_source(&self) -> &str {
        match self.scientific_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.common_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub id: i64,
    pub code: String,
    pub species_id: i64,
    pub park_id: i64,
    pub area_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub planting_date: Option<NaiveDate>,
    pub height_m: Option<f64>,
    pub trunk_diameter_cm: Option<f64>,
    pub health_status: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tree {
    pub fn location(&self) -> Option<Point> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Point { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeInput {
    pub species_id: i64,
    pub park_id: i64,
    /// Located by polygon when absent and coordinates are given.
    pub area_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub planting_date: Option<NaiveDate>,
    pub height_m: Option<f64>,
    pub trunk_diameter_cm: Option<f64>,
    pub health_status: Option<String>,
    pub notes: Option<String>,
}

impl TreeInput {
    pub fn validate(&self) -> Result<()> {
        require_coordinates(self.latitude, self.longitude)?;
        require_non_negative("height_m", self.height_m)?;
        require_non_negative("trunk_diameter_cm", self.trunk_diameter_cm)
    }

    pub fn location(&self) -> Option<Point> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Point { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeFilter {
    pub park_id: Option<i64>,
    pub area_id: Option<i64>,
    pub species_id: Option<i64>,
}

/// Outcome of linking a park's unassigned trees to its areas.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkSummary {
    pub examined: usize,
    pub linked_by_polygon: usize,
    pub linked_by_prefix: usize,
    pub unmatched: usize,
}
