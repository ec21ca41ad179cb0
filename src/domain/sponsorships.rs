use super::{require_date_order, require_non_negative, require_text};
use crate::error::{ParksError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SponsorStatus {
    #[default]
    Active,
    Inactive,
}

text_enum!(SponsorStatus {
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Draft,
    Active,
    Expired,
    Cancelled,
}

text_enum!(ContractStatus {
    Draft => "draft",
    Active => "active",
    Expired => "expired",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: i64,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub status: SponsorStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SponsorInput {
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub status: SponsorStatus,
}

impl SponsorInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        if let Some(email) = &self.contact_email {
            if !email.contains('@') {
                return Err(ParksError::validation(format!(
                    "'{email}' is not an email address"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SponsorshipBenefit {
    pub id: i64,
    pub description: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorshipPackage {
    pub id: i64,
    pub name: String,
    pub tier: String,
    pub price: f64,
    pub duration_months: i64,
    pub benefits: Vec<SponsorshipBenefit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenefitInput {
    pub description: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageInput {
    pub name: String,
    pub tier: String,
    pub price: f64,
    pub duration_months: i64,
    #[serde(default)]
    pub benefits: Vec<BenefitInput>,
}

impl PackageInput {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("tier", &self.tier)?;
        require_non_negative("price", Some(self.price))?;
        if self.duration_months <= 0 {
            return Err(ParksError::validation("duration_months must be positive"));
        }
        for benefit in &self.benefits {
            require_text("benefit description", &benefit.description)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorshipContract {
    pub id: i64,
    pub sponsor_id: i64,
    pub package_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: f64,
    pub status: ContractStatus,
    pub asset_ids: Vec<i64>,
    pub event_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractInput {
    pub sponsor_id: i64,
    pub package_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub status: ContractStatus,
    #[serde(default)]
    pub asset_ids: Vec<i64>,
    #[serde(default)]
    pub event_ids: Vec<i64>,
}

impl ContractInput {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("amount", Some(self.amount))?;
        require_date_order(
            "start_date",
            Some(self.start_date),
            "end_date",
            Some(self.end_date),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetLink {
    pub asset_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLink {
    pub event_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractFilter {
    pub sponsor_id: Option<i64>,
    pub status: Option<ContractStatus>,
}
