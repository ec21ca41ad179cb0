//! Domain data shapes shared by storage and the HTTP layer.
//!
//! Each entity has a stored shape (returned by the API) and an input shape
//! (accepted on create and full update). Input shapes validate themselves
//! before anything touches the database.

/// Implements `as_str`, `Display` and `FromStr` for a unit enum stored as text.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::ParksError;

            fn from_str(s: &str) -> crate::error::Result<Self> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::error::ParksError::Validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

mod assets;
mod events;
mod parks;
mod roles;
mod sponsorships;

pub use assets::*;
pub use events::*;
pub use parks::*;
pub use roles::*;
pub use sponsorships::*;

use crate::error::{ParksError, Result};
use chrono::NaiveDate;

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ParksError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ParksError::validation(format!(
                    "latitude {lat} is outside [-90, 90]"
                )));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(ParksError::validation(format!(
                    "longitude {lng} is outside [-180, 180]"
                )));
            }
            Ok(())
        }
        _ => Err(ParksError::validation(
            "latitude and longitude must be given together",
        )),
    }
}

pub(crate) fn require_non_negative(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if v < 0.0 || v.is_nan() => Err(ParksError::validation(format!(
            "{field} must not be negative"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn require_date_order(
    start_field: &str,
    start: Option<NaiveDate>,
    end_field: &str,
    end: Option<NaiveDate>,
) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ParksError::validation(format!(
                "{end_field} ({end}) is before {start_field} ({start})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_must_pair_and_be_in_range() {
        assert!(require_coordinates(None, None).is_ok());
        assert!(require_coordinates(Some(20.6), Some(-103.3)).is_ok());
        assert!(require_coordinates(Some(20.6), None).is_err());
        assert!(require_coordinates(Some(91.0), Some(0.0)).is_err());
        assert!(require_coordinates(Some(0.0), Some(-181.0)).is_err());
    }

    #[test]
    fn date_order() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 1);
        let b = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(require_date_order("start", a, "end", a).is_ok());
        assert!(require_date_order("start", a, "end", b).is_err());
        assert!(require_date_order("start", None, "end", b).is_ok());
    }
}
