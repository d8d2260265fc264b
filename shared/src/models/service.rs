//! Service Model
//!
//! One completed repair/maintenance engagement, owning an ordered list of
//! parts consumed during the work.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Service engagement status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Completed,
    Pending,
    Cancelled,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Payment collection status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
        }
    }
}

/// A part consumed during a service engagement.
///
/// Part rows have no persistent identity across updates: the full set is
/// replaced whenever the parent service is updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartUsed {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
    /// Cost per unit in currency
    pub unit_cost: Decimal,
}

/// Service entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub equipment_type: String,
    pub client_name: String,
    pub location: String,
    pub service_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub duration_hours: f64,
    /// Flat engagement fee, tracked separately from the stored total
    pub service_fee: Decimal,
    pub labor_cost: Decimal,
    /// Stored total: labor cost plus parts (see [`ServiceDraft::record_total`])
    pub total_cost: Decimal,
    pub status: ServiceStatus,
    pub payment_status: PaymentStatus,
    pub technician: String,
    pub notes: Option<String>,
    pub parts_used: Vec<PartUsed>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a part row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PartDraft {
    #[validate(length(min = 1))]
    pub name: String,
    pub quantity: u32,
    pub unit_cost: Decimal,
}

/// Input payload for creating or fully replacing a service.
///
/// `update` replaces the entire entity including the complete part list;
/// there is no partial-field variant.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceDraft {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    #[validate(length(min = 1))]
    pub equipment_type: String,
    #[validate(length(min = 1))]
    pub client_name: String,
    pub location: String,
    pub service_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub duration_hours: f64,
    pub service_fee: Decimal,
    pub labor_cost: Decimal,
    #[serde(default)]
    pub status: ServiceStatus,
    pub technician: String,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub parts_used: Vec<PartDraft>,
}

/// Sum of `quantity * unit_cost` over a part list.
pub fn parts_total(parts: &[PartDraft]) -> Decimal {
    parts
        .iter()
        .map(|p| Decimal::from(p.quantity) * p.unit_cost)
        .sum()
}

impl ServiceDraft {
    /// The total stored on the service record: labor cost plus parts.
    ///
    /// The service fee is deliberately excluded here; see [`quote_total`]
    /// for the fee-inclusive figure. The two are distinct on purpose.
    ///
    /// [`quote_total`]: ServiceDraft::quote_total
    pub fn record_total(&self) -> Decimal {
        self.labor_cost + parts_total(&self.parts_used)
    }

    /// Fee-inclusive total used for quotation-style output.
    pub fn quote_total(&self) -> Decimal {
        self.service_fee + self.record_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(labor: i64, fee: i64, parts: Vec<PartDraft>) -> ServiceDraft {
        ServiceDraft {
            title: "Compressor overhaul".into(),
            description: String::new(),
            equipment_type: "imaging".into(),
            client_name: "City Clinic".into(),
            location: "Ward 3".into(),
            service_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            completion_date: None,
            duration_hours: 4.0,
            service_fee: Decimal::from(fee),
            labor_cost: Decimal::from(labor),
            status: ServiceStatus::Completed,
            technician: "R. Vance".into(),
            notes: None,
            parts_used: parts,
        }
    }

    #[test]
    fn record_total_is_labor_plus_parts() {
        let d = draft(
            1000,
            200,
            vec![PartDraft {
                name: "Pump".into(),
                quantity: 2,
                unit_cost: Decimal::from(250),
            }],
        );
        assert_eq!(d.record_total(), Decimal::from(1500));
    }

    #[test]
    fn quote_total_includes_service_fee() {
        let d = draft(
            1000,
            200,
            vec![PartDraft {
                name: "Pump".into(),
                quantity: 2,
                unit_cost: Decimal::from(250),
            }],
        );
        assert_eq!(d.quote_total(), Decimal::from(1700));
    }

    #[test]
    fn record_total_with_no_parts() {
        let d = draft(800, 0, vec![]);
        assert_eq!(d.record_total(), Decimal::from(800));
    }

    #[test]
    fn draft_validation_rejects_empty_part_name() {
        use validator::Validate;
        let d = draft(
            100,
            0,
            vec![PartDraft {
                name: String::new(),
                quantity: 1,
                unit_cost: Decimal::ONE,
            }],
        );
        assert!(d.validate().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ServiceStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Overdue).unwrap(),
            "\"overdue\""
        );
    }
}
