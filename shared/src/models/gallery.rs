//! Gallery Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Portfolio showcase category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GalleryCategory {
    BeforeAfter,
    #[default]
    Equipment,
    WorkProcess,
    Certifications,
}

impl GalleryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeAfter => "before-after",
            Self::Equipment => "equipment",
            Self::WorkProcess => "work-process",
            Self::Certifications => "certifications",
        }
    }
}

/// Role an image plays within a gallery item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GalleryImageRole {
    #[default]
    Main,
    Before,
    After,
    Additional,
}

/// Image attached to a gallery item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub id: Uuid,
    pub url: String,
    pub role: GalleryImageRole,
    pub caption: Option<String>,
    /// Ordering hint within the parent; not enforced unique server-side
    pub sort_order: i32,
}

/// Gallery item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: GalleryCategory,
    pub alt_text: Option<String>,
    pub location: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub equipment_type: Option<String>,
    pub testimonial: Option<String>,
    /// 1 to 5
    pub rating: u8,
    pub featured: bool,
    pub images: Vec<GalleryImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for an image row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct GalleryImageDraft {
    #[validate(length(min = 1))]
    pub url: String,
    #[serde(default)]
    pub role: GalleryImageRole,
    pub caption: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input payload for creating or fully replacing a gallery item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GalleryDraft {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    pub category: GalleryCategory,
    pub alt_text: Option<String>,
    pub location: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub equipment_type: Option<String>,
    pub testimonial: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<GalleryImageDraft>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn draft(rating: u8) -> GalleryDraft {
        GalleryDraft {
            title: "Ultrasound refurbishment".into(),
            description: String::new(),
            category: GalleryCategory::BeforeAfter,
            alt_text: None,
            location: None,
            service_date: None,
            equipment_type: None,
            testimonial: None,
            rating,
            featured: false,
            images: vec![],
        }
    }

    #[test]
    fn rating_must_be_in_range() {
        assert!(draft(0).validate().is_err());
        assert!(draft(3).validate().is_ok());
        assert!(draft(6).validate().is_err());
    }

    #[test]
    fn category_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&GalleryCategory::WorkProcess).unwrap(),
            "\"work-process\""
        );
    }
}
