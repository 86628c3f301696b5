use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use super::repo_types::{Meal, MealDraft, Page};

const MAX_PAGE: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date_and_time_of_meal: OffsetDateTime,
    pub from_diet: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Meal> for MealResponse {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            date_and_time_of_meal: m.occurred_at,
            from_diet: m.is_diet_compliant,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MealListResponse {
    pub meals: Vec<MealResponse>,
}

/// Body of create and edit requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date_and_time_of_meal: String,
    #[serde(default = "default_from_diet")]
    pub from_diet: bool,
}

fn default_from_diet() -> bool {
    true
}

impl MealRequest {
    /// Checks the name and parses the meal time into a store-ready draft.
    pub fn into_draft(self) -> Result<MealDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name must not be empty".into());
        }
        let occurred_at = parse_meal_time(&self.date_and_time_of_meal)?;
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(MealDraft {
            name: name.to_string(),
            description,
            occurred_at,
            is_diet_compliant: self.from_diet,
        })
    }
}

/// `YYYY-MM-DD HH:MM` wall-clock time, read as UTC.
pub fn parse_meal_time(raw: &str) -> Result<OffsetDateTime, String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    PrimitiveDateTime::parse(raw.trim(), format)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| "Invalid date and time format, expected YYYY-MM-DD HH:MM".to_string())
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl From<Pagination> for Page {
    fn from(p: Pagination) -> Self {
        Self {
            limit: p.limit.clamp(1, MAX_PAGE),
            offset: p.offset.max(0),
        }
    }
}
