use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Meal row as stored in `meals`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Meal {
    pub id: Uuid,
    #[sqlx(rename = "user_id")]
    pub owner: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub occurred_at: OffsetDateTime,
    pub is_diet_compliant: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

/// Validated user input for creating or editing a meal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealDraft {
    pub name: String,
    pub description: Option<String>,
    pub occurred_at: OffsetDateTime,
    pub is_diet_compliant: bool,
}

/// Narrows `count_active` to one side of the compliance flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceFilter {
    Any,
    Compliant,
    NonCompliant,
}

impl ComplianceFilter {
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Self::Any => None,
            Self::Compliant => Some(true),
            Self::NonCompliant => Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}
