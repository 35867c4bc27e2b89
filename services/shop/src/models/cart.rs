//! Cart models: the persisted entry, its hydrated form, and request payloads

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::catalog::{ProjectDetails, UserSummary};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// One user's quantity of one project. At most one exists per (user, project).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart entry with its owner and project attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub entry: CartEntry,
    pub user: UserSummary,
    pub project: ProjectDetails,
}

/// Body of `POST /cart`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

/// Body of `PUT /cart/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: Option<i32>,
}

/// Outcome of setting the quantity of an entry
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityUpdate {
    /// No entry with that id
    NotFound,
    /// Quantity was zero or less, so the entry was deleted
    Removed,
    /// Entry now holds the new quantity
    Updated(CartItem),
}

/// Column a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    UserId,
    ProjectId,
    Quantity,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Qualified column for ORDER BY
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "c.id",
            SortField::UserId => "c.user_id",
            SortField::ProjectId => "c.project_id",
            SortField::Quantity => "c.quantity",
            SortField::CreatedAt => "c.created_at",
            SortField::UpdatedAt => "c.updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "userId" | "user_id" => Ok(SortField::UserId),
            "projectId" | "project_id" => Ok(SortField::ProjectId),
            "quantity" => Ok(SortField::Quantity),
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "updatedAt" | "updated_at" => Ok(SortField::UpdatedAt),
            other => Err(format!("Invalid sortBy value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(format!("Invalid sortOrder value: {}", s))
        }
    }
}

/// Raw query string of `GET /cart`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    /// Substring of the project title, case-insensitive
    pub search: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl CartQuery {
    /// Validate the raw parameters and apply defaults
    pub fn into_filter(self) -> Result<CartFilter, String> {
        let search = self.search.filter(|s| !s.trim().is_empty());

        let user_id = parse_optional(self.user_id, |s| {
            Uuid::parse_str(s).map_err(|_| "Invalid userId".to_string())
        })?;
        let project_id = parse_optional(self.project_id, |s| {
            Uuid::parse_str(s).map_err(|_| "Invalid projectId".to_string())
        })?;
        let sort_by =
            parse_optional(self.sort_by, str::parse::<SortField>)?.unwrap_or_default();
        let sort_order =
            parse_optional(self.sort_order, str::parse::<SortOrder>)?.unwrap_or_default();

        let limit = parse_optional(self.limit, |s| {
            s.parse::<i64>()
                .map_err(|_| "limit must be an integer".to_string())
        })?
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT);

        let offset = parse_optional(self.offset, |s| {
            s.parse::<i64>()
                .map_err(|_| "offset must be an integer".to_string())
        })?
        .unwrap_or(0)
        .max(0);

        Ok(CartFilter {
            search,
            user_id,
            project_id,
            sort_by,
            sort_order,
            limit,
            offset,
        })
    }
}

/// Empty strings count as absent, the way query strings like `?userId=` are sent
fn parse_optional<T>(
    raw: Option<String>,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<Option<T>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse(value).map(Some),
    }
}

/// Validated listing filter
#[derive(Debug, Clone, PartialEq)]
pub struct CartFilter {
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for CartFilter {
    fn default() -> Self {
        Self {
            search: None,
            user_id: None,
            project_id: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of a listing plus the unpaginated total
#[derive(Debug, Clone)]
pub struct CartPage {
    pub items: Vec<CartItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
