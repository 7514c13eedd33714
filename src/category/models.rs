use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::account::models::validate_color_gradient;

/// Category kind: which side of the ledger it is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Income bucket
    Credit,
    /// Expense bucket
    Debit,
    /// Both sides
    #[default]
    Mixed,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Credit => "credit",
            CategoryType::Debit => "debit",
            CategoryType::Mixed => "mixed",
        }
    }
}

/// Database entity for categories
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    #[allow(dead_code)]
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_type: String,
    pub status: String,
    pub exclude_from_budgets: bool,
    pub color_gradient: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Unique category identifier
    pub id: Uuid,
    /// Category name
    #[schema(example = "Groceries")]
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Category kind (credit, debit, mixed)
    #[serde(rename = "type")]
    #[schema(example = "debit")]
    pub category_type: String,
    /// Category status (active, inactive)
    #[schema(example = "active")]
    pub status: String,
    /// Whether this category is ignored by budget math
    pub exclude_from_budgets: bool,
    /// Display gradient slug
    #[schema(example = "orange")]
    pub color_gradient: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CategoryResponse {
    pub fn from_category(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            category_type: category.category_type,
            status: category.status,
            exclude_from_budgets: category.exclude_from_budgets,
            color_gradient: category.color_gradient,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    /// Category name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Groceries")]
    pub name: String,

    /// Optional description (max 200 chars)
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,

    /// Category kind (defaults to mixed)
    #[serde(rename = "type", default)]
    pub category_type: CategoryType,

    /// Ignore this category in budget math
    #[serde(default)]
    pub exclude_from_budgets: bool,

    /// Display gradient slug
    #[validate(custom(
        function = "validate_color_gradient",
        message = "Unknown color gradient"
    ))]
    #[schema(example = "orange")]
    pub color_gradient: String,
}

/// Request body for updating a category (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    /// Category name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    /// Description
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,

    /// Category kind
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,

    /// Category status (active, inactive)
    #[schema(example = "inactive")]
    pub status: Option<String>,

    /// Ignore this category in budget math
    pub exclude_from_budgets: Option<bool>,

    /// Display gradient slug
    pub color_gradient: Option<String>,
}

impl UpdateCategoryDto {
    /// Validate optional fields the derive macro can't reach
    pub fn validate_optionals(&self) -> Result<(), ValidationError> {
        if let Some(color) = &self.color_gradient {
            validate_color_gradient(color)?;
        }
        if let Some(status) = &self.status {
            if status != "active" && status != "inactive" {
                return Err(ValidationError::new("invalid_status"));
            }
        }
        Ok(())
    }
}

/// Path parameters for category ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryIdPath {
    /// Category UUID
    pub id: Uuid,
}
