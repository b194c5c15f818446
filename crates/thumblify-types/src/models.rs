use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{AspectRatio, ColorScheme, ThumbnailStyle};

/// A registered account as the client sees it. The password hash never
/// leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A generation record. `image_url` stays empty while `is_generating` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub title: String,
    pub style: ThumbnailStyle,
    pub aspect_ratio: AspectRatio,
    pub color_scheme: Option<ColorScheme>,
    pub text_overlay: bool,
    pub user_prompt: Option<String>,
    pub prompt_used: String,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub asset_key: Option<String>,
    #[serde(rename = "isGenerating")]
    pub is_generating: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
