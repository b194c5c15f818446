//! Row to wire-model conversion.

use anyhow::{Context, Result};
use thumblify_db::models::{ThumbnailRow, UserRow};
use thumblify_db::parse_ts;
use thumblify_types::catalog::{AspectRatio, ColorScheme, ThumbnailStyle};
use thumblify_types::models::{Thumbnail, User};
use uuid::Uuid;

pub fn thumbnail_from_row(row: ThumbnailRow) -> Result<Thumbnail> {
    Ok(Thumbnail {
        id: row.id.parse::<Uuid>().context("thumbnail id")?,
        user_id: row.user_id.parse::<Uuid>().context("thumbnail owner id")?,
        title: row.title,
        style: row.style.parse::<ThumbnailStyle>()?,
        aspect_ratio: row.aspect_ratio.parse::<AspectRatio>()?,
        color_scheme: row.color_scheme.as_deref().map(str::parse::<ColorScheme>).transpose()?,
        text_overlay: row.text_overlay,
        user_prompt: row.user_prompt,
        prompt_used: row.prompt_used,
        image_url: row.image_url,
        asset_key: row.asset_key,
        is_generating: row.is_generating,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

pub fn user_from_row(row: UserRow) -> Result<User> {
    Ok(User {
        id: row.id.parse::<Uuid>().context("user id")?,
        name: row.name,
        email: row.email,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}
