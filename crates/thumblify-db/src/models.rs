/// Database row types. These map directly to SQLite rows and stay distinct
/// from the thumblify-types API models so the DB layer has no wire concerns.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct ThumbnailRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub style: String,
    pub aspect_ratio: String,
    pub color_scheme: Option<String>,
    pub text_overlay: bool,
    pub user_prompt: Option<String>,
    pub prompt_used: String,
    pub image_url: Option<String>,
    pub asset_key: Option<String>,
    pub is_generating: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for a thumbnail that is about to be generated.
#[derive(Debug, Clone)]
pub struct NewThumbnail<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub style: &'a str,
    pub aspect_ratio: &'a str,
    pub color_scheme: Option<&'a str>,
    pub text_overlay: bool,
    pub user_prompt: Option<&'a str>,
    pub prompt_used: &'a str,
}
