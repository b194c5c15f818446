use serde::{Deserialize, Serialize};

use crate::catalog::{AspectRatio, ColorScheme, ThumbnailStyle};
use crate::models::{Thumbnail, User};

/// Longest title the client lets a user type.
pub const MAX_TITLE_LEN: usize = 100;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Thumbnails --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateThumbnailRequest {
    pub title: String,
    /// Free-form extra details typed by the user.
    #[serde(default)]
    pub prompt: Option<String>,
    pub style: ThumbnailStyle,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub color_scheme: Option<ColorScheme>,
    #[serde(default)]
    pub text_overlay: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateThumbnailResponse {
    pub success: bool,
    pub thumbnail: Thumbnail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThumbnailListResponse {
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThumbnailResponse {
    pub thumbnail: Thumbnail,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_matches_client_payload() {
        let body = r#"{
            "title": "10 tips for better sleep",
            "prompt": "",
            "style": "Bold and Graphic",
            "aspect_ratio": "16:9",
            "color_scheme": "vibrant",
            "text_overlay": true
        }"#;
        let req: GenerateThumbnailRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.style, ThumbnailStyle::BoldGraphic);
        assert_eq!(req.color_scheme, Some(ColorScheme::Vibrant));
        assert!(req.text_overlay);
    }

    #[test]
    fn generate_request_defaults() {
        let req: GenerateThumbnailRequest =
            serde_json::from_str(r#"{"title":"t","style":"Minimalist"}"#).unwrap();
        assert_eq!(req.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(req.color_scheme, None);
        assert!(!req.text_overlay);
        assert!(req.prompt.is_none());
    }
}
