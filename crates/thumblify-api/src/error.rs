use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use thumblify_pipeline::PipelineError;
use thumblify_types::api::ErrorResponse;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// The model or the asset store failed.
    #[error("{public}: {detail}")]
    Upstream { public: String, detail: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(m) | ApiError::Unauthorized(m) | ApiError::NotFound(m) => m.clone(),
            ApiError::Upstream { public, .. } => public.clone(),
            ApiError::Internal(_) => "Internal server error".into(),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Upstream { .. } | ApiError::Internal(_) => {
                error!(status = %self.status(), error = %self, "Request failed");
            }
            _ => debug!(status = %self.status(), error = %self, "Request rejected"),
        }
    }

    fn into_body(self, success: Option<bool>) -> Response {
        self.log();
        let body = ErrorResponse {
            success,
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_body(None)
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Invalid(m) => ApiError::BadRequest(m),
            PipelineError::Model(e) => ApiError::Upstream {
                public: "Image generation failed, please try again".into(),
                detail: e.to_string(),
            },
            PipelineError::Storage(e) => ApiError::Upstream {
                public: "Failed to store the generated image".into(),
                detail: e.to_string(),
            },
            PipelineError::RecordMissing => {
                ApiError::Internal(anyhow::anyhow!("thumbnail record disappeared during generation"))
            }
            PipelineError::Database(e) => ApiError::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Errors from the generate endpoint; the body carries `"success": false`.
#[derive(Debug)]
pub struct GenerateError(pub ApiError);

impl From<ApiError> for GenerateError {
    fn from(e: ApiError) -> Self {
        GenerateError(e)
    }
}

impl From<PipelineError> for GenerateError {
    fn from(e: PipelineError) -> Self {
        GenerateError(e.into())
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        self.0.into_body(Some(false))
    }
}

/// `Json<T>` whose rejection is an [`ApiError`] with the usual body shape.
#[derive(Debug, Clone, Copy)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(inner))
    }
}
