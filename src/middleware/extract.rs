use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::Json;

use crate::error::TabloError;

/// `Json` whose rejections use the console error body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(TabloError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections use the console error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(TabloError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for TabloError {
    fn from(rejection: JsonRejection) -> Self {
        TabloError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for TabloError {
    fn from(rejection: PathRejection) -> Self {
        TabloError::Validation(rejection.body_text())
    }
}
