use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection is rendered through [`AppError`], so a
/// malformed body gets the usual error envelope and a 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
