use super::{error::ErrorBody, Credentials};
use crate::auth::{AuthError, SignupService, REQUIRED};
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub message: String,
    pub username: String,
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = Credentials,
    responses (
        (status = 200, description = "Registration successful", body = SignupResponse, content_type = "application/json"),
        (status = 400, description = "Missing or invalid username/password", body = ErrorBody),
        (status = 409, description = "Username already exists", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
    tag = "auth"
)]
// axum handler for signup
#[instrument(skip(service, payload))]
pub async fn signup(
    service: Extension<Arc<SignupService>>,
    payload: Option<Json<Credentials>>,
) -> Result<Json<SignupResponse>, AuthError> {
    let Some(Json(credentials)) = payload else {
        debug!("missing or malformed payload");
        return Err(AuthError::Validation(REQUIRED));
    };

    debug!("credentials: {:?}", credentials);

    let user = service
        .register(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(SignupResponse {
        message: "User registered successfully!".to_string(),
        username: user.username,
    }))
}
