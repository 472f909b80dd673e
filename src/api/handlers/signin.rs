use super::{error::ErrorBody, Credentials};
use crate::auth::{AuthError, SigninService};
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SigninResponse {
    pub message: String,
    pub user_id: Uuid,
    pub username: String,
}

#[utoipa::path(
    post,
    path = "/signin",
    request_body = Credentials,
    responses (
        (status = 200, description = "Sign-in successful", body = SigninResponse, content_type = "application/json"),
        (status = 400, description = "Missing username or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
    tag = "auth"
)]
// axum handler for signin
#[instrument(skip(service, payload))]
pub async fn signin(
    service: Extension<Arc<SigninService>>,
    payload: Option<Json<Credentials>>,
) -> Result<Json<SigninResponse>, AuthError> {
    let Some(Json(credentials)) = payload else {
        debug!("missing or malformed payload");
        return Err(AuthError::MissingCredentials);
    };

    let user = service
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(SigninResponse {
        message: "Sign-in successful!".to_string(),
        user_id: user.id,
        username: user.username,
    }))
}
