use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{RegisterReply, RegisterRequest},
    services,
};
use crate::{error::RegistrationError, state::AppState};

pub fn register_routes() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterReply>), RegistrationError> {
    let Json(payload) = payload.map_err(|e| RegistrationError::InvalidBody(e.body_text()))?;

    info!(
        first_name = ?payload.first_name,
        last_name = ?payload.last_name,
        username = ?payload.username,
        email = ?payload.email,
        age = ?payload.age,
        phone = ?payload.phone,
        city = ?payload.city,
        password_len = payload.password.as_deref().map_or(0, str::len),
        "received registration request"
    );

    let user_id = services::register(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(RegisterReply::registered(user_id))))
}
