use tracing::{debug, info, instrument};

use super::{
    dto::RegisterRequest,
    repo_types::{NewUser, UserId},
};
use crate::{
    error::RegistrationError,
    storage::{StoreError, UserStore},
};

/// Check that all nine fields are present and not blank.
///
/// Whitespace-only values count as missing; the client form only checks for
/// empty strings.
pub fn require_fields(req: RegisterRequest) -> Result<NewUser, RegistrationError> {
    let mut missing = Vec::new();
    let mut take = |name: &'static str, value: Option<String>| match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    };

    let user = NewUser {
        first_name: take("firstName", req.first_name),
        last_name: take("lastName", req.last_name),
        username: take("username", req.username),
        email: take("email", req.email),
        password: take("password", req.password),
        age: take("age", req.age.map(|a| a.into_text())),
        phone: take("phone", req.phone),
        address: take("address", req.address),
        city: take("city", req.city),
    };

    if missing.is_empty() {
        Ok(user)
    } else {
        Err(RegistrationError::MissingFields(missing))
    }
}

/// Validate, provision the schema, and insert one user.
#[instrument(skip(store, req))]
pub async fn register(
    store: &dyn UserStore,
    req: RegisterRequest,
) -> Result<UserId, RegistrationError> {
    let user = require_fields(req)?;
    debug!("fields validated");

    store.ensure_schema().await?;
    debug!("schema ready");

    let email = user.email.clone();
    match store.insert(user).await {
        Ok(id) => {
            info!(user_id = id, %email, "user registered");
            Ok(id)
        }
        Err(StoreError::DuplicateEmail) => Err(RegistrationError::DuplicateEmail),
        Err(StoreError::Backend(e)) => Err(RegistrationError::Persistence(e)),
    }
}
