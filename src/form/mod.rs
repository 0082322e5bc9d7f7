//! Registration form: field state, format rules, and submission.
//!
//! The form never talks to the network until every rule has passed. Rules
//! are checked fail-fast in a fixed order and only the first failure is
//! reported.

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::registration::repo_types::UserId;

pub mod rules;
pub mod transport;

pub use transport::{HttpTransport, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Username,
    Email,
    Password,
    Age,
    Phone,
    Address,
    City,
}

impl FormField {
    /// All fields in the order the form shows them.
    pub const ALL: [FormField; 9] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Username,
        FormField::Email,
        FormField::Password,
        FormField::Age,
        FormField::Phone,
        FormField::Address,
        FormField::City,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Username => "username",
            FormField::Email => "email",
            FormField::Password => "password",
            FormField::Age => "age",
            FormField::Phone => "phone",
            FormField::Address => "address",
            FormField::City => "city",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::FirstName => "First Name",
            FormField::LastName => "Last Name",
            FormField::Username => "Username (lowercase letters and dashes only)",
            FormField::Email => "Email",
            FormField::Password => "Password",
            FormField::Age => "Age",
            FormField::Phone => "Phone Number (e.g., +91 1234567890)",
            FormField::Address => "Address",
            FormField::City => "City",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown form field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl FormState {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Username => &self.username,
            FormField::Email => &self.email,
            FormField::Password => &self.password,
            FormField::Age => &self.age,
            FormField::Phone => &self.phone,
            FormField::Address => &self.address,
            FormField::City => &self.city,
        }
    }

    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Username => &mut self.username,
            FormField::Email => &mut self.email,
            FormField::Password => &mut self.password,
            FormField::Age => &mut self.age,
            FormField::Phone => &mut self.phone,
            FormField::Address => &mut self.address,
            FormField::City => &mut self.city,
        }
    }

    /// Merge one field. Usernames are filtered to `[a-z-]` as typed.
    pub fn update_field(&mut self, field: FormField, value: &str) {
        *self.slot(field) = match field {
            FormField::Username => rules::filter_username(value),
            _ => value.to_string(),
        };
    }

    pub fn reset(&mut self) {
        *self = FormState::default();
    }
}

/// Payload that passed every form rule, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPayload {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Username can only contain lowercase letters and dashes")]
    InvalidUsername,
    #[error("Please enter a valid phone number with country code (e.g., +91 1234567890)")]
    InvalidPhone,
    #[error("Please enter a valid age")]
    InvalidAge,
}

/// Check `state` against the form rules, stopping at the first failure.
pub fn validate(state: &FormState) -> Result<ValidatedPayload, ValidationError> {
    if FormField::ALL
        .iter()
        .any(|f| state.get(*f).trim().is_empty())
    {
        return Err(ValidationError::MissingFields);
    }
    if !rules::is_valid_email(&state.email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !rules::is_valid_username(&state.username) {
        return Err(ValidationError::InvalidUsername);
    }
    if !rules::is_valid_phone(&state.phone) {
        return Err(ValidationError::InvalidPhone);
    }
    if !rules::is_valid_age(&state.age) {
        return Err(ValidationError::InvalidAge);
    }

    let s = state.clone();
    Ok(ValidatedPayload {
        first_name: s.first_name,
        last_name: s.last_name,
        username: s.username,
        email: s.email,
        password: s.password,
        age: s.age,
        phone: s.phone,
        address: s.address,
        city: s.city,
    })
}

/// Result of one press of the submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored by the service; the form has been cleared.
    Registered { user_id: Option<UserId> },
    /// A form rule failed; nothing was sent.
    Invalid(ValidationError),
    /// The service answered with `success: false`.
    Rejected(String),
    /// The request did not complete.
    Failed(String),
    /// Another submission is still in flight.
    Busy,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Registered { .. })
    }

    /// Text to show the user.
    pub fn message(&self) -> String {
        match self {
            SubmitOutcome::Registered { .. } => "Registration successful!".into(),
            SubmitOutcome::Invalid(e) => e.to_string(),
            SubmitOutcome::Rejected(m) if m.is_empty() => "Registration failed".into(),
            SubmitOutcome::Rejected(m) => m.clone(),
            SubmitOutcome::Failed(_) => "Registration failed. Please try again.".into(),
            SubmitOutcome::Busy => "Registration already in progress".into(),
        }
    }
}

/// Form state plus the transport it submits through.
///
/// Methods take `&self` so the form can be shared between input handlers;
/// the state lock is never held across an await.
pub struct RegistrationForm<T> {
    state: Mutex<FormState>,
    submitting: AtomicBool,
    transport: T,
}

impl<T: Transport> RegistrationForm<T> {
    pub fn new(transport: T) -> Self {
        Self {
            state: Mutex::new(FormState::default()),
            submitting: AtomicBool::new(false),
            transport,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_field(&self, field: FormField, value: &str) {
        self.lock().update_field(field, value);
    }

    /// Like [`update_field`](Self::update_field), addressed by wire name.
    pub fn update_named(&self, name: &str, value: &str) -> Result<(), UnknownField> {
        self.update_field(name.parse()?, value);
        Ok(())
    }

    pub fn state(&self) -> FormState {
        self.lock().clone()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub async fn submit(&self) -> SubmitOutcome {
        if self.submitting.swap(true, Ordering::AcqRel) {
            debug!("submit ignored; request in flight");
            return SubmitOutcome::Busy;
        }
        let _guard = SubmittingGuard(&self.submitting);

        let state = self.state();
        let payload = match validate(&state) {
            Ok(p) => p,
            Err(e) => {
                debug!(rule = ?e, "form rejected");
                return SubmitOutcome::Invalid(e);
            }
        };

        match self.transport.send(&payload).await {
            Ok(reply) if reply.success => {
                self.reset();
                SubmitOutcome::Registered {
                    user_id: reply.user_id,
                }
            }
            Ok(reply) => SubmitOutcome::Rejected(reply.message),
            Err(e) => {
                warn!(error = %e, "registration request failed");
                SubmitOutcome::Failed(e.to_string())
            }
        }
    }
}

// Clears the submitting flag even if the submit future is dropped mid-request.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
