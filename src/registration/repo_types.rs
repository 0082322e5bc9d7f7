use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Row id assigned by the store.
pub type UserId = i64;

/// Fields the service has checked and is about to persist.
///
/// `password` is kept verbatim. Hashing is not part of this service yet, so
/// anything with read access to the `users` table can read every password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
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

/// Character limits of the `users` varchar columns. `address` is TEXT.
pub const COLUMN_LIMITS: [(&str, usize); 8] = [
    ("first_name", 255),
    ("last_name", 255),
    ("username", 255),
    ("email", 255),
    ("password", 255),
    ("age", 3),
    ("phone", 20),
    ("city", 255),
];

impl NewUser {
    fn column(&self, name: &str) -> &str {
        match name {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "username" => &self.username,
            "email" => &self.email,
            "password" => &self.password,
            "age" => &self.age,
            "phone" => &self.phone,
            "city" => &self.city,
            _ => &self.address,
        }
    }

    /// First column whose value exceeds its varchar limit, with that limit.
    pub fn oversized_column(&self) -> Option<(&'static str, usize)> {
        COLUMN_LIMITS
            .into_iter()
            .find(|(name, limit)| self.column(name).chars().count() > *limit)
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub age: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    pub fn from_new(id: UserId, user: NewUser, created_at: OffsetDateTime) -> Self {
        let NewUser {
            first_name,
            last_name,
            username,
            email,
            password,
            age,
            phone,
            address,
            city,
        } = user;
        Self {
            id,
            first_name,
            last_name,
            username,
            email,
            password,
            age,
            phone,
            address,
            city,
            created_at,
        }
    }

    /// Business fields of the record, as they were handed to the store.
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            age: self.age.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
        }
    }
}
