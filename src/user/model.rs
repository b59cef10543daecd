use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Document, ID_FIELD, RecordId, Result};

pub const EMAIL_FIELD: &str = "email";
pub const LAST_NAME_FIELD: &str = "last_name";
pub const COUNTRY_FIELD: &str = "country";
pub const CITY_FIELD: &str = "city";
pub const GENDER_FIELD: &str = "gender";
pub const BIRTH_DATE_FIELD: &str = "birth_date";
/// Set to the number of games seeded for the user.
pub const RATING_FIELD: &str = "rating";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub email: String,
    pub last_name: String,
    pub country: String,
    pub city: String,
    pub gender: String,
    pub birth_date: DateTime<Utc>,
    #[serde(default)]
    pub rating: i64,
}

impl User {
    pub fn into_document(self) -> Document {
        let mut doc = Document::new()
            .with(EMAIL_FIELD, self.email)
            .with(LAST_NAME_FIELD, self.last_name)
            .with(COUNTRY_FIELD, self.country)
            .with(CITY_FIELD, self.city)
            .with(GENDER_FIELD, self.gender)
            .with(BIRTH_DATE_FIELD, self.birth_date)
            .with(RATING_FIELD, self.rating);
        if let Some(id) = self.id {
            doc.set(ID_FIELD, id);
        }
        doc
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        let rating = if doc.contains(RATING_FIELD) {
            doc.get_i64(RATING_FIELD)?
        } else {
            0
        };

        Ok(Self {
            id: doc.id(),
            email: doc.get_str(EMAIL_FIELD)?.to_string(),
            last_name: doc.get_str(LAST_NAME_FIELD)?.to_string(),
            country: doc.get_str(COUNTRY_FIELD)?.to_string(),
            city: doc.get_str(CITY_FIELD)?.to_string(),
            gender: doc.get_str(GENDER_FIELD)?.to_string(),
            birth_date: doc.get_timestamp(BIRTH_DATE_FIELD)?,
            rating,
        })
    }
}

/// Leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    pub user: User,
    pub rating: i64,
}

impl From<User> for UserRating {
    fn from(user: User) -> Self {
        let rating = user.rating;
        Self { user, rating }
    }
}
