//! Permission model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

/// A named permission bound to the protected action string `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            description: description.into(),
            url: url.into(),
            created_at: Utc::now(),
        }
    }
}
