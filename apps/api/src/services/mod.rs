//! HTTP service implementations.
//!
//! One module per resource. Each exposes a `router()` merged by
//! [`crate::build_router`].

pub mod auth_service;
pub mod bill_service;
pub mod expense_service;
pub mod health_service;
pub mod product_service;
pub mod report_service;
pub mod sale_service;
pub mod settings_service;
pub mod user_service;

use serde::{Deserialize, Deserializer, Serialize};

/// `{"message": "..."}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Message { message }
    }
}

/// `?id=` query of the delete endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    /// The trimmed id, or `None` when absent or blank.
    pub fn value(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Accepts a JSON string or integer and yields a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Accepts `true`/`false` or `1`/`0`.
pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Bool(b) => b,
        Raw::Number(n) => n != 0,
    }))
}
