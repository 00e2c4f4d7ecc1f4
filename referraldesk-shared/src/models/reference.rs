use serde::{Deserialize, Serialize};

use super::lenient;

/// A selectable `{id, name}` pair (state, district).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReferenceItem {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    pub name: String,
}

impl ReferenceItem {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Envelope payload of the `states` and `districts/{id}` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceListResponse {
    #[serde(default)]
    pub data: Vec<ReferenceItem>,
}

/// Envelope payload of the `register-amount` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationAmountResponse {
    #[serde(default, alias = "data", deserialize_with = "lenient::amount")]
    pub amount: f64,
}

/// Envelope payload of `get-guide-details/{sam_no}`: the referring member's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuideDetailsResponse {
    pub name: String,
}
