//! JSON envelopes: `{ "data", "meta": { "total" } }` for payloads and
//! `{ "message" }` for acknowledgements.

use serde::Serialize;

use crate::models::Listing;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }
}

impl<T> From<Listing<T>> for DataResponse<Vec<T>> {
    fn from(listing: Listing<T>) -> Self {
        Self {
            meta: Some(Meta {
                total: listing.count,
            }),
            data: listing.data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
