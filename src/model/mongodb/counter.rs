use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Coll;

/// The well-known ID of the global form ID counter.
pub const FORM_ID_COUNTER_ID: &str = "form_id";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| Error::Internal(format!("No counter with ID '{}'", id)))?;
        Ok(counter.next)
    }
}

/// Ensure the global form ID counter exists, starting at 1.
///
/// This operation is idempotent.
pub async fn ensure_form_id_counter_exists(counters: &Coll<Counter>) -> std::result::Result<(), DbError> {
    let options = UpdateOptions::builder().upsert(true).build();
    counters
        .update_one(
            doc! { "_id": FORM_ID_COUNTER_ID },
            doc! { "$setOnInsert": { "next": 1 } },
            options,
        )
        .await?;
    Ok(())
}
