//! Domain models exchanged with the clinic backend.

mod clinical_record;
pub mod dates;
mod patient;

pub use clinical_record::*;
pub use patient::*;

use serde::{Deserialize, Deserializer};

/// Read `null` as the empty string for text fields the backend may leave unset.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
