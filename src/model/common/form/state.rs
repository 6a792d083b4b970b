use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the form lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormState {
    /// Under construction, only visible to admins.
    Draft,
    /// Accepting responses. Visible to all.
    Published,
    /// No longer accepting responses; entered only via auto-close.
    /// Visible to all, with the reason it closed.
    Closed,
}

impl From<FormState> for Bson {
    fn from(state: FormState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}
