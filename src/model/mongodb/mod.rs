mod bson;
mod collection;
mod counter;

pub use bson::{serde_option_datetime, u32_id_filter, Id};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{ensure_form_id_counter_exists, Counter, FORM_ID_COUNTER_ID};
