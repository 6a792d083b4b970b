mod question;
mod settings;
mod state;

pub use question::{Question, QuestionOption, QuestionType};
pub use settings::{EmailNotification, FormSettings, ReceiptVars};
pub use state::FormState;

/// Our form IDs are integers.
pub type FormId = u32;
/// Our question IDs are integers.
pub type QuestionId = u32;
