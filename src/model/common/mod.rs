//! The form runtime: the question/form data model and the pure logic the
//! server and any client-side mirror must share — pagination, validation,
//! the submission gate and the auto-close evaluator. Nothing in this
//! module touches the database or the network.

pub mod answer;
pub mod autoclose;
pub mod email;
pub mod form;
pub mod gate;
pub mod pages;
pub mod validation;
