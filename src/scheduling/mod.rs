mod alert;
mod evaluator;
pub mod poller;
mod task;

pub use alert::{ActiveAlert, ReminderAlert};
pub use evaluator::find_due;
