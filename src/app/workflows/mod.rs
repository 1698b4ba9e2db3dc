mod create_task;

pub use create_task::{SubmitOutcome, submit_task};
