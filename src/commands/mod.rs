pub mod dispatcher;
pub mod parser;
pub mod queue;

pub use dispatcher::{
    CommandDispatcher, DispatchEvent, DispatchReport, LineOutcome, Progress, RunStatus,
};
pub use parser::{BAN_PREFIX, BLOCKED_TERM_PREFIX};
pub use queue::CommandQueue;
