//! Message handling - Event-driven command processing

pub mod dispatcher;
pub mod guard;
pub mod parser;
pub mod policy;

pub use dispatcher::CommandDispatcher;
pub use guard::{GuardedHandler, Invocation, ACCESS_DENIED_REPLY};
pub use parser::{CommandParser, ParsedCommand};
