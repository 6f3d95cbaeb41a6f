//! Domain entities - Core business objects with no external dependencies

pub mod access_list;
pub mod dispatch;
pub mod event;
pub mod log_record;
pub mod plugin;
pub mod settings;

pub use access_list::{AccessList, ListEntry};
pub use dispatch::DispatchContext;
pub use event::{Chat, ChatKind, InboundEvent, MessageId, PeerId, Sender};
pub use log_record::{LogRecord, Outcome};
pub use plugin::AccessLevel;
pub use settings::{Mode, Settings};
