//! Domain events and append-only audit logs.

pub mod event;
pub mod log;

pub use event::Event;
pub use log::AuditLog;
