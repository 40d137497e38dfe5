//! Run events and the sinks that consume them.
//!
//! - [`RunEvent`]: one significant thing that happened during a cleanup
//!   run (start, discovery progress, per-job outcome, interrupt, summary).
//! - [`EventSink`]: synchronous consumer of run events. The pipeline emits
//!   every event exactly once to a single sink; [`EventFanout`] forwards
//!   to several.
//! - [`AuditLog`]: append-only, line-oriented sink that timestamps and
//!   writes every event to a file.

pub mod audit;
pub mod event;
pub mod sink;

pub use audit::{AuditLog, AuditLogError};
pub use event::RunEvent;
pub use sink::{EventFanout, EventSink};
