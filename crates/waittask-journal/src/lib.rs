pub mod error;
pub mod event;
pub mod invariants;
pub mod replay;
pub mod resolution;
pub mod status;

pub use error::JournalViolation;
pub use event::{JournalEntry, WaitEvent, WaitJournal};
pub use invariants::{InvariantState, validate_journal};
pub use replay::ReplayCache;
pub use status::{WaitPhase, derive_next_status, derive_status};
