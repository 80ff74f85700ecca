pub mod controller;
pub mod notify;

pub use controller::{BoardController, BoardError, BoardPhase, DropOutcome, Outcome, PendingReorder};
pub use notify::{Notice, NoticeKind, Notifier, Silent};
