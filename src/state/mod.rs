//! Selection and chat state
//!
//! The page session state and the durable store the selection lives in.

pub mod session;
pub mod store;

pub use session::{request_completion, CompletionOutcome, PickerSession, SessionError, SharedSession};
pub use store::SelectionStore;
