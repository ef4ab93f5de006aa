//! View-model mediating between a virtualized grid widget and a remote table
//!
//! The [`GridViewModel`] fetches row windows on demand, tracks cell edits as
//! per-row diffs and reconciles them with the rows confirmed by the server,
//! falling back to a user-confirmed retry/revert loop when a save fails.

pub mod bridge;
pub mod error;
pub mod fetch;
pub mod save;
pub mod view_model;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{DialogPresenter, GridActions, GridBinding, RetryRequest};
pub use error::GridError;
pub use fetch::WindowData;
pub use save::CommitOutcome;
pub use view_model::GridViewModel;
