//! Account lifecycle handlers: registration, one-time-code verification,
//! login, password reset, and the authenticated request gate.
//!
//! ## Verification state machine
//!
//! `unverified -> (code verify) -> verified`; `verified -> (admin block) ->
//! blocked -> (admin unblock) -> verified`; any state `-> (delete) -> gone`
//! (cascades to owned records). A blocked account cannot log in or pass the
//! request gate regardless of verification state or token validity.
//!
//! ## Concurrency
//!
//! There is no inter-request coordination. Concurrent registrations for one
//! email race on the storage unique index; the loser surfaces as a conflict.
//! Concurrent resends serialize on the per-user unique code row, and the
//! last committed code is the only one that verifies.

pub(crate) mod account;
pub(crate) mod login;
mod password;
pub(crate) mod password_reset;
pub(crate) mod principal;
pub(crate) mod register;
mod state;
pub(crate) mod storage;
mod token;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};
