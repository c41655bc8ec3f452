//! API handlers for the Lernejo identity service.
//!
//! `auth` owns the account lifecycle endpoints, `users` the admin-side
//! management routes, and `health`/`root` the service surface.

pub mod auth;
pub mod health;
pub mod root;
pub mod users;
