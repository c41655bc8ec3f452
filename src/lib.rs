//! # Lernejo (Identity & Onboarding API)
//!
//! `lernejo` is the identity and onboarding service of the Lernejo learning
//! platform. It owns the account lifecycle: registration with email one-time
//! codes, login with stateless session tokens, password reset, and the
//! admin-side block/unblock transitions.
//!
//! ## Verification (one-time codes)
//!
//! Registration stores an unverified account plus a 6-digit numeric code with
//! a short expiry. The code is delivered by email and consumed on first
//! successful verification; resending replaces any previous code. A code
//! never validates past its expiry, whether or not the periodic sweep has
//! already removed it.
//!
//! ## Sessions
//!
//! Login issues a signed bearer token carrying the user id. There is no
//! server-side session state: a token stays valid until its embedded expiry
//! elapses or the signing secret changes. Blocked accounts are rejected at
//! the request gate regardless of token validity.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
