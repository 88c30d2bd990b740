//! # Sessiongate
//!
//! `sessiongate` owns the browser session of the testing platform frontend. It
//! accepts the backend-issued session token from the sign-in form, verifies it
//! against the backend, and keeps the resulting access/refresh token pair
//! server-side behind an opaque, `HttpOnly` cookie.
//!
//! Every session read checks the access token expiry. Tokens within a minute of
//! expiring are rotated through the backend refresh endpoint; concurrent reads of
//! the same session share a single refresh call. Failures never raise, the
//! session is tagged with a [`auth::SessionError`] and the UI signs the user out.

pub mod auth;
pub mod cli;
pub mod gate;
pub mod nav;
