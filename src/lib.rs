//! Users CRUD service: HTTP handlers over a Postgres `users` table.
//!
//! Requests flow handler → validation → [`users::services::UserService`] →
//! [`users::repo::UserStore`]. Each layer narrows the errors of the one below;
//! only [`error::ApiError`] is ever rendered to clients.

pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod users;
pub mod validation;
