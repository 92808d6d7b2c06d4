//! Business logic layer.

pub mod account_service;
pub mod mailer;
