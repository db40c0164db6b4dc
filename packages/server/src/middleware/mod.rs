//! Request middleware: session extractors and the error-page renderer.

pub mod auth;
pub mod error_page;
