//! Request middleware: cookie-session authentication extractors.

pub mod auth;
