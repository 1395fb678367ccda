//! `taskdesk` client library: synchronizer, derived view, forms, prompt.

pub mod command;
pub mod config;
pub mod form;
pub mod session;
pub mod sync;
pub mod view;
