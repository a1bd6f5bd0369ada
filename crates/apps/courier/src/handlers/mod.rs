//! HTTP handlers, one module per resource

pub mod attachment;
pub mod auth;
pub mod email;
pub mod emails;
pub mod gmail;
