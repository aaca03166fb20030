//! The three steps of a deploy: find the bundle, publish it, and the
//! workflow tying them together.

pub mod artifact_locator;
pub mod deploy_service;
pub mod publisher;
