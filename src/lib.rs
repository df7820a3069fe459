// Main library entry point for Tangle.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
