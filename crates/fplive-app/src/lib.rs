// Data retrieval and polling around the live squad scoring engine.

pub mod api;
pub mod config;
pub mod convert;
pub mod poller;
pub mod summary;
