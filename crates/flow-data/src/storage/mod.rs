//! 로컬 저장소.

pub mod json_store;

pub use json_store::{JsonStore, LoadedHistory};
