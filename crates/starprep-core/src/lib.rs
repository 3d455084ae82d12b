pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod frames;
pub mod pipeline;
pub mod profile;
