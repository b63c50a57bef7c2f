pub mod config;
pub mod live;
pub mod pattern;
pub mod preset;
