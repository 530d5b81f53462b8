pub mod animation;
pub mod config;
pub mod direction;
pub mod input;
