pub mod config;
pub mod error;
pub mod image_loader;
pub mod info;
pub mod label;
pub mod split;
