//! HTTP front-end: upload an image or a video, get labelled boxes back.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod upload;
pub mod video;
