//! External media tooling.

pub mod ffmpeg;

pub use ffmpeg::{Ffmpeg, Transcoder};
