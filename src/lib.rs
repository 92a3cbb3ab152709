//! vidbook - Turn lecture videos into illustrated ebooks
//!
//! Samples still frames from a video, drives a generative model through
//! transcription, chapter planning, chapter writing and image placement,
//! and merges the results into a single document.

pub mod cli;
pub mod config;
pub mod document;
pub mod encoder;
pub mod error;
pub mod frames;
pub mod generation;
pub mod library;
pub mod media;
pub mod pipeline;
pub mod workflow;
