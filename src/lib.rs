//! dlp-supervisor - Supervised yt-dlp downloads with live progress events.

pub mod cli;
pub mod config;
pub mod display;
pub mod supervisor;
