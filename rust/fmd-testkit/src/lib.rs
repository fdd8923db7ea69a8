//! Test utilities for the fragment metadata crates.
//!
//! This crate provides:
//! - `tile`: an encoder for generic tiles (header, chunk table, compressed parts)
//! - `content`: encoders for the payloads of offset, value, sum, null-count and
//!   fragment summary tiles
//! - `fragment`: a builder for complete fragment metadata files
//! - `data_gen`: random payloads and temporary files
//!
//! The encoders only exist to produce fixtures; they do not validate their input.

pub mod content;
pub mod data_gen;
pub mod fragment;
pub mod tile;
