//! Integration test crate for Cutline.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the model, playback, and export crates to verify
//! they work together.

#[cfg(test)]
mod export;

#[cfg(test)]
mod playback;

#[cfg(test)]
mod timeline;
