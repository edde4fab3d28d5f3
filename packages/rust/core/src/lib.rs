//! Core pipeline orchestration and document assembly for topicloom.
//!
//! This crate ties together source resolution, article extraction, and
//! topic synthesis into the end-to-end tree workflow ([`pipeline::synthesize_tree`]),
//! then renders the result deterministically ([`assembler::assemble`]).

pub mod assembler;
pub mod pipeline;
