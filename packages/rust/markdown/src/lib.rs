//! Markdown in and out of Agency.
//!
//! - [`convert`] turns a fetched HTML page into readable Markdown (`htmd` plus
//!   a cleanup pipeline).
//! - [`code`] walks a parsed Markdown document (`comrak`) and pulls out the
//!   fenced code blocks.
//! - [`render`] is the terminal rendering contract and its `termimad`
//!   implementation.

mod cleanup;
pub mod code;
pub mod convert;
pub mod render;

pub use code::{CodeBlock, FencedBlocks, code_blocks, render_code_blocks};
pub use convert::{ConvertOptions, ConvertResult, convert};
pub use render::{PassthroughRenderer, Renderer, TerminalRenderer, Theme};
