//! Fenced code block extraction from a parsed Markdown document.
//!
//! [`FencedBlocks`] walks a `comrak` AST with an explicit work-list. Each step
//! pops the most recently pushed node, then pushes its next sibling and its
//! first child, in that order. The child therefore comes off the stack
//! before the sibling, so a node's whole subtree is visited before the node
//! that follows it: a pre-order walk, which is document order for Markdown.
//! Indented (unfenced) code blocks are skipped.

use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};

/// A fenced code block lifted out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the fence info string; empty when untagged.
    pub language: String,
    /// Raw block content, verbatim, including its trailing newline.
    pub content: String,
}

impl CodeBlock {
    /// Re-emit the block as a fenced block: opening fence and language tag,
    /// the raw content, closing fence.
    pub fn to_fenced(&self) -> String {
        let mut out = String::with_capacity(self.content.len() + self.language.len() + 8);
        out.push_str("```");
        out.push_str(&self.language);
        out.push('\n');
        out.push_str(&self.content);
        if !self.content.is_empty() && !self.content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
        out
    }
}

/// Iterator over the fenced code blocks below a `comrak` node, in document order.
pub struct FencedBlocks<'a> {
    root: &'a AstNode<'a>,
    pending: Vec<&'a AstNode<'a>>,
}

impl<'a> FencedBlocks<'a> {
    /// Start a walk at `root`. Siblings of `root` itself are never visited.
    pub fn new(root: &'a AstNode<'a>) -> Self {
        Self {
            root,
            pending: vec![root],
        }
    }
}

impl<'a> Iterator for FencedBlocks<'a> {
    type Item = CodeBlock;

    fn next(&mut self) -> Option<CodeBlock> {
        while let Some(node) = self.pending.pop() {
            if !std::ptr::eq(node, self.root) {
                self.pending.extend(node.next_sibling());
            }
            self.pending.extend(node.first_child());
            if let Some(block) = fenced_block(node) {
                return Some(block);
            }
        }
        None
    }
}

fn fenced_block(node: &AstNode<'_>) -> Option<CodeBlock> {
    match &node.data.borrow().value {
        NodeValue::CodeBlock(block) if block.fenced => Some(CodeBlock {
            language: block
                .info
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
            content: block.literal.clone(),
        }),
        _ => None,
    }
}

/// Parse `markdown` and collect its fenced code blocks in document order.
pub fn code_blocks(markdown: &str) -> Vec<CodeBlock> {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &Options::default());
    FencedBlocks::new(root).collect()
}

/// Only the fenced code blocks of `markdown`, each re-fenced with its
/// language tag and followed by a blank line.
pub fn render_code_blocks(markdown: &str) -> String {
    code_blocks(markdown)
        .iter()
        .map(|block| block.to_fenced() + "\n")
        .collect()
}
