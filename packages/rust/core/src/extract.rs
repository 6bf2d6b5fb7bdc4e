//! Named post-processing strategies for generated text.
//!
//! | Name      | Output                                                      |
//! |-----------|-------------------------------------------------------------|
//! | `default` | the text rendered for the terminal (raw text if that fails) |
//! | `result`  | `default` applied after reasoning spans are removed          |
//! | `code`    | only the fenced code blocks, unrendered                      |
//!
//! Unknown names resolve to `default`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, instrument};

use agency_markdown::{Renderer, render_code_blocks};
use agency_shared::{AgencyError, ExtractConfig, Result};

/// Name of the fallback strategy.
pub const DEFAULT_STRATEGY: &str = "default";

/// A caller-supplied strategy.
pub type CustomStrategy = Arc<dyn Fn(&str) -> String + Send + Sync>;

static FALLBACK: Strategy = Strategy::Default;

/// One way of turning generated text into output.
#[derive(Clone)]
pub enum Strategy {
    /// Render for the terminal.
    Default,
    /// Strip reasoning spans, then render.
    Result,
    /// Fenced code blocks only.
    Code,
    Custom(CustomStrategy),
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Result => f.write_str("Result"),
            Self::Code => f.write_str("Code"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Name → strategy mapping with a `default` fallback.
pub struct ExtractionRegistry {
    strategies: BTreeMap<String, Strategy>,
    renderer: Arc<dyn Renderer>,
    theme: String,
    reasoning: Regex,
}

impl ExtractionRegistry {
    /// Build the registry with the built-in strategies.
    ///
    /// `renderer` and `theme` drive `default`; `config` supplies the
    /// reasoning markers removed by `result`.
    pub fn new(
        renderer: Arc<dyn Renderer>,
        theme: impl Into<String>,
        config: &ExtractConfig,
    ) -> Result<Self> {
        let pattern = format!(
            "(?s){}.*?{}",
            regex::escape(&config.reasoning_open),
            regex::escape(&config.reasoning_close)
        );
        let reasoning = Regex::new(&pattern)
            .map_err(|e| AgencyError::config(format!("invalid reasoning markers: {e}")))?;

        let strategies = BTreeMap::from([
            (DEFAULT_STRATEGY.to_string(), Strategy::Default),
            ("result".to_string(), Strategy::Result),
            ("code".to_string(), Strategy::Code),
        ]);

        Ok(Self {
            strategies,
            renderer,
            theme: theme.into(),
            reasoning,
        })
    }

    /// Add or replace a strategy.
    pub fn register(&mut self, name: impl Into<String>, strategy: Strategy) {
        self.strategies.insert(name.into(), strategy);
    }

    /// Look up `name`, falling back to `default`.
    pub fn resolve(&self, name: &str) -> &Strategy {
        self.strategies
            .get(name)
            .or_else(|| self.strategies.get(DEFAULT_STRATEGY))
            .unwrap_or(&FALLBACK)
    }

    /// Registered names in alphabetical order.
    pub fn list(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Apply the strategy called `name` to `text`.
    #[instrument(skip(self, text), fields(input_len = text.len()))]
    pub fn extract(&self, name: &str, text: &str) -> String {
        match self.resolve(name) {
            Strategy::Default => self.render_or_raw(text),
            Strategy::Result => self.render_or_raw(&self.strip_reasoning(text)),
            Strategy::Code => render_code_blocks(text),
            Strategy::Custom(f) => f(text),
        }
    }

    fn strip_reasoning(&self, text: &str) -> String {
        self.reasoning.replace_all(text, "").into_owned()
    }

    fn render_or_raw(&self, text: &str) -> String {
        match self.renderer.render(text, &self.theme) {
            Ok(rendered) => rendered,
            Err(e) => {
                debug!(error = %e, "render failed, using raw text");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_markdown::{PassthroughRenderer, TerminalRenderer, code_blocks};

    fn registry() -> ExtractionRegistry {
        ExtractionRegistry::new(
            Arc::new(PassthroughRenderer),
            "plain",
            &ExtractConfig::default(),
        )
        .unwrap()
    }

    /// Uppercases, so rendered output is distinguishable from raw text.
    struct Shouting;

    impl Renderer for Shouting {
        fn render(&self, text: &str, _theme: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn list_is_sorted_and_has_default() {
        let mut registry = registry();
        registry.register("alpha", Strategy::Custom(Arc::new(|t: &str| t.to_string())));
        registry.register("zulu", Strategy::Code);

        let names = registry.list();
        assert_eq!(names, ["alpha", "code", "default", "result", "zulu"]);
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unknown_name_falls_back_to_default() {
        let registry = registry();
        assert!(matches!(registry.resolve("nope"), Strategy::Default));
        assert!(matches!(registry.resolve("code"), Strategy::Code));
        assert_eq!(registry.extract("nope", "text"), registry.extract("default", "text"));
    }

    #[test]
    fn result_strips_multiline_reasoning() {
        let registry = ExtractionRegistry::new(
            Arc::new(Shouting),
            "dark",
            &ExtractConfig::default(),
        )
        .unwrap();

        let input = "<think>first\nsecond\n</think>Y";
        assert_eq!(registry.extract("result", input), registry.extract("default", "Y"));
        assert_eq!(registry.extract("result", input), "Y");
    }

    #[test]
    fn result_removes_every_span_non_greedily() {
        let input = "a<think>x</think>b<think>\ny\n</think>c";
        assert_eq!(registry().extract("result", input), "abc");
    }

    #[test]
    fn result_without_markers_is_default() {
        let registry = ExtractionRegistry::new(
            Arc::new(Shouting),
            "dark",
            &ExtractConfig::default(),
        )
        .unwrap();

        let input = "no reasoning here\n\n- just a list";
        assert_eq!(registry.extract("result", input), registry.extract("default", input));
    }

    #[test]
    fn unclosed_marker_is_left_alone() {
        let input = "<think>never closed";
        assert_eq!(registry().extract("result", input), input);
    }

    #[test]
    fn custom_markers() {
        let config = ExtractConfig {
            reasoning_open: "[[".into(),
            reasoning_close: "]]".into(),
        };
        let registry =
            ExtractionRegistry::new(Arc::new(PassthroughRenderer), "plain", &config).unwrap();
        assert_eq!(registry.extract("result", "keep [[drop.*]]this"), "keep this");
    }

    #[test]
    fn default_falls_back_to_raw_text_on_render_error() {
        let registry = ExtractionRegistry::new(
            Arc::new(TerminalRenderer::new(Some(80))),
            "neon",
            &ExtractConfig::default(),
        )
        .unwrap();

        assert_eq!(registry.extract("default", "**bold**"), "**bold**");
    }

    #[test]
    fn code_returns_only_fenced_blocks() {
        let doc = std::fs::read_to_string("testdata/code.md").unwrap();
        let out = registry().extract("code", &doc);

        let blocks = code_blocks(&doc);
        assert_eq!(blocks.len(), 3);
        assert_eq!(code_blocks(&out), blocks);

        let languages: Vec<_> = blocks.iter().map(|b| b.language.as_str()).collect();
        assert_eq!(languages, ["rust", "sh", "python"]);

        let expected: String = blocks.iter().map(|b| b.to_fenced() + "\n").collect();
        assert_eq!(out, expected);
        assert!(!out.contains("Here is the parser"));
        assert!(!out.contains("That is all."));
    }

    #[test]
    fn code_is_not_rendered() {
        let registry = ExtractionRegistry::new(
            Arc::new(Shouting),
            "dark",
            &ExtractConfig::default(),
        )
        .unwrap();

        let out = registry.extract("code", "```rust\nfn main() {}\n```\n");
        assert_eq!(out, "```rust\nfn main() {}\n```\n\n");
    }

    #[test]
    fn custom_strategy_runs() {
        let mut registry = registry();
        registry.register("count", Strategy::Custom(Arc::new(|t: &str| t.len().to_string())));
        assert_eq!(registry.extract("count", "four"), "4");
    }
}
