//! Terminal rendering of Markdown text.

use std::str::FromStr;

use termimad::MadSkin;

use agency_shared::{AgencyError, Result};

/// Narrowest wrap width handed to the renderer.
const MIN_WIDTH: usize = 20;

/// Formats Markdown for display in a terminal.
///
/// Failures are reported, not hidden; callers decide whether to fall back
/// to the raw text.
pub trait Renderer: Send + Sync {
    /// Render `text` with the named theme.
    fn render(&self, text: &str, theme: &str) -> Result<String>;
}

/// Built-in themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
    /// Layout only, no colors.
    Plain,
}

impl Theme {
    fn skin(self) -> MadSkin {
        match self {
            Self::Dark => MadSkin::default_dark(),
            Self::Light => MadSkin::default_light(),
            Self::Plain => MadSkin::no_style(),
        }
    }
}

impl FromStr for Theme {
    type Err = AgencyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            "plain" | "notty" => Ok(Self::Plain),
            other => Err(AgencyError::Render(format!("unknown theme {other:?}"))),
        }
    }
}

/// `termimad`-backed renderer.
#[derive(Debug, Clone, Default)]
pub struct TerminalRenderer {
    width: Option<usize>,
}

impl TerminalRenderer {
    /// Wrap at `width` columns, or at the terminal width when `None`.
    pub fn new(width: Option<usize>) -> Self {
        Self { width }
    }

    fn width(&self) -> usize {
        self.width
            .unwrap_or_else(|| usize::from(termimad::terminal_size().0))
            .max(MIN_WIDTH)
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, text: &str, theme: &str) -> Result<String> {
        let skin = theme.parse::<Theme>()?.skin();
        Ok(skin.text(text, Some(self.width())).to_string())
    }
}

/// Returns the text untouched. For non-terminal output and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRenderer;

impl Renderer for PassthroughRenderer {
    fn render(&self, text: &str, _theme: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_names_parse() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!("plain".parse::<Theme>().unwrap(), Theme::Plain);
        assert!("solarized".parse::<Theme>().is_err());
    }

    #[test]
    fn plain_render_keeps_words() {
        let renderer = TerminalRenderer::new(Some(60));
        let out = renderer
            .render("# Title\n\nSome **bold** text.", "plain")
            .unwrap();
        assert!(out.contains("Title"));
        assert!(out.contains("bold"));
        assert!(!out.contains("**"));
    }

    #[test]
    fn unknown_theme_is_a_render_error() {
        let err = TerminalRenderer::new(Some(60))
            .render("text", "no-such-theme")
            .unwrap_err();
        assert!(matches!(err, AgencyError::Render(_)));
    }

    #[test]
    fn passthrough_is_identity() {
        let text = "# Title\n\n<think>x</think>";
        assert_eq!(PassthroughRenderer.render(text, "any").unwrap(), text);
    }
}
