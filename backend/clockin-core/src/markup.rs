// src/markup.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Banners longer than this are some other `flash--wrong` fragment, not the login error.
pub const MAX_BANNER_LEN: usize = 100;

static CSRF_META: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta\s+name="csrf-token"\s+content="([^"]*)"\s*/?>"#)
        .expect("csrf meta pattern is valid")
});

static FLASH_WRONG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="flash flash--wrong">(.*?)</div>"#)
        .expect("flash banner pattern is valid")
});

/// Reads the few markers the sign-in flow depends on out of raw HTML.
pub trait SignInMarkup: Send + Sync {
    /// Anti-forgery token the sign-in form must echo back.
    fn csrf_token(&self, html: &str) -> Option<String>;

    /// Text of the failure banner, if the page carries one.
    fn login_error(&self, html: &str) -> Option<String>;
}

/// Markup of the Factorial sign-in pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactorialMarkup;

impl SignInMarkup for FactorialMarkup {
    fn csrf_token(&self, html: &str) -> Option<String> {
        CSRF_META
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|token| !token.is_empty())
    }

    fn login_error(&self, html: &str) -> Option<String> {
        let text = FLASH_WRONG.captures(html)?.get(1)?.as_str().trim();
        if text.is_empty() || text.chars().count() >= MAX_BANNER_LEN {
            return None;
        }
        Some(text.to_string())
    }
}
