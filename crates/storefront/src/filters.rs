//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year, for the footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Content hash of main.css, set by the build script.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Keep the first `words` words, adding an ellipsis when text was cut.
///
/// Usage in templates: `{{ review.comment|truncate_words(20) }}`
#[askama::filter_fn]
pub fn truncate_words(
    value: impl Display,
    _env: &dyn askama::Values,
    words: usize,
) -> askama::Result<String> {
    Ok(cut_words(&value.to_string(), words))
}

fn cut_words(text: &str, words: usize) -> String {
    let mut parts = text.split_whitespace();
    let kept: Vec<&str> = parts.by_ref().take(words).collect();
    let mut out = kept.join(" ");
    if parts.next().is_some() {
        out.push_str(" …");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_words() {
        assert_eq!(cut_words("a  short\ncomment", 5), "a short comment");
        assert_eq!(cut_words("one two three four", 2), "one two …");
        assert_eq!(cut_words("", 3), "");
    }
}
