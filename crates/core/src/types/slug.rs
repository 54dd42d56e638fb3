//! URL slugs for books, categories, and authors.

/// Turn free text into a URL slug.
///
/// ASCII letters and digits are kept (lowercased); every other run of
/// characters collapses into one `-`. Leading and trailing dashes are
/// dropped, and text with nothing usable becomes `item`.
///
/// ```
/// use bookbazar_core::slugify;
///
/// assert_eq!(slugify("The Hobbit: There & Back Again"), "the-hobbit-there-back-again");
/// assert_eq!(slugify("???"), "item");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

/// The `n`th candidate when making `base` unique: `base`, `base-1`, `base-2`, …
#[must_use]
pub fn slug_candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_owned()
    } else {
        format!("{base}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Dune  "), "dune");
        assert_eq!(slugify("Harry Potter -- Book 1"), "harry-potter-book-1");
        assert_eq!(slugify("--Science & Nature--"), "science-nature");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Society"), "caf-society");
        assert_eq!(slugify("日本"), "item");
        assert_eq!(slugify(""), "item");
    }

    #[test]
    fn test_slug_candidates() {
        assert_eq!(slug_candidate("dune", 0), "dune");
        assert_eq!(slug_candidate("dune", 2), "dune-2");
    }
}
