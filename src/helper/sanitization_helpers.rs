use crate::error::{AppError, AppResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_SLUG_LEN: usize = 255;
const MAX_TITLE_LEN: usize = 255;

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"))
}

/// Strips all HTML tags from a string, leaving only the plain text content.
pub fn strip_all_html(input: &str) -> String {
    ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}

pub fn validate_slug(slug: &str) -> AppResult<String> {
    let slug = slug.trim();
    if slug.len() > MAX_SLUG_LEN || !slug_regex().is_match(slug) {
        return Err(AppError::Validation(format!(
            "Invalid slug '{}'. Use lowercase letters, digits and single hyphens.",
            slug
        )));
    }
    Ok(slug.to_string())
}

pub fn clean_title(title: &str) -> AppResult<String> {
    let title = strip_all_html(title).trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Title cannot be empty.".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title cannot exceed {} characters.",
            MAX_TITLE_LEN
        )));
    }
    Ok(title)
}

pub fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(|d| strip_all_html(d).trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Trims tags, drops empty ones and repeats, keeps the given order.
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_hyphenated() {
        assert_eq!(validate_slug("hello-world").unwrap(), "hello-world");
        assert_eq!(validate_slug(" post-2 ").unwrap(), "post-2");
        assert!(validate_slug("Hello-World").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn titles_lose_their_markup() {
        assert_eq!(clean_title("<b>Bold</b> move").unwrap(), "Bold move");
        assert!(clean_title("<script></script>").is_err());
    }

    #[test]
    fn tags_keep_order_without_blanks_or_repeats() {
        let tags = vec![" rust ".to_string(), "".to_string(), "web".to_string(), "rust".to_string()];
        assert_eq!(clean_tags(&tags), vec!["rust", "web"]);
    }
}
