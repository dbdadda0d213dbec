//! Post-processing of model output: fence stripping and title extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Recipe;

// Opening fence with optional language tag at the start of a line, or a
// closing fence at the end of one.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[\w-]*[ \t]*|```[ \t]*\r?$").unwrap());

static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove code-fence markers wrapped around the markup.
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text.trim(), "").trim().to_string()
}

/// Text content of the first `<h1>` element, or `None` if there is no
/// complete, non-empty heading.
pub fn extract_title(html: &str) -> Option<String> {
    let inner = H1_RE.captures(html)?.get(1)?.as_str();
    let text = TAG_RE.replace_all(inner, " ");
    let text = decode_entities(&text);
    let title = WHITESPACE_RE.replace_all(text.trim(), " ").into_owned();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Strip fences and extract the title in one step.
pub fn parse_recipe(response: &str) -> Option<Recipe> {
    let html = strip_fences(response);
    let title = extract_title(&html)?;
    Some(Recipe { title, html })
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_html_tag() {
        let raw = "```html\n<h1>Pancakes</h1>\n<p>Mix.</p>\n```";
        assert_eq!(strip_fences(raw), "<h1>Pancakes</h1>\n<p>Mix.</p>");
    }

    #[test]
    fn test_strip_fences_single_line() {
        let raw = "```html<h1>Pancakes</h1><p>Mix.</p>```";
        assert_eq!(strip_fences(raw), "<h1>Pancakes</h1><p>Mix.</p>");
    }

    #[test]
    fn test_strip_fences_bare_and_surrounding_whitespace() {
        let raw = "\n  ```\n<!DOCTYPE html>\n<h1>Stew</h1>\n```  \n";
        assert_eq!(strip_fences(raw), "<!DOCTYPE html>\n<h1>Stew</h1>");
    }

    #[test]
    fn test_strip_fences_crlf() {
        let raw = "```HTML\r\n<h1>Stew</h1>\r\n```\r\n";
        assert_eq!(strip_fences(raw), "<h1>Stew</h1>");
    }

    #[test]
    fn test_strip_fences_leaves_unfenced_text() {
        let raw = "<h1>Bread</h1>";
        assert_eq!(strip_fences(raw), raw);
    }

    #[test]
    fn test_extract_title_simple() {
        assert_eq!(
            extract_title("<html><body><h1>Title</h1></body></html>").as_deref(),
            Some("Title")
        );
    }

    #[test]
    fn test_extract_title_first_heading_wins() {
        let html = "<h1>Apple Pie</h1><h1>Crust</h1>";
        assert_eq!(extract_title(html).as_deref(), Some("Apple Pie"));
    }

    #[test]
    fn test_extract_title_attributes_markup_and_entities() {
        let html = "<H1 class=\"title\">\n  Mac &amp; <em>Cheese</em>\n</H1>";
        assert_eq!(extract_title(html).as_deref(), Some("Mac & Cheese"));
    }

    #[test]
    fn test_extract_title_ignores_h1x_like_tags() {
        assert_eq!(extract_title("<h10>nope</h10>"), None);
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title("<h2>Not a title</h2><p>text</p>"), None);
    }

    #[test]
    fn test_extract_title_unclosed() {
        assert_eq!(extract_title("<h1>Never closed"), None);
    }

    #[test]
    fn test_extract_title_empty() {
        assert_eq!(extract_title("<h1>  <br/> </h1>"), None);
    }

    #[test]
    fn test_parse_recipe() {
        let recipe = parse_recipe("```html<h1>Pancakes</h1><p>Flour</p>```").unwrap();
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.html, "<h1>Pancakes</h1><p>Flour</p>");
    }

    #[test]
    fn test_parse_recipe_without_heading() {
        assert!(parse_recipe("```html<p>Just text</p>```").is_none());
    }
}
