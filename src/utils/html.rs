use std::borrow::Cow;

use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question titles and descriptions come straight from the Airtable base
/// and are embedded into rendered form markup, so they go through a
/// whitelist-based sanitization pass: safe tags (like <b>, <p>) survive,
/// dangerous tags (like <script>) and attributes (like onclick) do not.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Escapes a value destined for an HTML attribute (input values, ids,
/// option values). Unlike `clean_html` this keeps nothing as markup.
pub fn escape_attr(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_script() {
        let cleaned = clean_html("Masse du produit <script>alert(1)</script>");
        assert!(!cleaned.contains("script"));
        assert!(cleaned.contains("Masse du produit"));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("plain"), "plain");
        assert_eq!(escape_attr(r#"a"b"#), "a&quot;b");
        assert_eq!(escape_attr("<oui>"), "&lt;oui&gt;");
    }
}
