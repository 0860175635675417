use regex::Regex;
use std::sync::OnceLock;

struct HtmlPatterns {
    hidden: Regex,
    comments: Regex,
    block_tags: Regex,
    tags: Regex,
}

fn patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HtmlPatterns {
        hidden: Regex::new(r"(?is)<(script|style|head|noscript|template)\b[^>]*>.*?</(script|style|head|noscript|template)\s*>")
            .unwrap(),
        comments: Regex::new(r"(?s)<!--.*?-->").unwrap(),
        block_tags: Regex::new(
            r"(?i)</?(p|div|br|li|ul|ol|tr|table|h[1-6]|section|article|header|footer|blockquote|pre|hr|title)\b[^>]*>",
        )
        .unwrap(),
        tags: Regex::new(r"(?s)<[^>]*>").unwrap(),
    })
}

/// Strips markup from an HTML document, keeping visible text in order.
/// Lines are trimmed and blank lines dropped.
pub fn strip_html(html: &str) -> String {
    let p = patterns();
    let text = p.hidden.replace_all(html, "");
    let text = p.comments.replace_all(&text, "");
    let text = p.block_tags.replace_all(&text, "\n");
    let text = p.tags.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes the XML entities plus `&nbsp;` and numeric character references.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                output.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_scripts_and_styles() {
        let html = r#"<html><head><title>Ignored</title><style>p { color: red; }</style></head>
<body>
  <h1>Heading</h1>
  <script type="text/javascript">var x = "<p>nope</p>";</script>
  <p>First <em>para</em>graph.</p>
  <!-- hidden comment -->
  <ul><li>One</li><li>Two</li></ul>
</body></html>"#;

        assert_eq!(strip_html(html), "Heading\nFirst paragraph.\nOne\nTwo");
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &unknown; &"),
            "a & b <c> AB &unknown; &"
        );
        assert_eq!(strip_html("<p>Fish&nbsp;&amp;&nbsp;chips</p>"), "Fish & chips");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(strip_html("one<br>two<br/>three"), "one\ntwo\nthree");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("<html><body></body></html>"), "");
    }
}
