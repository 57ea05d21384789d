use regex::Regex;

/// Finds every absolute http(s) URL in `content`, sorted and deduplicated.
///
/// The scheme is required so bare hostnames in prose are left alone.
/// Trailing sentence punctuation is stripped, since URLs pasted into text
/// usually end at a comma or period that is not part of the link.
pub fn extract_urls(content: &str) -> Vec<String> {
    let pattern = Regex::new(r#"https?://[^\s<>"'`\\]+"#).expect("hardcoded pattern");

    let mut urls: Vec<String> = pattern
        .find_iter(content)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')', ']']).to_string())
        .filter(|u| !u.is_empty())
        .collect();

    urls.sort();
    urls.dedup();
    urls
}
