use std::sync::OnceLock;

/// `@name` or `@multi-part-name`: `@` then one or more word characters,
/// optionally extended with `-word` segments. Case-sensitive, no dedup —
/// duplicates in `content` produce duplicates in the output.
fn pattern() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"@(\w+(?:-\w+)*)").unwrap())
}

/// Pure: no side effects, no I/O. Runs before a message is persisted so the
/// extracted names are recorded alongside it.
pub fn parse_mentions(content: &str) -> Vec<String> {
    pattern()
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect()
}
