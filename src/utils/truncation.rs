/// Cut `text` to at most `max_chars` characters, marking how much was dropped.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}\n... [truncated {} chars]", head.trim_end(), total - max_chars)
}
