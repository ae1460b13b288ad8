use std::path::Path;

/// Render `path` relative to `base` when it lives underneath it.
pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    base.and_then(|base| path.strip_prefix(base).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Keep at most `max_bytes` bytes of `text`, cut on a char boundary.
pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    let mut end = max_bytes.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn truncate_string_never_splits_a_char() {
        assert_eq!(truncate_string("ééé", 3), "é");
        assert_eq!(truncate_string("abc", 3), "abc");
    }

    #[test]
    fn display_path_strips_base() {
        let base = Path::new("/tmp/work");
        assert_eq!(
            display_path(Path::new("/tmp/work/results.csv"), Some(base)),
            "results.csv"
        );
        assert_eq!(display_path(Path::new("/other/x.csv"), Some(base)), "/other/x.csv");
    }
}
