//! Request routing rules: path-pattern matching for auth-required and
//! disabled endpoints.

mod pattern;

pub use pattern::{PatternMatch, RuleSet};

/// Collapse repeated slashes and drop a trailing slash (except for `/`
/// itself), so that rule lookups see a canonical path.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::normalize_path;

    #[rstest]
    #[case("/", "/")]
    #[case("//", "/")]
    #[case("/a//b///c", "/a/b/c")]
    #[case("/a/b/", "/a/b")]
    #[case("", "")]
    fn normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(input), expected);
    }
}
