//! Exclude patterns
//!
//! A pattern is matched against one path segment (a file or directory
//! name), never against a full path. `*` matches any run of characters and
//! `?` matches exactly one; everything else is literal.

/// A compiled set of exclude patterns
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<String>,
}

impl ExcludeSet {
    /// Build a set from configured patterns (blank entries are dropped)
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Whether `name` equals or glob-matches any pattern
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            if pattern.contains('*') || pattern.contains('?') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }
}

/// Names starting with `.` are hidden
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Glob matching for `*` and `?`
///
/// Iterative with single-star backtracking, so `a*b*c` style patterns stay
/// linear in practice.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_text = 0;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_text = t;
            p += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns() {
        let set = ExcludeSet::new([".git", "vendor", "node_modules"]);
        assert!(set.is_excluded("vendor"));
        assert!(set.is_excluded(".git"));
        assert!(!set.is_excluded("vendors"));
        assert!(!set.is_excluded("src"));
    }

    #[test]
    fn star_patterns() {
        assert!(glob_match("*_test.go", "user_test.go"));
        assert!(glob_match("*_test.go", "_test.go"));
        assert!(!glob_match("*_test.go", "user_test.go.bak"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("gen*", "generated"));
        assert!(glob_match("*mock*", "usermockstore.go"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn question_mark_patterns() {
        assert!(glob_match("v?", "v1"));
        assert!(!glob_match("v?", "v"));
        assert!(!glob_match("v?", "v12"));
        assert!(glob_match("?*.sql", "a.sql"));
    }

    #[test]
    fn glob_in_exclude_set() {
        let set = ExcludeSet::new(["*_test.go", "  ", "tmp?"]);
        assert!(set.is_excluded("repo_test.go"));
        assert!(set.is_excluded("tmp1"));
        assert!(!set.is_excluded("repo.go"));
        assert!(!set.is_excluded(""));
    }

    #[test]
    fn hidden_names() {
        assert!(is_hidden(".cache"));
        assert!(is_hidden(".env"));
        assert!(!is_hidden("src"));
    }
}
