use std::collections::HashSet;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

/// Collapse whitespace runs to one space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn words(s: &str) -> HashSet<String> {
    s.split_whitespace().map(str::to_lowercase).collect()
}

/// Share of case-insensitive words the two descriptions have in common,
/// over the word count of the longer one. `0.0` when either is blank.
pub fn description_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (words(a), words(b));
    let larger = a.len().max(b.len());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / larger as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_whitespace("  PAGO   SERVICIO\tUTE "), "PAGO SERVICIO UTE");
    }

    #[test]
    fn similarity_identical_ignores_case() {
        assert_eq!(description_similarity("Amazon Prime", "AMAZON prime"), 1.0);
    }

    #[test]
    fn similarity_uses_larger_word_count() {
        let score = description_similarity("SUPERMERCADO XYZ", "super xyz compra");
        assert!((score - 1.0 / 3.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn similarity_blank_is_zero() {
        assert_eq!(description_similarity("", "anything"), 0.0);
        assert_eq!(description_similarity("   ", ""), 0.0);
    }

    #[test]
    fn similarity_disjoint_is_zero() {
        assert_eq!(description_similarity("AMAZON", "STARBUCKS"), 0.0);
    }
}
