//! Release tag normalization and ordering.
//!
//! Tags published on release hosts are free-form strings ("v1.2.0",
//! "2024.12", "1.0-beta"). They are ordered with a numeric-aware lexical
//! comparison rather than semantic versioning: digit runs compare as
//! numbers, everything else compares case-insensitively. This ranks the
//! common cases correctly ("1.10" after "1.9") without rejecting tags that
//! are not valid semver.

use std::cmp::Ordering;

/// Normalize a release tag.
///
/// Trims surrounding whitespace and strips a single leading `v` or `V`.
///
/// # Example
///
/// ```
/// use relsync::version::normalize;
///
/// assert_eq!(normalize("  v1.2.0 "), "1.2.0");
/// assert_eq!(normalize("V2"), "2");
/// assert_eq!(normalize("vv3"), "v3");
/// ```
pub fn normalize(version: &str) -> String {
    let trimmed = version.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Decide whether `remote` should replace the installed `local` version.
///
/// An empty local version always loses. Identical normalized versions are
/// never newer. Otherwise the remote wins iff it sorts strictly after the
/// local version under [`compare_versions`].
///
/// # Example
///
/// ```
/// use relsync::version::is_remote_newer;
///
/// assert!(is_remote_newer("", "1.0"));
/// assert!(is_remote_newer("1.9", "1.10"));
/// assert!(!is_remote_newer("v1.0", "1.0"));
/// ```
pub fn is_remote_newer(local: &str, remote: &str) -> bool {
    let local = normalize(local);
    let remote = normalize(remote);

    if local.is_empty() {
        return true;
    }
    if local == remote {
        return false;
    }

    compare_versions(&remote, &local) == Ordering::Greater
}

/// Numeric-aware lexical ordering of two version strings.
///
/// Both strings are split into alternating digit and non-digit runs. Digit
/// runs compare by numeric value, non-digit runs case-insensitively. When
/// all shared runs are equal the shorter string sorts first. A final
/// byte-wise comparison keeps the ordering total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ordering = match (l, r) {
            (Segment::Number(l), Segment::Number(r)) => compare_digits(l, r),
            _ => l.text().to_lowercase().cmp(&r.text().to_lowercase()),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Number(&'a str),
    Text(&'a str),
}

impl<'a> Segment<'a> {
    fn text(&self) -> &'a str {
        match self {
            Segment::Number(s) | Segment::Text(s) => s,
        }
    }
}

fn segments(value: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut current_digit: Option<bool> = None;

    for (index, ch) in value.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match current_digit {
            Some(previous) if previous != is_digit => {
                result.push(make_segment(&value[start..index], previous));
                start = index;
            }
            _ => {}
        }
        current_digit = Some(is_digit);
    }

    if let Some(is_digit) = current_digit {
        result.push(make_segment(&value[start..], is_digit));
    }

    result
}

fn make_segment(run: &str, is_digit: bool) -> Segment<'_> {
    if is_digit {
        Segment::Number(run)
    } else {
        Segment::Text(run)
    }
}

/// Compare two ASCII digit runs by value without parsing (no overflow).
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_strips_prefix_and_whitespace() {
        assert_eq!(normalize("v1.0"), "1.0");
        assert_eq!(normalize("V1.0"), "1.0");
        assert_eq!(normalize("\t1.0\n"), "1.0");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_strips_only_one_prefix() {
        assert_eq!(normalize("vv1"), "v1");
        assert_eq!(normalize("version-2"), "ersion-2");
    }

    #[test]
    fn test_empty_local_is_always_older() {
        assert!(is_remote_newer("", "1.0"));
        assert!(is_remote_newer("  ", "0.0.1"));
    }

    #[test]
    fn test_equal_versions_are_not_newer() {
        assert!(!is_remote_newer("1.0", "1.0"));
        assert!(!is_remote_newer("v1.0", "1.0"));
        assert!(!is_remote_newer("1.0", " V1.0 "));
    }

    #[test]
    fn test_numeric_runs_compare_by_value() {
        assert!(is_remote_newer("1.9", "1.10"));
        assert!(is_remote_newer("2.9", "2.10"));
        assert!(is_remote_newer("9", "10"));
        assert!(!is_remote_newer("1.10", "1.9"));
    }

    #[test]
    fn test_older_remote_is_not_newer() {
        assert!(!is_remote_newer("2.0.0", "1.9.9"));
        assert!(!is_remote_newer("1.0.1", "1.0"));
    }

    #[test]
    fn test_longer_version_sorts_after_prefix() {
        assert!(is_remote_newer("1.0", "1.0.1"));
        assert!(is_remote_newer("2.0", "2.0-beta"));
    }

    #[test]
    fn test_leading_zeros_ignored_in_numeric_runs() {
        assert_eq!(compare_digits("007", "7"), Ordering::Equal);
        assert!(is_remote_newer("1.02", "1.3"));
        assert!(!is_remote_newer("1.2", "1.02"));
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let big = "1.123456789012345678901234567890";
        let bigger = "1.123456789012345678901234567891";
        assert_eq!(compare_versions(big, bigger), Ordering::Less);
    }

    #[test]
    fn test_text_runs_compare_case_insensitively() {
        assert_eq!(compare_versions("1.0-Beta", "1.0-alpha"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-RC1", "1.0-rc2"), Ordering::Less);
    }

    #[test]
    fn test_calendar_tags_are_ordered_lexically() {
        // Heuristic ordering, not semver: a calendar tag beats a small major.
        assert!(is_remote_newer("2.5", "2024.12"));
    }

    #[test]
    fn test_segments_split_runs() {
        assert_eq!(
            segments("1.10b"),
            vec![
                Segment::Number("1"),
                Segment::Text("."),
                Segment::Number("10"),
                Segment::Text("b"),
            ]
        );
        assert!(segments("").is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_strips_decoration(s in "[0-9a-z.\\-]{0,12}") {
            let decorated = format!("  v{}\t", s);
            prop_assert_eq!(normalize(&decorated), s);
        }

        #[test]
        fn prop_version_is_never_newer_than_itself(s in "v?[0-9]{1,3}(\\.[0-9]{1,3}){0,3}") {
            prop_assert!(!is_remote_newer(&s, &s));
        }

        #[test]
        fn prop_ordering_is_antisymmetric(
            a in "[0-9]{1,3}(\\.[0-9a-c]{1,3}){0,3}",
            b in "[0-9]{1,3}(\\.[0-9a-c]{1,3}){0,3}",
        ) {
            prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        }

        #[test]
        fn prop_bumping_last_component_is_newer(major in 0u32..100, minor in 0u32..100) {
            let local = format!("{}.{}", major, minor);
            let remote = format!("{}.{}", major, minor + 1);
            prop_assert!(is_remote_newer(&local, &remote));
        }
    }
}
