use super::*;
use dlink_core::LinkError;

#[test]
fn test_missing_or_star_pattern_matches_everything() {
    for pattern in [None, Some(""), Some("  "), Some("*")] {
        let filter = NameFilter::new(pattern).unwrap();
        assert!(filter.matches_all());
        assert!(filter.matches("orders.csv"));
        assert!(filter.matches(".hidden"));
    }
}

#[test]
fn test_wildcards() {
    let filter = NameFilter::new(Some("*.csv")).unwrap();
    assert!(filter.matches("orders.csv"));
    assert!(!filter.matches("orders.json"));

    let filter = NameFilter::new(Some("part-?.log")).unwrap();
    assert!(filter.matches("part-1.log"));
    assert!(!filter.matches("part-10.log"));
}

#[test]
fn test_star_does_not_cross_separators() {
    let filter = NameFilter::new(Some("*.csv")).unwrap();
    assert!(!filter.matches("2024/orders.csv"));
}

#[test]
fn test_invalid_pattern_is_configuration_error() {
    let err = NameFilter::new(Some("[unclosed")).unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
    assert!(err.to_string().contains("[unclosed"));
}
