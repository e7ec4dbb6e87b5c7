use study_flow::engine::normalization::{
    is_detail_reference, is_listing_view, normalize_reference, reference_key,
};

// * Test Suite for Reference Normalization

const BASE: &str = "https://classroom.google.com/u/0/a/not-turned-in/all";

#[test]
fn test_relative_reference_is_made_absolute() {
    assert_eq!(
        normalize_reference("/c/MTIz/a/NDU2/details", BASE).unwrap(),
        "https://classroom.google.com/c/MTIz/a/NDU2/details"
    );
}

#[test]
fn test_strip_fragment_and_query() {
    assert_eq!(
        normalize_reference("/c/MTIz/a/NDU2/details?authuser=0#comments", BASE).unwrap(),
        "https://classroom.google.com/c/MTIz/a/NDU2/details"
    );
}

#[test]
fn test_lowercase_host() {
    assert_eq!(
        normalize_reference("https://CLASSROOM.Google.com/c/A/a/B", BASE).unwrap(),
        "https://classroom.google.com/c/A/a/B"
    );
}

#[test]
fn test_trailing_slash_removed_but_path_case_kept() {
    // * Item ids are case-sensitive base64
    assert_eq!(
        normalize_reference("/c/MtIz/a/NdU2/", BASE).unwrap(),
        "https://classroom.google.com/c/MtIz/a/NdU2"
    );
}

#[test]
fn test_non_http_links_are_rejected() {
    assert_eq!(normalize_reference("javascript:void(0)", BASE), None);
    assert_eq!(normalize_reference("mailto:t@school.test", BASE), None);
    assert_eq!(normalize_reference("   ", BASE), None);
}

#[test]
fn test_equivalent_links_share_a_key() {
    let variants = [
        "/c/MTIz/a/NDU2/details",
        "https://classroom.google.com/c/MTIz/a/NDU2/details?hl=en",
        "/c/MTIz/a/NDU2/details/#top",
    ];
    let keys: Vec<u64> = variants
        .iter()
        .map(|v| reference_key(&normalize_reference(v, BASE).unwrap()))
        .collect();
    assert!(keys.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_detail_vs_listing_classification() {
    let detail = normalize_reference("/u/0/c/MTIz/a/NDU2/details", BASE).unwrap();
    let listing = normalize_reference("/u/0/a/missing/all", BASE).unwrap();
    assert!(is_detail_reference(&detail));
    assert!(!is_detail_reference(&listing));
    assert!(is_listing_view(&listing));
    assert!(!is_listing_view(&detail));
}
