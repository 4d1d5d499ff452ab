//! Browser tests for the JS-facing exports. Run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use desk_wasm::{format_amount, nights_between, validate_date_range, validate_phone, version};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_nights() {
    assert_eq!(nights_between("2024-06-10", "2024-06-13").unwrap(), 3);
    assert!(validate_date_range("2024-06-10", "2024-06-09", "2024-06-01").is_err());
}

#[wasm_bindgen_test]
fn test_phone() {
    assert_eq!(validate_phone("00237 670 000 001").unwrap(), "+237670000001");
    assert!(validate_phone("abc").is_err());
}

#[wasm_bindgen_test]
fn test_format_and_version() {
    assert!(format_amount(6600, "USD").is_ok());
    assert!(format_amount(1, "ABC").is_err());
    assert!(!version().is_empty());
}
