#![cfg(target_arch = "wasm32")]

use deck_worker_wasm::{convert_pptx_to_pdf, inspect_pptx};
use wasm_bindgen_test::wasm_bindgen_test;

#[wasm_bindgen_test]
fn convert_rejects_garbage_with_a_message() {
    let err = convert_pptx_to_pdf(b"not a deck", None, None).unwrap_err();
    let message = err.as_string().unwrap();
    assert!(message.starts_with("ZIP error"), "{}", message);
}

#[wasm_bindgen_test]
fn convert_reports_parsing_before_failing() {
    let seen = js_sys::Array::new();
    let push = js_sys::Function::new_with_args("event", "this.push(event.percent)");
    let callback = push.bind(&seen);

    assert!(convert_pptx_to_pdf(&[], None, Some(callback)).is_err());
    assert_eq!(seen.length(), 1);
    assert_eq!(seen.get(0).as_f64(), Some(10.0));
}

#[wasm_bindgen_test]
fn inspect_rejects_garbage_with_a_message() {
    let err = inspect_pptx(b"PK").unwrap_err();
    assert!(err.as_string().is_some());
}
