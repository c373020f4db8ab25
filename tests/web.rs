//! wasm 环境冒烟测试，通过 `wasm-pack test` 运行。
#![cfg(target_arch = "wasm32")]

use tictactoe_core::GameEngine;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn engine_plays_a_full_exchange() {
    let mut engine = GameEngine::new(Some("hard".into()));
    let resolution = engine.play_move(4).expect("legal move");
    assert!(resolution.contains("MovePlaced"));

    let response = engine.apply_ai_move().expect("ai move");
    assert!(response.contains("decision"));
}

#[wasm_bindgen_test]
fn illegal_move_is_rejected() {
    let mut engine = GameEngine::new(None);
    engine.play_move(0).expect("legal move");
    engine.apply_ai_move().expect("ai move");
    assert!(engine.play_move(0).is_err());
}

#[wasm_bindgen_test]
fn presets_are_exported() {
    let presets = tictactoe_core::difficulty_presets().expect("presets");
    assert!(!presets.is_undefined());
}
