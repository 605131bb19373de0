/// Socrates Companion - browser extension background core
/// Built with Rust + WASM

pub mod clock;
pub mod messages;
pub mod notify;
pub mod prefs;
pub mod router;
pub mod store;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod background;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the background service: install handler plus message router
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}
