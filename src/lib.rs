// strings-scanner - lib.rs
//
// Library entry point. The binary in `main.rs` is a thin driver over these
// modules; everything testable lives here.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
