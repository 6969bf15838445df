// strings-scanner - platform/mod.rs
//
// Platform layer: config file resolution and loading.

pub mod config;
