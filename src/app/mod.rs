// strings-scanner - app/mod.rs
//
// Application layer: batch processing, reporting, task consumption.
// Dependencies: core layer.

pub mod consumer;
pub mod reporter;
pub mod worker;
