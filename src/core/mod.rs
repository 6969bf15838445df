// strings-scanner - core/mod.rs
//
// Core business logic layer: heuristics, fingerprints, task validation.
// Must NOT perform network or filesystem I/O.

pub mod fingerprint;
pub mod heuristics;
pub mod model;
pub mod task;
