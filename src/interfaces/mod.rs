//! Boundary adapters: CSV batch input and output used by the CLI.

pub mod csv;
