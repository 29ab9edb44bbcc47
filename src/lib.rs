//! Purpose: Shared core library crate used by the `dexrip` CLI and tests.
//! Exports: `core` (byte sources, layouts, record decoding, id policy,
//! container parsing, errors), `blocks` (the export workers), `report`,
//! `tabular`, `summary`.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: Block workers never touch raw offsets outside `core`.
pub mod blocks;
pub mod core;
pub mod report;
pub mod summary;
pub mod tabular;
