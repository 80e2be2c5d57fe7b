//! Purpose: Library crate backing the `see` CLI and its tests.
//! Exports: `core` (input resolution, content validation, upload orchestration, errors),
//! `api` (HTTP client for the S.EE API), `notice` (structured stderr notices).
//! Role: Keeps decision logic testable without spawning the binary.
//! Invariants: Core modules take explicit inputs (stdin, sniffer, submit closure) instead of globals.
pub mod api;
pub mod core;
pub mod notice;
