// src/tests/mod.rs
//! Tests for the cache-aside counter protocol and its HTTP handlers
