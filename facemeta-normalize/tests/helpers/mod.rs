//! Shared test helpers for facemeta-normalize integration tests

#![allow(dead_code)]

pub mod mat_writer;
