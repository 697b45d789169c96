#![allow(missing_docs, dead_code)]
//! Shared benchmark support: data generators.

pub mod generators;
