#![allow(dead_code)]

pub use execd_test_utils::*;
