//! Shared test utilities for the reservoir-flood workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic elevation models with known flood volumes
//! - Scratch directories for exported rasters and images
//! - Skip macros for optional assets (fonts, sample DEMs)
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! ```ignore
//! use test_utils::{bowl_3x3, assert_approx_eq};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Skip a test if an optional asset is not found.
///
/// Looks in `TEST_DATA_DIR` and the workspace `testdata/` directory.
///
/// ```ignore
/// #[test]
/// fn test_title_rendering() {
///     let font = require_test_file!("DejaVuSans.ttf");
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Set TEST_DATA_DIR to run this test.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Approximate floating-point equality with an absolute tolerance.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality relative to the magnitude of the operands.
#[macro_export]
macro_rules! assert_rel_eq {
    ($left:expr, $right:expr, $rel:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let scale = left.abs().max(right.abs()).max(f64::MIN_POSITIVE);
        let rel = (left - right).abs() / scale;
        if rel > $rel as f64 {
            panic!(
                "assertion failed: `(left ≈ right)` (relative)\n  left: `{:?}`,\n right: `{:?}`,\n   rel: `{:?}` > `{:?}`",
                left, right, rel, $rel
            );
        }
    }};
}

/// Approximate equality of coordinate pairs.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}
