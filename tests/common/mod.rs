//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use ce_transform::Transform;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Parse a transformation list written in the JSON configuration format
pub fn transforms(json: &str) -> Vec<Transform> {
    serde_json::from_str(json).expect("invalid transformation list in test")
}

/// Compact JSON text of a value, object keys sorted
pub fn compact(value: &serde_json::Value) -> String {
    serde_json::to_string(value).expect("value always serializes")
}
