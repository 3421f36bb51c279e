//! Utility functions for numeric conversions at the OpenCV boundary.

pub mod safe_cast;
