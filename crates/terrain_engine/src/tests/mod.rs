//! Cross-module scenario tests
