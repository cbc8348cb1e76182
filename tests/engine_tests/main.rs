//! Integration tests for the engine
