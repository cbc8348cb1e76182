//! Integration tests for the wire protocol

mod codec_tests;
