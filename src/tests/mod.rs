//! Integration-style tests that exercise the engine client against a mock
//! HTTP server.
