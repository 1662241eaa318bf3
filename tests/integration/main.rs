//! HTTP-level integration tests for ModelHub.

mod helpers;

mod convert_test;
mod formats_test;
