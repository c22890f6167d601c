//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the real router against
//! a stub identity provider on a local port.

#![cfg(test)]

mod helpers;

mod test_concurrent_first_contact;
mod test_cors;
mod test_first_contact;
mod test_institutional_provider;
mod test_no_credential;
mod test_provider_rejected;
