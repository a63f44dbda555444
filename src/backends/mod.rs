//! Segmentation backend implementations
//!
//! Real backends live outside this crate and plug in through the
//! [`crate::inference::SessionFactory`] trait; only the mock used for testing
//! and examples ships here.

pub mod mock;

pub use mock::{MockSession, MockSessionFactory};
