//! Test helpers for downstream crates
//!
//! In-memory implementations of the repository traits. They honour the same organization
//! scoping and uniqueness rules as the PostgreSQL repositories, so handler tests need no
//! database.

pub mod mock_repositories;

pub use mock_repositories::{
    MockCategoryRepository, MockDocumentRepository, MockOrganizationRepository,
};
