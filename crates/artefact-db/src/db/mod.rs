//! Database repositories for data access layer
//!
//! One repository per table family: categories, organization documents and the read-only
//! organization lookup. Each exposes a `*RepositoryTrait` so handlers can run against in-memory
//! doubles in tests.

pub mod category;
pub mod document;
pub mod organization;

pub use category::{
    CategoryDeletion, CategoryRepositoryTrait, PostgresCategoryRepository as CategoryRepository,
    DUPLICATE_CATEGORY_MESSAGE,
};
pub use document::{DocumentRepositoryTrait, PostgresDocumentRepository as DocumentRepository};
pub use organization::{
    OrganizationRepositoryTrait, PostgresOrganizationRepository as OrganizationRepository,
};
