//! Mock repository implementations for testing
//!
//! These mocks allow testing handlers and services without database dependencies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use artefact_core::models::{
    Category, CategoryWithUsage, DocumentRecord, DocumentStatus, DocumentUpsert, Organization,
    UpsertOutcome,
};
use artefact_core::AppError;
use async_trait::async_trait;
use chrono::Utc;

use crate::{
    CategoryDeletion, CategoryRepositoryTrait, DocumentRepositoryTrait,
    OrganizationRepositoryTrait, DUPLICATE_CATEGORY_MESSAGE,
};

/// Mock document repository keyed on `(org_id, name)`
#[derive(Clone, Default)]
pub struct MockDocumentRepository {
    rows: Arc<Mutex<HashMap<(i64, String), DocumentRecord>>>,
    next_id: Arc<AtomicI64>,
}

impl MockDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document row
    pub fn add_document(&self, org_id: i64, name: &str, category: &str) -> DocumentRecord {
        let now = Utc::now();
        let record = DocumentRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            org_id,
            doc_type: "gdrive".to_string(),
            document_link: format!("https://example.test/{}", name),
            status: DocumentStatus::Ready.as_str().to_string(),
            file_category: category.to_string(),
            name: name.to_string(),
            content_type: None,
            file_size: None,
            summary: Some("summary".to_string()),
            is_summarized: true,
            created_at: now,
            updated_at: now,
        };
        self.rows
            .lock()
            .unwrap()
            .insert((org_id, name.to_string()), record.clone());
        record
    }

    /// Every row, across organizations, ordered by id
    pub fn all(&self) -> Vec<DocumentRecord> {
        let mut rows: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        rows.sort_by_key(|r| r.id);
        rows
    }

    fn rename_category(&self, org_id: i64, old: &str, new: &str) {
        for record in self.rows.lock().unwrap().values_mut() {
            if record.org_id == org_id && record.file_category == old {
                record.file_category = new.to_string();
                record.updated_at = Utc::now();
            }
        }
    }

    fn count(&self, org_id: i64, category: &str) -> i64 {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.org_id == org_id && r.file_category == category)
            .count() as i64
    }
}

#[async_trait]
impl DocumentRepositoryTrait for MockDocumentRepository {
    async fn upsert(&self, doc: &DocumentUpsert) -> Result<UpsertOutcome, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let processing = DocumentStatus::Processing.as_str().to_string();

        if let Some(existing) = rows.get_mut(&(doc.org_id, doc.name.clone())) {
            existing.document_link = doc.document_link.clone();
            existing.file_category = doc.category.clone();
            existing.status = processing;
            existing.summary = None;
            existing.is_summarized = false;
            existing.updated_at = now;
            return Ok(UpsertOutcome {
                id: existing.id,
                inserted: false,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        rows.insert(
            (doc.org_id, doc.name.clone()),
            DocumentRecord {
                id,
                org_id: doc.org_id,
                doc_type: doc.source.as_str().to_string(),
                document_link: doc.document_link.clone(),
                status: processing,
                file_category: doc.category.clone(),
                name: doc.name.clone(),
                content_type: Some(doc.content_type.clone()),
                file_size: doc.file_size,
                summary: None,
                is_summarized: false,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(UpsertOutcome { id, inserted: true })
    }

    async fn mark_failed(&self, org_id: i64, ids: &[i64]) -> Result<u64, AppError> {
        let mut changed = 0;
        for record in self.rows.lock().unwrap().values_mut() {
            if record.org_id == org_id
                && ids.contains(&record.id)
                && record.status == DocumentStatus::Processing.as_str()
            {
                record.status = DocumentStatus::Failed.as_str().to_string();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn find_by_name(
        &self,
        org_id: i64,
        name: &str,
    ) -> Result<Option<DocumentRecord>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(org_id, name.to_string()))
            .cloned())
    }

    async fn list_for_org(&self, org_id: i64) -> Result<Vec<DocumentRecord>, AppError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.org_id == org_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

/// Mock category repository. Shares its document store so renames cascade and usage counts
/// reflect seeded documents.
#[derive(Clone)]
pub struct MockCategoryRepository {
    categories: Arc<Mutex<HashMap<i64, Category>>>,
    user_names: Arc<Mutex<HashMap<i64, String>>>,
    documents: MockDocumentRepository,
    next_id: Arc<AtomicI64>,
}

impl MockCategoryRepository {
    pub fn new(documents: MockDocumentRepository) -> Self {
        Self {
            categories: Arc::new(Mutex::new(HashMap::new())),
            user_names: Arc::new(Mutex::new(HashMap::new())),
            documents,
            next_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Register a display name for `added_by_name`
    pub fn add_user_name(&self, user_id: i64, name: &str) {
        self.user_names
            .lock()
            .unwrap()
            .insert(user_id, name.to_string());
    }

    /// Seed a category row
    pub fn add_category(&self, org_id: i64, name: &str, added_by: Option<i64>) -> Category {
        let now = Utc::now();
        let category = Category {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: name.to_string(),
            org_id,
            added_by,
            created_at: now,
            updated_at: now,
        };
        self.categories
            .lock()
            .unwrap()
            .insert(category.id, category.clone());
        category
    }

    fn sorted_for_org(&self, org_id: i64) -> Vec<Category> {
        let mut categories: Vec<_> = self
            .categories
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }
}

#[async_trait]
impl CategoryRepositoryTrait for MockCategoryRepository {
    async fn list_for_org(&self, org_id: i64) -> Result<Vec<Category>, AppError> {
        Ok(self.sorted_for_org(org_id))
    }

    async fn list_with_usage(&self, org_id: i64) -> Result<Vec<CategoryWithUsage>, AppError> {
        let names = self.user_names.lock().unwrap().clone();
        Ok(self
            .sorted_for_org(org_id)
            .into_iter()
            .map(|c| CategoryWithUsage {
                added_by_name: c.added_by.and_then(|id| names.get(&id).cloned()),
                document_count: self.documents.count(org_id, &c.name),
                id: c.id,
                name: c.name,
                org_id: c.org_id,
                added_by: c.added_by,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .collect())
    }

    async fn find(&self, org_id: i64, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .get(&id)
            .filter(|c| c.org_id == org_id)
            .cloned())
    }

    async fn exists_by_name(&self, org_id: i64, name: &str) -> Result<bool, AppError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .values()
            .any(|c| c.org_id == org_id && c.name == name))
    }

    async fn create(
        &self,
        org_id: i64,
        name: &str,
        added_by: Option<i64>,
    ) -> Result<Category, AppError> {
        if self.exists_by_name(org_id, name).await? {
            return Err(AppError::Conflict(DUPLICATE_CATEGORY_MESSAGE.to_string()));
        }
        Ok(self.add_category(org_id, name, added_by))
    }

    async fn rename(
        &self,
        org_id: i64,
        id: i64,
        new_name: &str,
    ) -> Result<Option<Category>, AppError> {
        let mut categories = self.categories.lock().unwrap();

        if categories
            .values()
            .any(|c| c.org_id == org_id && c.name == new_name && c.id != id)
        {
            return Err(AppError::Conflict(DUPLICATE_CATEGORY_MESSAGE.to_string()));
        }

        let Some(category) = categories.get_mut(&id).filter(|c| c.org_id == org_id) else {
            return Ok(None);
        };

        let old_name = std::mem::replace(&mut category.name, new_name.to_string());
        category.updated_at = Utc::now();
        let renamed = category.clone();
        drop(categories);

        self.documents.rename_category(org_id, &old_name, new_name);
        Ok(Some(renamed))
    }

    async fn delete_unused(&self, org_id: i64, id: i64) -> Result<CategoryDeletion, AppError> {
        let mut categories = self.categories.lock().unwrap();
        let name = match categories.get(&id) {
            Some(c) if c.org_id == org_id => c.name.clone(),
            _ => return Ok(CategoryDeletion::NotFound),
        };
        if self.documents.count(org_id, &name) > 0 {
            return Ok(CategoryDeletion::InUse);
        }
        categories.remove(&id);
        Ok(CategoryDeletion::Deleted)
    }
}

/// Mock organization lookup
#[derive(Clone, Default)]
pub struct MockOrganizationRepository {
    memberships: Arc<Mutex<HashMap<i64, Organization>>>,
}

impl MockOrganizationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `user_id` a member of the given organization
    pub fn add_member(&self, user_id: i64, org_id: i64, org_name: &str) {
        self.memberships.lock().unwrap().insert(
            user_id,
            Organization {
                org_id,
                org_name: org_name.to_string(),
            },
        );
    }
}

#[async_trait]
impl OrganizationRepositoryTrait for MockOrganizationRepository {
    async fn find_for_user(&self, user_id: i64) -> Result<Option<Organization>, AppError> {
        Ok(self.memberships.lock().unwrap().get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artefact_core::models::SourceType;

    fn upsert(org_id: i64, name: &str, category: &str) -> DocumentUpsert {
        DocumentUpsert {
            org_id,
            name: name.to_string(),
            source: SourceType::Gdrive,
            document_link: format!("https://bucket/{}", name),
            category: category.to_string(),
            content_type: "application/pdf".to_string(),
            file_size: Some(2048),
        }
    }

    #[tokio::test]
    async fn test_upsert_resets_existing_row() {
        let docs = MockDocumentRepository::new();
        let seeded = docs.add_document(42, "a.pdf", "Old");

        let outcome = docs.upsert(&upsert(42, "a.pdf", "Contracts")).await.unwrap();
        assert_eq!(outcome.id, seeded.id);
        assert!(!outcome.inserted);

        let row = docs.find_by_name(42, "a.pdf").await.unwrap().unwrap();
        assert_eq!(row.status, "processing");
        assert_eq!(row.file_category, "Contracts");
        assert!(row.summary.is_none());
        assert!(!row.is_summarized);
        assert_eq!(docs.all().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_cascades_within_org_only() {
        let docs = MockDocumentRepository::new();
        let categories = MockCategoryRepository::new(docs.clone());
        let cat = categories.add_category(1, "Legal", None);
        categories.add_category(2, "Legal", None);
        docs.add_document(1, "a.pdf", "Legal");
        docs.add_document(2, "b.pdf", "Legal");

        categories.rename(1, cat.id, "Contracts").await.unwrap();

        assert_eq!(docs.count(1, "Contracts"), 1);
        assert_eq!(docs.count(2, "Legal"), 1);
    }

    #[tokio::test]
    async fn test_delete_unused_guards_usage_and_scope() {
        let docs = MockDocumentRepository::new();
        let categories = MockCategoryRepository::new(docs.clone());
        let legal = categories.add_category(1, "Legal", None);
        let drafts = categories.add_category(1, "Drafts", None);
        docs.add_document(1, "a.pdf", "Legal");

        assert_eq!(
            categories.delete_unused(2, drafts.id).await.unwrap(),
            CategoryDeletion::NotFound
        );
        assert_eq!(
            categories.delete_unused(1, legal.id).await.unwrap(),
            CategoryDeletion::InUse
        );
        assert_eq!(
            categories.delete_unused(1, drafts.id).await.unwrap(),
            CategoryDeletion::Deleted
        );
        assert_eq!(
            categories.delete_unused(1, drafts.id).await.unwrap(),
            CategoryDeletion::NotFound
        );
    }
}
