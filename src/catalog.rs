/// Book and review store collaborators.
///
/// The catalog is data-access glue around the auth core: route handlers
/// consume these narrow traits and the auth guard makes the access
/// decisions. In-memory implementations back tests and single-process
/// deployments.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct BookRecord {
    pub uid: Uuid,
    pub title: String,
    pub author: String,
    pub published_year: i32,
    pub genre: String,
    pub page_count: i32,
    /// The user who added the book
    pub user_uid: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_year: i32,
    pub genre: String,
    pub page_count: i32,
    pub user_uid: Uuid,
}

/// Partial update; year is fixed at creation.
#[derive(Debug, Clone, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub page_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRecord {
    pub uid: Uuid,
    /// 1 to 5
    pub rating: u8,
    pub review_text: String,
    pub user_uid: Uuid,
    pub book_uid: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub rating: u8,
    pub review_text: String,
    pub user_uid: Uuid,
    pub book_uid: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewUpdate {
    pub rating: Option<u8>,
    pub review_text: Option<String>,
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, newest first.
    async fn list(&self) -> Result<Vec<BookRecord>, ApiError>;
    async fn get(&self, uid: Uuid) -> Result<Option<BookRecord>, ApiError>;
    async fn insert(&self, book: NewBook) -> Result<BookRecord, ApiError>;
    async fn update(&self, uid: Uuid, update: BookUpdate) -> Result<Option<BookRecord>, ApiError>;
    async fn delete(&self, uid: Uuid) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// All reviews, newest first.
    async fn list(&self) -> Result<Vec<ReviewRecord>, ApiError>;
    async fn get(&self, uid: Uuid) -> Result<Option<ReviewRecord>, ApiError>;
    async fn insert(&self, review: NewReview) -> Result<ReviewRecord, ApiError>;
    /// Update a review addressed by BOTH its own uid and its book's uid;
    /// a review uid under the wrong book matches nothing.
    async fn update(
        &self,
        book_uid: Uuid,
        review_uid: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<ReviewRecord>, ApiError>;
    async fn delete(&self, uid: Uuid) -> Result<bool, ApiError>;
}

fn lock_err(what: &str) -> ApiError {
    ApiError::Internal(format!("{} store lock poisoned", what))
}

#[derive(Default)]
pub struct InMemoryBookStore {
    records: RwLock<HashMap<Uuid, BookRecord>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self) -> Result<Vec<BookRecord>, ApiError> {
        let records = self.records.read().map_err(|_| lock_err("book"))?;
        let mut books: Vec<BookRecord> = records.values().cloned().collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    async fn get(&self, uid: Uuid) -> Result<Option<BookRecord>, ApiError> {
        let records = self.records.read().map_err(|_| lock_err("book"))?;
        Ok(records.get(&uid).cloned())
    }

    async fn insert(&self, book: NewBook) -> Result<BookRecord, ApiError> {
        let mut records = self.records.write().map_err(|_| lock_err("book"))?;
        let now = Utc::now();
        let record = BookRecord {
            uid: Uuid::new_v4(),
            title: book.title,
            author: book.author,
            published_year: book.published_year,
            genre: book.genre,
            page_count: book.page_count,
            user_uid: book.user_uid,
            created_at: now,
            updated_at: now,
        };
        records.insert(record.uid, record.clone());
        Ok(record)
    }

    async fn update(&self, uid: Uuid, update: BookUpdate) -> Result<Option<BookRecord>, ApiError> {
        let mut records = self.records.write().map_err(|_| lock_err("book"))?;
        let Some(record) = records.get_mut(&uid) else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(author) = update.author {
            record.author = author;
        }
        if let Some(genre) = update.genre {
            record.genre = genre;
        }
        if let Some(page_count) = update.page_count {
            record.page_count = page_count;
        }
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, uid: Uuid) -> Result<bool, ApiError> {
        let mut records = self.records.write().map_err(|_| lock_err("book"))?;
        Ok(records.remove(&uid).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryReviewStore {
    records: RwLock<HashMap<Uuid, ReviewRecord>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn list(&self) -> Result<Vec<ReviewRecord>, ApiError> {
        let records = self.records.read().map_err(|_| lock_err("review"))?;
        let mut reviews: Vec<ReviewRecord> = records.values().cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn get(&self, uid: Uuid) -> Result<Option<ReviewRecord>, ApiError> {
        let records = self.records.read().map_err(|_| lock_err("review"))?;
        Ok(records.get(&uid).cloned())
    }

    async fn insert(&self, review: NewReview) -> Result<ReviewRecord, ApiError> {
        let mut records = self.records.write().map_err(|_| lock_err("review"))?;
        let now = Utc::now();
        let record = ReviewRecord {
            uid: Uuid::new_v4(),
            rating: review.rating,
            review_text: review.review_text,
            user_uid: review.user_uid,
            book_uid: review.book_uid,
            created_at: now,
            updated_at: now,
        };
        records.insert(record.uid, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        book_uid: Uuid,
        review_uid: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<ReviewRecord>, ApiError> {
        let mut records = self.records.write().map_err(|_| lock_err("review"))?;
        // Both predicates must hold; a review uid under another book is a miss
        let Some(record) = records
            .get_mut(&review_uid)
            .filter(|r| r.book_uid == book_uid)
        else {
            return Ok(None);
        };

        if let Some(rating) = update.rating {
            record.rating = rating;
        }
        if let Some(review_text) = update.review_text {
            record.review_text = review_text;
        }
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, uid: Uuid) -> Result<bool, ApiError> {
        let mut records = self.records.write().map_err(|_| lock_err("review"))?;
        Ok(records.remove(&uid).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Octavia Butler".to_string(),
            published_year: 1993,
            genre: "Science Fiction".to_string(),
            page_count: 345,
            user_uid: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn book_crud_round_trip() {
        let store = InMemoryBookStore::new();
        let created = store.insert(new_book("Parable of the Sower")).await.unwrap();

        assert!(store.get(created.uid).await.unwrap().is_some());

        let updated = store
            .update(
                created.uid,
                BookUpdate {
                    title: Some("Parable of the Talents".to_string()),
                    author: None,
                    genre: None,
                    page_count: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Parable of the Talents");
        assert_eq!(updated.author, "Octavia Butler");

        assert!(store.delete(created.uid).await.unwrap());
        assert!(store.get(created.uid).await.unwrap().is_none());
        assert!(!store.delete(created.uid).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_book_update_is_none() {
        let store = InMemoryBookStore::new();
        let result = store
            .update(
                Uuid::new_v4(),
                BookUpdate {
                    title: Some("Ghost".to_string()),
                    author: None,
                    genre: None,
                    page_count: None,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn review_update_requires_both_uids_to_match() {
        let store = InMemoryReviewStore::new();
        let book_uid = Uuid::new_v4();
        let review = store
            .insert(NewReview {
                rating: 4,
                review_text: "Gripping".to_string(),
                user_uid: Uuid::new_v4(),
                book_uid,
            })
            .await
            .unwrap();

        // Right review uid, wrong book uid: no match
        let miss = store
            .update(
                Uuid::new_v4(),
                review.uid,
                ReviewUpdate {
                    rating: Some(5),
                    review_text: None,
                },
            )
            .await
            .unwrap();
        assert!(miss.is_none());

        let hit = store
            .update(
                book_uid,
                review.uid,
                ReviewUpdate {
                    rating: Some(5),
                    review_text: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.rating, 5);
        assert_eq!(hit.review_text, "Gripping");
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let store = InMemoryBookStore::new();
        store.insert(new_book("first")).await.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.insert(new_book("second")).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "second");
    }
}
