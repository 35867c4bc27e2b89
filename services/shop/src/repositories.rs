//! Repositories for database operations

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use thiserror::Error;
use uuid::Uuid;

use crate::models::cart::{CartFilter, CartItem, CartPage};

pub mod cart;
#[cfg(test)]
pub mod memory;

/// Schema migrations of the shop database, embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors raised by repositories
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A foreign key pointed at a row that does not exist ("User", "Project")
    #[error("{0} not found")]
    MissingReference(&'static str),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Type alias for repository results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage operations behind the cart service
///
/// Every method is a single atomic step against the store. In particular
/// `add_or_increment` must never leave two entries for the same
/// (user, project) pair, however many callers race on it.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Insert an entry, or add `quantity` to the existing one for the pair
    async fn add_or_increment(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        quantity: i32,
    ) -> RepositoryResult<CartItem>;

    /// Filtered, sorted page of entries together with the filtered total
    async fn list(&self, filter: &CartFilter) -> RepositoryResult<CartPage>;

    /// Every entry of a user, newest first
    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<CartItem>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<CartItem>>;

    async fn find_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<Option<CartItem>>;

    /// Overwrite the quantity of an entry. `quantity` must be positive.
    async fn update_quantity(&self, id: Uuid, quantity: i32)
    -> RepositoryResult<Option<CartItem>>;

    /// Returns whether a row was deleted
    async fn delete(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Returns whether a row was deleted
    async fn delete_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<bool>;

    /// Returns the number of deleted rows
    async fn clear_user(&self, user_id: Uuid) -> RepositoryResult<u64>;
}
