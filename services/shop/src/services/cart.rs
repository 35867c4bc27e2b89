//! Cart service: merge-or-create on add, delete-on-zero on update

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    models::cart::{CartFilter, CartItem, CartPage, QuantityUpdate},
    repositories::{CartStore, RepositoryResult},
};

/// Quantity used when a caller omits it or sends a non-positive value
pub const DEFAULT_QUANTITY: i32 = 1;

/// Cart operations shared by every request handler
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
}

impl CartService {
    /// Create a new cart service on top of `store`
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Put `quantity` of a project into a user's cart
    ///
    /// If the pair is already in the cart its quantity is increased instead
    /// of inserting a second entry.
    pub async fn add_or_increment(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        quantity: Option<i32>,
    ) -> RepositoryResult<CartItem> {
        let quantity = normalize_quantity(quantity);
        let item = self
            .store
            .add_or_increment(user_id, project_id, quantity)
            .await?;

        info!(
            "Cart item {} of user {} now holds {}",
            item.entry.id, user_id, item.entry.quantity
        );

        Ok(item)
    }

    pub async fn list_entries(&self, filter: &CartFilter) -> RepositoryResult<CartPage> {
        self.store.list(filter).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<CartItem>> {
        self.store.list_by_user(user_id).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<CartItem>> {
        self.store.find_by_id(id).await
    }

    pub async fn get_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<Option<CartItem>> {
        self.store.find_by_user_and_project(user_id, project_id).await
    }

    /// Replace the quantity of an entry, deleting it when `quantity <= 0`
    pub async fn set_quantity(&self, id: Uuid, quantity: i32) -> RepositoryResult<QuantityUpdate> {
        if quantity <= 0 {
            let removed = self.store.delete(id).await?;
            if removed {
                info!("Cart item {} removed, quantity set to {}", id, quantity);
                return Ok(QuantityUpdate::Removed);
            }
            return Ok(QuantityUpdate::NotFound);
        }

        Ok(match self.store.update_quantity(id, quantity).await? {
            Some(item) => QuantityUpdate::Updated(item),
            None => QuantityUpdate::NotFound,
        })
    }

    pub async fn remove(&self, id: Uuid) -> RepositoryResult<bool> {
        self.store.delete(id).await
    }

    pub async fn remove_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<bool> {
        self.store
            .delete_by_user_and_project(user_id, project_id)
            .await
    }

    /// Empty a user's cart; `false` when it held nothing
    pub async fn clear_by_user(&self, user_id: Uuid) -> RepositoryResult<bool> {
        let removed = self.store.clear_user(user_id).await?;
        info!("Cleared {} items from cart of user {}", removed, user_id);
        Ok(removed > 0)
    }
}

fn normalize_quantity(quantity: Option<i32>) -> i32 {
    match quantity {
        Some(q) if q > 0 => q,
        _ => DEFAULT_QUANTITY,
    }
}
