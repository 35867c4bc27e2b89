//! In-process cart store used by handler and service tests

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    models::{
        cart::{CartEntry, CartFilter, CartItem, CartPage, SortField, SortOrder},
        catalog::{ProjectDetails, ProjectImage, UserSummary},
    },
    repositories::{CartStore, RepositoryError, RepositoryResult},
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserSummary>,
    projects: HashMap<Uuid, ProjectDetails>,
    entries: Vec<CartEntry>,
}

impl MemoryState {
    fn hydrate(&self, entry: &CartEntry) -> CartItem {
        CartItem {
            entry: entry.clone(),
            user: self.users[&entry.user_id].clone(),
            project: self.projects[&entry.project_id].clone(),
        }
    }
}

/// Cart store holding everything behind one mutex
#[derive(Clone, Default)]
pub struct MemoryCartStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, name: &str) -> Uuid {
        let now = Utc::now();
        let user = UserSummary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role_id: None,
            profile_image: None,
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        self.state.lock().await.users.insert(id, user);
        id
    }

    pub async fn add_project(&self, title: &str, author_id: Uuid) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let project = ProjectDetails {
            id,
            title: title.to_string(),
            description: None,
            category_id: Uuid::new_v4(),
            author_id,
            image_url: None,
            created_at: now,
            updated_at: now,
            images: vec![ProjectImage {
                id: Uuid::new_v4(),
                project_id: id,
                image_url: format!("/upload/{}.png", id),
                caption: None,
                created_at: now,
                updated_at: now,
            }],
        };
        self.state.lock().await.projects.insert(id, project);
        id
    }

    /// Number of stored entries for a pair, to check the uniqueness invariant
    pub async fn count_pair(&self, user_id: Uuid, project_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.project_id == project_id)
            .count()
    }
}

fn compare(a: &CartEntry, b: &CartEntry, field: SortField) -> Ordering {
    let ordering = match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::UserId => a.user_id.cmp(&b.user_id),
        SortField::ProjectId => a.project_id.cmp(&b.project_id),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    ordering.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn add_or_increment(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        quantity: i32,
    ) -> RepositoryResult<CartItem> {
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&user_id) {
            return Err(RepositoryError::MissingReference("User"));
        }
        if !state.projects.contains_key(&project_id) {
            return Err(RepositoryError::MissingReference("Project"));
        }

        let now = Utc::now();
        let existing = state
            .entries
            .iter_mut()
            .find(|e| e.user_id == user_id && e.project_id == project_id);

        let entry = match existing {
            Some(entry) => {
                entry.quantity += quantity;
                entry.updated_at = now;
                entry.clone()
            }
            None => {
                let entry = CartEntry {
                    id: Uuid::new_v4(),
                    user_id,
                    project_id,
                    quantity,
                    created_at: now,
                    updated_at: now,
                };
                state.entries.push(entry.clone());
                entry
            }
        };

        Ok(state.hydrate(&entry))
    }

    async fn list(&self, filter: &CartFilter) -> RepositoryResult<CartPage> {
        let state = self.state.lock().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matching: Vec<&CartEntry> = state
            .entries
            .iter()
            .filter(|e| filter.user_id.is_none_or(|id| e.user_id == id))
            .filter(|e| filter.project_id.is_none_or(|id| e.project_id == id))
            .filter(|e| match &search {
                Some(search) => state.projects[&e.project_id]
                    .title
                    .to_lowercase()
                    .contains(search.as_str()),
                None => true,
            })
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, filter.sort_by);
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let items = matching
            .iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .map(|e| state.hydrate(e))
            .collect();

        Ok(CartPage {
            items,
            total: matching.len() as i64,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<CartItem>> {
        let filter = CartFilter {
            user_id: Some(user_id),
            limit: i64::MAX,
            ..CartFilter::default()
        };
        Ok(self.list(&filter).await?.items)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<CartItem>> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| state.hydrate(e)))
    }

    async fn find_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<Option<CartItem>> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .find(|e| e.user_id == user_id && e.project_id == project_id)
            .map(|e| state.hydrate(e)))
    }

    async fn update_quantity(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> RepositoryResult<Option<CartItem>> {
        let mut state = self.state.lock().await;

        let updated = state.entries.iter_mut().find(|e| e.id == id).map(|entry| {
            entry.quantity = quantity;
            entry.updated_at = Utc::now();
            entry.clone()
        });

        Ok(updated.map(|entry| state.hydrate(&entry)))
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);
        Ok(state.entries.len() < before)
    }

    async fn delete_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state
            .entries
            .retain(|e| !(e.user_id == user_id && e.project_id == project_id));
        Ok(state.entries.len() < before)
    }

    async fn clear_user(&self, user_id: Uuid) -> RepositoryResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|e| e.user_id != user_id);
        Ok((before - state.entries.len()) as u64)
    }
}
