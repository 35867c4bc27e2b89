//! PostgreSQL cart repository

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::{
        cart::{CartEntry, CartFilter, CartItem, CartPage},
        catalog::{ProjectDetails, ProjectImage, UserSummary},
    },
    repositories::{CartStore, RepositoryError, RepositoryResult},
};

const CART_ITEM_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.project_id, c.quantity, c.created_at, c.updated_at,
           u.name AS user_name, u.email AS user_email, u.role_id AS user_role_id,
           u.profile_image AS user_profile_image, u.created_at AS user_created_at,
           u.updated_at AS user_updated_at,
           p.title AS project_title, p.description AS project_description,
           p.category_id AS project_category_id, p.author_id AS project_author_id,
           p.image_url AS project_image_url, p.created_at AS project_created_at,
           p.updated_at AS project_updated_at
    FROM carts c
    JOIN users u ON u.id = c.user_id
    JOIN projects p ON p.id = c.project_id
"#;

const CART_COUNT_SELECT: &str = r#"
    SELECT COUNT(*)
    FROM carts c
    JOIN projects p ON p.id = c.project_id
"#;

/// Cart repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn add_or_increment(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        quantity: i32,
    ) -> RepositoryResult<CartItem> {
        debug!(
            "Adding {} of project {} to cart of user {}",
            quantity, project_id, user_id
        );

        let mut tx = self.pool.begin().await?;

        // The row lock taken by the upsert is held until commit, so the
        // entry cannot vanish before it is read back.
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO carts (user_id, project_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, project_id) DO UPDATE SET
            quantity = carts.quantity + EXCLUDED.quantity,
            updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await
        .map_err(reference_error)?;

        let item = fetch_by_id(&mut tx, id)
            .await?
            .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))?;

        tx.commit().await?;

        Ok(item)
    }

    async fn list(&self, filter: &CartFilter) -> RepositoryResult<CartPage> {
        let mut conn = self.pool.acquire().await?;

        let mut count = QueryBuilder::new(CART_COUNT_SELECT);
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

        let mut page = QueryBuilder::new(CART_ITEM_SELECT);
        push_filters(&mut page, filter);
        let order = filter.sort_order.keyword();
        page.push(" ORDER BY ")
            .push(filter.sort_by.column())
            .push(" ")
            .push(order)
            .push(", c.id ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let items = fetch_items(&mut conn, page).await?;

        Ok(CartPage {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<CartItem>> {
        let mut conn = self.pool.acquire().await?;

        let mut query = QueryBuilder::new(CART_ITEM_SELECT);
        query
            .push(" WHERE c.user_id = ")
            .push_bind(user_id)
            .push(" ORDER BY c.created_at DESC, c.id DESC");

        fetch_items(&mut conn, query).await
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<CartItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    async fn find_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<Option<CartItem>> {
        let mut conn = self.pool.acquire().await?;

        let mut query = QueryBuilder::new(CART_ITEM_SELECT);
        query
            .push(" WHERE c.user_id = ")
            .push_bind(user_id)
            .push(" AND c.project_id = ")
            .push_bind(project_id);

        Ok(fetch_items(&mut conn, query).await?.into_iter().next())
    }

    async fn update_quantity(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> RepositoryResult<Option<CartItem>> {
        debug!("Setting quantity of cart item {} to {}", id, quantity);

        let mut tx = self.pool.begin().await?;

        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE carts
            SET quantity = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id
            "#,
        )
        .bind(quantity)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let item = match updated {
            Some(id) => fetch_by_id(&mut tx, id).await?,
            None => None,
        };

        tx.commit().await?;

        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user_and_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1 AND project_id = $2")
            .bind(user_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_user(&self, user_id: Uuid) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        debug!(
            "Cleared {} cart items of user {}",
            result.rows_affected(),
            user_id
        );

        Ok(result.rows_affected())
    }
}

/// Turn foreign-key violations on insert into `MissingReference`
fn reference_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            let missing = match db_err.constraint() {
                Some("carts_project_id_fkey") => "Project",
                _ => "User",
            };
            return RepositoryError::MissingReference(missing);
        }
    }

    RepositoryError::Database(err)
}

/// ILIKE pattern matching `search` literally anywhere in the value
pub(crate) fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &CartFilter) {
    let mut keyword = " WHERE ";

    if let Some(search) = &filter.search {
        query
            .push(keyword)
            .push("p.title ILIKE ")
            .push_bind(like_pattern(search));
        keyword = " AND ";
    }

    if let Some(user_id) = filter.user_id {
        query.push(keyword).push("c.user_id = ").push_bind(user_id);
        keyword = " AND ";
    }

    if let Some(project_id) = filter.project_id {
        query.push(keyword).push("c.project_id = ").push_bind(project_id);
    }
}

async fn fetch_by_id(conn: &mut PgConnection, id: Uuid) -> RepositoryResult<Option<CartItem>> {
    let mut query = QueryBuilder::new(CART_ITEM_SELECT);
    query.push(" WHERE c.id = ").push_bind(id);

    Ok(fetch_items(conn, query).await?.into_iter().next())
}

async fn fetch_items(
    conn: &mut PgConnection,
    mut query: QueryBuilder<'_, Postgres>,
) -> RepositoryResult<Vec<CartItem>> {
    let rows = query.build().fetch_all(&mut *conn).await?;
    let mut items: Vec<CartItem> = rows.iter().map(cart_item_from_row).collect();

    attach_images(conn, &mut items).await?;

    Ok(items)
}

fn cart_item_from_row(row: &PgRow) -> CartItem {
    CartItem {
        entry: CartEntry {
            id: row.get("id"),
            user_id: row.get("user_id"),
            project_id: row.get("project_id"),
            quantity: row.get("quantity"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        user: UserSummary {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
            role_id: row.get("user_role_id"),
            profile_image: row.get("user_profile_image"),
            created_at: row.get("user_created_at"),
            updated_at: row.get("user_updated_at"),
        },
        project: ProjectDetails {
            id: row.get("project_id"),
            title: row.get("project_title"),
            description: row.get("project_description"),
            category_id: row.get("project_category_id"),
            author_id: row.get("project_author_id"),
            image_url: row.get("project_image_url"),
            created_at: row.get("project_created_at"),
            updated_at: row.get("project_updated_at"),
            images: Vec::new(),
        },
    }
}

async fn attach_images(conn: &mut PgConnection, items: &mut [CartItem]) -> RepositoryResult<()> {
    if items.is_empty() {
        return Ok(());
    }

    let mut project_ids: Vec<Uuid> = items.iter().map(|item| item.entry.project_id).collect();
    project_ids.sort_unstable();
    project_ids.dedup();

    let images: Vec<ProjectImage> = sqlx::query_as(
        r#"
        SELECT id, project_id, image_url, caption, created_at, updated_at
        FROM project_images
        WHERE project_id = ANY($1)
        ORDER BY created_at, id
        "#,
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_project: HashMap<Uuid, Vec<ProjectImage>> = HashMap::new();
    for image in images {
        by_project.entry(image.project_id).or_default().push(image);
    }

    for item in items.iter_mut() {
        if let Some(images) = by_project.get(&item.entry.project_id) {
            item.project.images = images.clone();
        }
    }

    Ok(())
}
