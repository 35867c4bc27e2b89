//! Cart routes

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        ApiResponse, PaginatedResponse,
        cart::{AddToCartRequest, CartQuery, QuantityUpdate, UpdateCartRequest},
    },
    state::AppState,
};

/// Cart routes, nested under `/cart`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_to_cart).get(list_cart_items))
        .route(
            "/:id",
            get(get_cart_item)
                .put(update_cart_item)
                .delete(remove_cart_item),
        )
        .route("/user/:user_id", get(get_user_cart))
        .route("/user/:user_id/clear", delete(clear_user_cart))
        .route(
            "/user/:user_id/project/:project_id",
            get(get_user_cart_item).delete(remove_user_cart_item),
        )
}

fn parse_cart_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid cart ID".to_string()))
}

fn parse_user_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))
}

fn parse_user_and_project(
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<(Uuid, Uuid)> {
    path.map(|Path(ids)| ids)
        .map_err(|_| ApiError::BadRequest("Invalid user ID or project ID".to_string()))
}

/// Add a project to a user's cart, merging with an existing entry
pub async fn add_to_cart(
    State(state): State<AppState>,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::BadRequest("User ID is required".to_string()))?;
    let project_id = payload
        .project_id
        .ok_or_else(|| ApiError::BadRequest("Project ID is required".to_string()))?;

    let item = state
        .cart_service
        .add_or_increment(user_id, project_id, payload.quantity)
        .await
        .map_err(ApiError::repository("Failed to add item to cart"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(item, "Item added to cart successfully")),
    ))
}

/// List cart items with filtering, sorting and pagination
pub async fn list_cart_items(
    State(state): State<AppState>,
    query: Result<Query<CartQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let filter = query.into_filter().map_err(ApiError::BadRequest)?;

    let page = state
        .cart_service
        .list_entries(&filter)
        .await
        .map_err(ApiError::repository("Failed to retrieve cart items"))?;

    let message = if page.items.is_empty() {
        "No cart items found"
    } else {
        "Cart items retrieved successfully"
    };

    Ok(Json(PaginatedResponse {
        success: true,
        data: page.items,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
        message: message.to_string(),
    }))
}

/// Get a cart item by ID
pub async fn get_cart_item(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_cart_id(path)?;

    let item = state
        .cart_service
        .get_by_id(id)
        .await
        .map_err(ApiError::repository("Failed to retrieve cart item"))?
        .ok_or_else(|| ApiError::NotFound(format!("Cart item with ID {} not found", id)))?;

    Ok(Json(ApiResponse::with_data(
        item,
        "Cart item retrieved successfully",
    )))
}

/// Set the quantity of a cart item; zero or less removes it
pub async fn update_cart_item(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateCartRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_cart_id(path)?;
    let Json(payload) = payload?;

    let quantity = payload
        .quantity
        .ok_or_else(|| ApiError::BadRequest("No update data provided".to_string()))?;

    let outcome = state
        .cart_service
        .set_quantity(id, quantity)
        .await
        .map_err(ApiError::repository("Failed to update cart item"))?;

    match outcome {
        QuantityUpdate::Updated(item) => Ok(Json(ApiResponse::with_data(
            item,
            "Cart item updated successfully",
        ))
        .into_response()),
        QuantityUpdate::Removed => Ok(Json(ApiResponse::message(
            "Item removed from cart due to quantity being zero or less",
        ))
        .into_response()),
        QuantityUpdate::NotFound => Err(ApiError::NotFound(format!(
            "Cart item with ID {} not found",
            id
        ))),
    }
}

/// Remove a cart item by ID
pub async fn remove_cart_item(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_cart_id(path)?;

    let removed = state
        .cart_service
        .remove(id)
        .await
        .map_err(ApiError::repository("Failed to remove item from cart"))?;

    if removed {
        Ok(Json(ApiResponse::message(
            "Item removed from cart successfully",
        )))
    } else {
        Err(ApiError::NotFound(format!(
            "Cart item with ID {} not found",
            id
        )))
    }
}

/// Get every item in a user's cart
pub async fn get_user_cart(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_user_id(path)?;

    let items = state
        .cart_service
        .list_for_user(user_id)
        .await
        .map_err(ApiError::repository("Failed to retrieve user cart"))?;

    let message = if items.is_empty() {
        "User cart is empty"
    } else {
        "User cart retrieved successfully"
    };

    Ok(Json(ApiResponse::with_data(items, message)))
}

/// Remove every item from a user's cart
pub async fn clear_user_cart(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_user_id(path)?;

    let cleared = state
        .cart_service
        .clear_by_user(user_id)
        .await
        .map_err(ApiError::repository("Failed to clear user cart"))?;

    let message = if cleared {
        "User cart cleared successfully"
    } else {
        "User cart was already empty"
    };

    Ok(Json(ApiResponse::message(message)))
}

/// Get the cart item for a user and project
pub async fn get_user_cart_item(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let (user_id, project_id) = parse_user_and_project(path)?;

    let item = state
        .cart_service
        .get_by_user_and_project(user_id, project_id)
        .await
        .map_err(ApiError::repository("Failed to retrieve cart item"))?
        .ok_or_else(|| ApiError::NotFound("Item not found in user cart".to_string()))?;

    Ok(Json(ApiResponse::with_data(
        item,
        "Cart item retrieved successfully",
    )))
}

/// Remove the cart item for a user and project
pub async fn remove_user_cart_item(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let (user_id, project_id) = parse_user_and_project(path)?;

    let removed = state
        .cart_service
        .remove_by_user_and_project(user_id, project_id)
        .await
        .map_err(ApiError::repository("Failed to remove item from cart"))?;

    if removed {
        Ok(Json(ApiResponse::message(
            "Item removed from cart successfully",
        )))
    } else {
        Err(ApiError::NotFound("Item not found in user cart".to_string()))
    }
}
