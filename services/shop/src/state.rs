//! Application state shared across handlers

use crate::services::CartService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cart_service: CartService,
}
