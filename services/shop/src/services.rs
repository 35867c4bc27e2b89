//! Domain services sitting between the routes and the repositories

pub mod cart;

pub use cart::CartService;
