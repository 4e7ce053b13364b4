//! Domain types, separate from database row types.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::Cart;
pub use catalog::{Category, Product};
pub use order::{Order, OrderItem, ShippingDetails};
pub use user::{Profile, User};
