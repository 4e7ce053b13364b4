//! Validated value types shared across the workspace.

pub mod cart;
pub mod email;
pub mod id;
pub mod username;

pub use cart::{CartItems, CartItemsError};
pub use email::{Email, EmailError};
pub use id::{CartId, CategoryId, OrderId, OrderItemId, ProductId, ProfileId, UserId};
pub use username::{Username, UsernameError};
