// src/models/mod.rs

//! Contains data structures representing database entities.

// Declare child modules for each model
pub mod address;
pub mod cart;
pub mod cart_item;
pub mod coupon;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;

// Re-export the model structs for convenient access
pub use address::Address;
pub use cart::{Cart, CartStatus};
pub use cart_item::CartItem;
pub use coupon::{Coupon, CouponSnapshot, DiscountType};
pub use order::{Order, OrderStatus, PaymentStatus};
pub use order_item::OrderItem;
pub use payment::{Payment, PaymentState};
pub use product::{Product, ProductVariant};
