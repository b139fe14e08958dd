//! Aggregates module
pub mod cart;
pub mod collection;
pub mod favorites;
pub mod order;
pub mod user;
pub mod wallpaper;

pub use cart::{Cart, CartItem, PurchaseType};
pub use collection::{default_collections, Collection};
pub use favorites::{FavoriteProject, Favorites, ProjectPatch, Removal};
pub use order::{NewOrder, Order, OrderItem, OrderStats, OrderStatus, PaymentMethod};
pub use user::{Credentials, PublicUser, Registration, UserRecord};
pub use wallpaper::{default_catalog, Wallpaper, WallpaperSummary};
