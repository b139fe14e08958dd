//! Server-side repositories over a [`KvStore`].

pub mod catalog;
pub mod collections;
pub mod favorites;
pub mod orders;
pub mod users;

use std::sync::Arc;

use crate::domain::value_objects::OrderIdGenerator;
use crate::kv::KvStore;

pub use catalog::{CatalogRepository, CatalogSource};
pub use collections::CollectionsRepository;
pub use favorites::FavoritesRepository;
pub use orders::{OrderRepository, OrderScope, ReconcileReport};
pub use users::UserRepository;

/// Every repository, sharing one store handle.
pub struct Repositories {
    pub orders: OrderRepository,
    pub catalog: CatalogRepository,
    pub favorites: FavoritesRepository,
    pub collections: CollectionsRepository,
    pub users: UserRepository,
}

impl Repositories {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            orders: OrderRepository::new(kv.clone(), Arc::new(OrderIdGenerator::new())),
            catalog: CatalogRepository::new(kv.clone()),
            favorites: FavoritesRepository::new(kv.clone()),
            collections: CollectionsRepository::new(kv.clone()),
            users: UserRepository::new(kv),
        }
    }
}
