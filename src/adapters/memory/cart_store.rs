//! In-memory cart store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{CartSnapshot, CartStore};

pub struct InMemoryCartStore {
    carts: Mutex<HashMap<UserId, CartSnapshot>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self {
            carts: Mutex::new(HashMap::new()),
        }
    }

    pub fn put(&self, user_id: &UserId, cart: CartSnapshot) {
        self.carts
            .lock()
            .expect("carts lock poisoned")
            .insert(user_id.clone(), cart);
    }
}

impl Default for InMemoryCartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn snapshot(&self, user_id: &UserId) -> Result<Option<CartSnapshot>, DomainError> {
        Ok(self
            .carts
            .lock()
            .expect("carts lock poisoned")
            .get(user_id)
            .cloned())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), DomainError> {
        self.carts
            .lock()
            .expect("carts lock poisoned")
            .remove(user_id);
        Ok(())
    }
}
