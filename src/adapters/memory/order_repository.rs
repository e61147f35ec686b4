//! In-memory order repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, UserId};
use crate::domain::order::Order;
use crate::ports::OrderRepository;

pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        self.orders
            .lock()
            .expect("orders lock poisoned")
            .insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.lock().expect("orders lock poisoned");
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order.id),
            )),
        }
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .expect("orders lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_many(&self, ids: &[OrderId]) -> Result<Vec<Order>, DomainError> {
        let orders = self.orders.lock().expect("orders lock poisoned");
        Ok(ids.iter().filter_map(|id| orders.get(id).cloned()).collect())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let orders = self.orders.lock().expect("orders lock poisoned");
        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update_all(&self, batch: &[Order]) -> Result<(), DomainError> {
        let mut orders = self.orders.lock().expect("orders lock poisoned");
        // Validate the whole batch before touching anything.
        if let Some(missing) = batch.iter().find(|o| !orders.contains_key(&o.id)) {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", missing.id),
            ));
        }
        for order in batch {
            orders.insert(order.id, order.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, ProductId, Timestamp};
    use crate::domain::order::{ItemRef, LineItem, OrderPriority, PricingSnapshot};

    fn order() -> Order {
        let items = vec![LineItem::new(
            ItemRef::product(ProductId::new()),
            "Widget",
            1,
            Money::from_cents(1_000),
            Money::from_cents(1_000),
        )
        .unwrap()];
        let pricing = PricingSnapshot::compute(&items, Money::ZERO, Money::ZERO, None, Money::ZERO);
        Order::create(
            OrderId::new(),
            UserId::new("user-1").unwrap(),
            items,
            pricing,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn update_of_unknown_order_errors() {
        let repo = InMemoryOrderRepository::new();
        let err = repo.update(&order()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn update_all_writes_nothing_when_one_order_is_unknown() {
        let repo = InMemoryOrderRepository::new();
        let mut known = order();
        repo.save(&known).await.unwrap();

        known.set_priority(OrderPriority::High, Timestamp::now());
        let err = repo.update_all(&[known.clone(), order()]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);

        let stored = repo.find_by_id(&known.id).await.unwrap().unwrap();
        assert_eq!(stored.priority, OrderPriority::Normal);
    }

    #[tokio::test]
    async fn find_by_user_returns_newest_first() {
        let repo = InMemoryOrderRepository::new();
        let first = order();
        repo.save(&first).await.unwrap();
        let second = order();
        repo.save(&second).await.unwrap();

        let listed = repo
            .find_by_user(&UserId::new("user-1").unwrap())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(!listed[0].created_at.is_before(&listed[1].created_at));
    }
}
