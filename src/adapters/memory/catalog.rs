//! In-memory catalog.
//!
//! Sales counters are deduplicated by `(item, transaction)` exactly as
//! the port requires, so fulfillment replays leave them unchanged.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, Money, PlanId, ProductId};
use crate::domain::payment::TransactionId;
use crate::ports::{Catalog, PlanRecord, ProductRecord};

#[derive(Debug, Clone, Default)]
struct SalesCounter {
    sales: u64,
    units: u64,
    revenue: Money,
}

struct CatalogState {
    products: HashMap<ProductId, ProductRecord>,
    plans: HashMap<PlanId, PlanRecord>,
    product_sales: HashMap<ProductId, SalesCounter>,
    plan_sales: HashMap<PlanId, SalesCounter>,
    /// `(item id, transaction id)` pairs already counted.
    recorded: HashSet<(String, String)>,
}

pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                products: HashMap::new(),
                plans: HashMap::new(),
                product_sales: HashMap::new(),
                plan_sales: HashMap::new(),
                recorded: HashSet::new(),
            }),
        }
    }

    pub fn put_product(&self, product: ProductRecord) {
        self.state
            .lock()
            .expect("catalog lock poisoned")
            .products
            .insert(product.id, product);
    }

    pub fn put_plan(&self, plan: PlanRecord) {
        self.state
            .lock()
            .expect("catalog lock poisoned")
            .plans
            .insert(plan.id, plan);
    }

    /// Number of sales counted against a product (for test assertions).
    pub fn sales_count(&self, product_id: &ProductId) -> u64 {
        self.state
            .lock()
            .expect("catalog lock poisoned")
            .product_sales
            .get(product_id)
            .map(|c| c.sales)
            .unwrap_or(0)
    }

    /// Revenue counted against a product (for test assertions).
    pub fn revenue_for(&self, product_id: &ProductId) -> Money {
        self.state
            .lock()
            .expect("catalog lock poisoned")
            .product_sales
            .get(product_id)
            .map(|c| c.revenue)
            .unwrap_or(Money::ZERO)
    }

    /// Number of sales counted against a plan (for test assertions).
    pub fn subscription_sales_count(&self, plan_id: &PlanId) -> u64 {
        self.state
            .lock()
            .expect("catalog lock poisoned")
            .plan_sales
            .get(plan_id)
            .map(|c| c.sales)
            .unwrap_or(0)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_product(&self, id: &ProductId) -> Result<Option<ProductRecord>, DomainError> {
        Ok(self
            .state
            .lock()
            .expect("catalog lock poisoned")
            .products
            .get(id)
            .cloned())
    }

    async fn find_plan(&self, id: &PlanId) -> Result<Option<PlanRecord>, DomainError> {
        Ok(self
            .state
            .lock()
            .expect("catalog lock poisoned")
            .plans
            .get(id)
            .cloned())
    }

    async fn record_sale(
        &self,
        product_id: &ProductId,
        transaction_id: &TransactionId,
        quantity: u32,
        revenue: Money,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().expect("catalog lock poisoned");
        let key = (product_id.to_string(), transaction_id.as_str().to_string());
        if !state.recorded.insert(key) {
            return Ok(());
        }
        let counter = state.product_sales.entry(*product_id).or_default();
        counter.sales += 1;
        counter.units += quantity as u64;
        counter.revenue = counter.revenue + revenue;
        Ok(())
    }

    async fn record_subscription_sale(
        &self,
        plan_id: &PlanId,
        transaction_id: &TransactionId,
        revenue: Money,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().expect("catalog lock poisoned");
        let key = (plan_id.to_string(), transaction_id.as_str().to_string());
        if !state.recorded.insert(key) {
            return Ok(());
        }
        let counter = state.plan_sales.entry(*plan_id).or_default();
        counter.sales += 1;
        counter.units += 1;
        counter.revenue = counter.revenue + revenue;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    #[tokio::test]
    async fn replayed_transaction_does_not_double_count() {
        let catalog = InMemoryCatalog::new();
        let product_id = ProductId::new();
        let txn = TransactionId::generate(Timestamp::now());

        catalog
            .record_sale(&product_id, &txn, 2, Money::from_cents(4_000))
            .await
            .unwrap();
        catalog
            .record_sale(&product_id, &txn, 2, Money::from_cents(4_000))
            .await
            .unwrap();

        assert_eq!(catalog.sales_count(&product_id), 1);
        assert_eq!(catalog.revenue_for(&product_id), Money::from_cents(4_000));
    }

    #[tokio::test]
    async fn distinct_transactions_each_count() {
        let catalog = InMemoryCatalog::new();
        let product_id = ProductId::new();
        let now = Timestamp::now();

        catalog
            .record_sale(&product_id, &TransactionId::generate(now), 1, Money::from_cents(1_000))
            .await
            .unwrap();
        catalog
            .record_sale(&product_id, &TransactionId::generate(now), 1, Money::from_cents(1_000))
            .await
            .unwrap();

        assert_eq!(catalog.sales_count(&product_id), 2);
        assert_eq!(catalog.revenue_for(&product_id), Money::from_cents(2_000));
    }
}
