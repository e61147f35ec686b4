//! In-memory refund request and cancellation repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{CancellationId, DomainError, ErrorCode, OrderId, RefundRequestId};
use crate::domain::refund::{Cancellation, RefundRequest};
use crate::ports::{CancellationRepository, RefundRepository};

pub struct InMemoryRefundRepository {
    requests: Mutex<HashMap<RefundRequestId, RefundRequest>>,
}

impl InMemoryRefundRepository {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRefundRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefundRepository for InMemoryRefundRepository {
    async fn create(&self, request: &RefundRequest) -> Result<(), DomainError> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn update(&self, request: &RefundRequest) -> Result<(), DomainError> {
        let mut requests = self.requests.lock().expect("requests lock poisoned");
        match requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::RefundRequestNotFound,
                format!("Refund request {} not found", request.id),
            )),
        }
    }

    async fn find_by_id(
        &self,
        id: &RefundRequestId,
    ) -> Result<Option<RefundRequest>, DomainError> {
        Ok(self
            .requests
            .lock()
            .expect("requests lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Vec<RefundRequest>, DomainError> {
        let requests = self.requests.lock().expect("requests lock poisoned");
        let mut result: Vec<RefundRequest> = requests
            .values()
            .filter(|r| &r.order_id == order_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }
}

pub struct InMemoryCancellationRepository {
    cancellations: Mutex<HashMap<CancellationId, Cancellation>>,
}

impl InMemoryCancellationRepository {
    pub fn new() -> Self {
        Self {
            cancellations: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCancellationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CancellationRepository for InMemoryCancellationRepository {
    async fn create(&self, cancellation: &Cancellation) -> Result<(), DomainError> {
        self.cancellations
            .lock()
            .expect("cancellations lock poisoned")
            .insert(cancellation.id, cancellation.clone());
        Ok(())
    }

    async fn update(&self, cancellation: &Cancellation) -> Result<(), DomainError> {
        let mut cancellations = self.cancellations.lock().expect("cancellations lock poisoned");
        match cancellations.get_mut(&cancellation.id) {
            Some(existing) => {
                *existing = cancellation.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::CancellationNotFound,
                format!("Cancellation {} not found", cancellation.id),
            )),
        }
    }

    async fn find_by_id(
        &self,
        id: &CancellationId,
    ) -> Result<Option<Cancellation>, DomainError> {
        Ok(self
            .cancellations
            .lock()
            .expect("cancellations lock poisoned")
            .get(id)
            .cloned())
    }
}
