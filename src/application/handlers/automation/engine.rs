//! AutomationEngine - rule evaluation and action execution.
//!
//! The engine fires on trigger contexts emitted by the checkout,
//! fulfillment, and bulk handlers. Matching rules run their actions in
//! declaration order; delayed actions go to the durable job queue
//! rather than an in-process timer, so a restart between trigger and
//! execution loses nothing.
//!
//! Rule execution is best effort with respect to the triggering
//! operation: a failing action is logged and never bubbles an error
//! back into the payment or fulfillment flow that fired the trigger.

use std::sync::Arc;

use crate::domain::automation::{AutomationAction, TriggerContext};
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, RuleId, Timestamp};
use crate::ports::{
    AutomationRepository, Job, JobPayload, JobQueue, NotificationKind, Notifier, OrderRepository,
};

pub struct AutomationEngine {
    rules: Arc<dyn AutomationRepository>,
    orders: Arc<dyn OrderRepository>,
    jobs: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
}

impl AutomationEngine {
    pub fn new(
        rules: Arc<dyn AutomationRepository>,
        orders: Arc<dyn OrderRepository>,
        jobs: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            rules,
            orders,
            jobs,
            notifier,
        }
    }

    /// Evaluates every enabled rule against the context and runs the
    /// matches. Returns the number of rules that fired.
    pub async fn fire(&self, ctx: TriggerContext) -> Result<u32, DomainError> {
        let candidates = self.rules.list_enabled_for(ctx.event).await?;
        let now = Timestamp::now();
        let mut fired = 0u32;

        for rule in candidates {
            if !rule.matches(&ctx) {
                continue;
            }
            tracing::info!(
                rule_id = %rule.id,
                rule_name = %rule.name,
                order_id = %ctx.order_id,
                event = ?ctx.event,
                "automation rule fired"
            );

            for scheduled in &rule.actions {
                match scheduled.delay_secs {
                    Some(delay) => {
                        self.jobs
                            .enqueue(Job {
                                payload: JobPayload::RunAutomationAction {
                                    rule_id: rule.id,
                                    order_id: ctx.order_id,
                                    action: scheduled.action.clone(),
                                },
                                run_at: now.add_secs(delay as i64),
                            })
                            .await?;
                    }
                    None => {
                        if let Err(err) = self
                            .execute_action(&rule.id, &ctx.order_id, &scheduled.action)
                            .await
                        {
                            tracing::warn!(
                                rule_id = %rule.id,
                                order_id = %ctx.order_id,
                                action = scheduled.action.kind(),
                                error = %err,
                                "automation action failed, skipping remaining actions"
                            );
                            break;
                        }
                    }
                }
            }

            self.rules.record_run(&rule.id, now).await?;
            fired += 1;
        }

        Ok(fired)
    }

    /// Runs one action against an order. Also the entry point for
    /// delayed actions drained from the job queue.
    pub async fn execute_action(
        &self,
        rule_id: &RuleId,
        order_id: &OrderId,
        action: &AutomationAction,
    ) -> Result<(), DomainError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::OrderNotFound, format!("Order {} not found", order_id))
            })?;
        let now = Timestamp::now();

        match action {
            AutomationAction::UpdateStatus { status, note } => {
                order.transition(*status, note.clone(), "automation", now)?;
                self.orders.update(&order).await?;
            }
            AutomationAction::SendNotification { event_type } => {
                self.notifier
                    .notify(
                        &order.user_id,
                        NotificationKind::OrderStatusChanged,
                        serde_json::json!({
                            "event_type": event_type,
                            "order_id": order.id.to_string(),
                            "rule_id": rule_id.to_string(),
                        }),
                    )
                    .await?;
            }
            AutomationAction::AssignTracking { carrier } => {
                let reference = format!(
                    "{}-{}",
                    carrier.to_uppercase(),
                    &uuid::Uuid::new_v4().simple().to_string()[..10].to_uppercase()
                );
                order.assign_tracking(carrier.clone(), reference, now);
                self.orders.update(&order).await?;
            }
            AutomationAction::SetPriority { priority } => {
                order.set_priority(*priority, now);
                self.orders.update(&order).await?;
            }
        }

        tracing::debug!(
            rule_id = %rule_id,
            order_id = %order_id,
            action = action.kind(),
            "automation action executed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::automation::{AutomationRule, ScheduledAction, TriggerEvent};
    use crate::domain::foundation::{Money, UserId};
    use crate::domain::order::{ItemRef, LineItem, Order, OrderPriority, PricingSnapshot};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockAutomationRepository {
        rules: Mutex<Vec<AutomationRule>>,
    }

    impl MockAutomationRepository {
        fn with_rules(rules: Vec<AutomationRule>) -> Self {
            Self {
                rules: Mutex::new(rules),
            }
        }

        fn rules(&self) -> Vec<AutomationRule> {
            self.rules.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AutomationRepository for MockAutomationRepository {
        async fn save(&self, rule: &AutomationRule) -> Result<(), DomainError> {
            self.rules.lock().unwrap().push(rule.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &RuleId) -> Result<Option<AutomationRule>, DomainError> {
            Ok(self.rules.lock().unwrap().iter().find(|r| &r.id == id).cloned())
        }

        async fn list_enabled_for(
            &self,
            trigger: TriggerEvent,
        ) -> Result<Vec<AutomationRule>, DomainError> {
            Ok(self
                .rules
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.enabled && r.trigger == trigger)
                .cloned()
                .collect())
        }

        async fn record_run(&self, id: &RuleId, at: Timestamp) -> Result<(), DomainError> {
            let mut rules = self.rules.lock().unwrap();
            if let Some(rule) = rules.iter_mut().find(|r| &r.id == id) {
                rule.record_run(at);
            }
            Ok(())
        }
    }

    struct MockOrderRepository {
        orders: Mutex<Vec<Order>>,
    }

    impl MockOrderRepository {
        fn with_order(order: Order) -> Self {
            Self {
                orders: Mutex::new(vec![order]),
            }
        }

        fn orders(&self) -> Vec<Order> {
            self.orders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrderRepository {
        async fn save(&self, order: &Order) -> Result<(), DomainError> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(())
        }

        async fn update(&self, order: &Order) -> Result<(), DomainError> {
            let mut orders = self.orders.lock().unwrap();
            if let Some(o) = orders.iter_mut().find(|o| o.id == order.id) {
                *o = order.clone();
            }
            Ok(())
        }

        async fn find_by_id(
            &self,
            id: &crate::domain::foundation::OrderId,
        ) -> Result<Option<Order>, DomainError> {
            Ok(self.orders.lock().unwrap().iter().find(|o| &o.id == id).cloned())
        }

        async fn find_many(
            &self,
            ids: &[crate::domain::foundation::OrderId],
        ) -> Result<Vec<Order>, DomainError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| ids.contains(&o.id))
                .cloned()
                .collect())
        }

        async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| &o.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn update_all(&self, orders: &[Order]) -> Result<(), DomainError> {
            for order in orders {
                self.update(order).await?;
            }
            Ok(())
        }
    }

    struct MockJobQueue {
        jobs: Mutex<Vec<Job>>,
    }

    impl MockJobQueue {
        fn new() -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
            }
        }

        fn jobs(&self) -> Vec<Job> {
            self.jobs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobQueue for MockJobQueue {
        async fn enqueue(&self, job: Job) -> Result<(), DomainError> {
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }

        async fn drain_due(&self, now: Timestamp) -> Result<Vec<Job>, DomainError> {
            let mut jobs = self.jobs.lock().unwrap();
            let (due, rest): (Vec<Job>, Vec<Job>) =
                jobs.drain(..).partition(|j| !j.run_at.is_after(&now));
            *jobs = rest;
            Ok(due)
        }
    }

    struct MockNotifier {
        sent: Mutex<Vec<(UserId, NotificationKind)>>,
    }

    impl MockNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(UserId, NotificationKind)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(
            &self,
            user_id: &UserId,
            kind: NotificationKind,
            _payload: serde_json::Value,
        ) -> Result<(), DomainError> {
            self.sent.lock().unwrap().push((user_id.clone(), kind));
            Ok(())
        }
    }

    fn paid_order() -> Order {
        let items = vec![LineItem::new(
            ItemRef::product(crate::domain::foundation::ProductId::new()),
            "Widget",
            1,
            Money::from_cents(2_000),
            Money::from_cents(2_000),
        )
        .unwrap()];
        let pricing = PricingSnapshot::compute(&items, Money::ZERO, Money::ZERO, None, Money::ZERO);
        let mut order = Order::create(
            crate::domain::foundation::OrderId::new(),
            UserId::new("user-1").unwrap(),
            items,
            pricing,
            Timestamp::now(),
        )
        .unwrap();
        order.mark_paid(false, Timestamp::now()).unwrap();
        order
    }

    fn engine(
        rules: Arc<MockAutomationRepository>,
        orders: Arc<MockOrderRepository>,
        jobs: Arc<MockJobQueue>,
        notifier: Arc<MockNotifier>,
    ) -> AutomationEngine {
        AutomationEngine::new(rules, orders, jobs, notifier)
    }

    #[tokio::test]
    async fn matching_rule_executes_immediate_action() {
        let order = paid_order();
        let order_id = order.id;
        let rule = AutomationRule::new(
            RuleId::new(),
            "escalate urgent",
            TriggerEvent::PaymentReceived,
            HashMap::new(),
            vec![ScheduledAction {
                action: AutomationAction::SetPriority {
                    priority: OrderPriority::High,
                },
                delay_secs: None,
            }],
        );

        let rules = Arc::new(MockAutomationRepository::with_rules(vec![rule]));
        let orders = Arc::new(MockOrderRepository::with_order(order));
        let jobs = Arc::new(MockJobQueue::new());
        let notifier = Arc::new(MockNotifier::new());
        let engine = engine(rules.clone(), orders.clone(), jobs, notifier);

        let fired = engine
            .fire(TriggerContext::new(TriggerEvent::PaymentReceived, order_id))
            .await
            .unwrap();

        assert_eq!(fired, 1);
        assert_eq!(orders.orders()[0].priority, OrderPriority::High);
        assert_eq!(rules.rules()[0].execution_count, 1);
    }

    #[tokio::test]
    async fn delayed_action_goes_to_job_queue_not_inline() {
        let order = paid_order();
        let order_id = order.id;
        let rule = AutomationRule::new(
            RuleId::new(),
            "delayed follow-up",
            TriggerEvent::PaymentReceived,
            HashMap::new(),
            vec![ScheduledAction {
                action: AutomationAction::SendNotification {
                    event_type: "follow_up".to_string(),
                },
                delay_secs: Some(3600),
            }],
        );

        let rules = Arc::new(MockAutomationRepository::with_rules(vec![rule]));
        let orders = Arc::new(MockOrderRepository::with_order(order));
        let jobs = Arc::new(MockJobQueue::new());
        let notifier = Arc::new(MockNotifier::new());
        let engine = engine(rules, orders, jobs.clone(), notifier.clone());

        engine
            .fire(TriggerContext::new(TriggerEvent::PaymentReceived, order_id))
            .await
            .unwrap();

        assert!(notifier.sent().is_empty());
        let queued = jobs.jobs();
        assert_eq!(queued.len(), 1);
        assert!(matches!(
            queued[0].payload,
            JobPayload::RunAutomationAction { .. }
        ));
        assert!(queued[0].run_at.is_after(&Timestamp::now().add_secs(3500)));
    }

    #[tokio::test]
    async fn condition_mismatch_skips_rule() {
        let order = paid_order();
        let order_id = order.id;
        let mut conditions = HashMap::new();
        conditions.insert("status".to_string(), "shipped".to_string());
        let rule = AutomationRule::new(
            RuleId::new(),
            "shipped only",
            TriggerEvent::StatusChanged,
            conditions,
            vec![ScheduledAction {
                action: AutomationAction::SetPriority {
                    priority: OrderPriority::Urgent,
                },
                delay_secs: None,
            }],
        );

        let rules = Arc::new(MockAutomationRepository::with_rules(vec![rule]));
        let orders = Arc::new(MockOrderRepository::with_order(order));
        let jobs = Arc::new(MockJobQueue::new());
        let notifier = Arc::new(MockNotifier::new());
        let engine = engine(rules.clone(), orders.clone(), jobs, notifier);

        let fired = engine
            .fire(
                TriggerContext::new(TriggerEvent::StatusChanged, order_id)
                    .with_attribute("status", "processing"),
            )
            .await
            .unwrap();

        assert_eq!(fired, 0);
        assert_eq!(orders.orders()[0].priority, OrderPriority::Normal);
        assert_eq!(rules.rules()[0].execution_count, 0);
    }

    #[tokio::test]
    async fn assign_tracking_writes_reference_with_carrier_prefix() {
        let order = paid_order();
        let order_id = order.id;
        let rule_id = RuleId::new();

        let rules = Arc::new(MockAutomationRepository::with_rules(vec![]));
        let orders = Arc::new(MockOrderRepository::with_order(order));
        let jobs = Arc::new(MockJobQueue::new());
        let notifier = Arc::new(MockNotifier::new());
        let engine = engine(rules, orders.clone(), jobs, notifier);

        engine
            .execute_action(
                &rule_id,
                &order_id,
                &AutomationAction::AssignTracking {
                    carrier: "ups".to_string(),
                },
            )
            .await
            .unwrap();

        let tracking = orders.orders()[0].tracking.clone().unwrap();
        assert_eq!(tracking.carrier, "ups");
        assert!(tracking.reference.starts_with("UPS-"));
    }

    #[tokio::test]
    async fn failed_action_does_not_fail_the_trigger() {
        let order = paid_order(); // Processing; Delivered is not reachable
        let order_id = order.id;
        let rule = AutomationRule::new(
            RuleId::new(),
            "bad transition then notify",
            TriggerEvent::PaymentReceived,
            HashMap::new(),
            vec![
                ScheduledAction {
                    action: AutomationAction::UpdateStatus {
                        status: crate::domain::order::OrderStatus::Delivered,
                        note: None,
                    },
                    delay_secs: None,
                },
                ScheduledAction {
                    action: AutomationAction::SendNotification {
                        event_type: "never_sent".to_string(),
                    },
                    delay_secs: None,
                },
            ],
        );

        let rules = Arc::new(MockAutomationRepository::with_rules(vec![rule]));
        let orders = Arc::new(MockOrderRepository::with_order(order));
        let jobs = Arc::new(MockJobQueue::new());
        let notifier = Arc::new(MockNotifier::new());
        let engine = engine(rules, orders, jobs, notifier.clone());

        let fired = engine
            .fire(TriggerContext::new(TriggerEvent::PaymentReceived, order_id))
            .await
            .unwrap();

        // The rule still counts as fired, remaining actions are skipped.
        assert_eq!(fired, 1);
        assert!(notifier.sent().is_empty());
    }
}
