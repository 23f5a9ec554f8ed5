//! Turning a paid (or simulated) order into a queued pipeline run.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::OrderTracker;
use crate::counter::{Counter, CounterError};
use crate::models::order::{EmailKind, OrderPatch, OrderStatus, Step};
use crate::notify::Notifier;
use crate::pipeline::{OrderJob, OrderRunner};
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("SOLD_OUT")]
    SoldOut,

    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    UnknownOrder(String),

    #[error("Order {0} could not be recorded")]
    Unrecorded(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CounterError> for AdmissionError {
    fn from(e: CounterError) -> Self {
        match e {
            CounterError::SoldOut => AdmissionError::SoldOut,
            CounterError::Store(e) => AdmissionError::Store(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub email: String,
    pub filename: String,
    pub photo_filename: Option<String>,
}

impl NewOrder {
    fn validate(&self) -> Result<(), AdmissionError> {
        if self.filename.trim().is_empty() {
            return Err(AdmissionError::Validation("Filename required".into()));
        }
        if !self.email.contains('@') {
            return Err(AdmissionError::Validation("Valid email required".into()));
        }
        let names = std::iter::once(&self.filename).chain(self.photo_filename.as_ref());
        if names.into_iter().any(|n| !is_plain_filename(n)) {
            return Err(AdmissionError::Validation("Invalid upload reference".into()));
        }
        Ok(())
    }
}

/// Upload references are bare names inside the uploads directory.
fn is_plain_filename(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}

#[derive(Debug, Clone, PartialEq)]
pub struct Admitted {
    pub order_id: String,
    pub position: u32,
    pub eta_minutes: u32,
}

/// Gateway outcome codes: `1` paid, `2` pending, anything else failed.
#[derive(Debug, Clone)]
pub struct PaymentCallback {
    pub order_id: String,
    pub status: String,
    pub reference: Option<String>,
    pub reason: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Admitted(Admitted),
    AlreadyAdmitted,
    SoldOut,
    Pending,
    Failed,
}

#[derive(Clone)]
pub struct Admission {
    counter: Counter,
    tracker: OrderTracker,
    notifier: Notifier,
    runner: Arc<dyn OrderRunner>,
    eta_minutes: u32,
}

impl Admission {
    pub fn new(
        counter: Counter,
        tracker: OrderTracker,
        notifier: Notifier,
        runner: Arc<dyn OrderRunner>,
        eta_minutes: u32,
    ) -> Self {
        Self {
            counter,
            tracker,
            notifier,
            runner,
            eta_minutes,
        }
    }

    /// Records a `pending_payment` order awaiting the gateway callback.
    pub async fn checkout(&self, order: NewOrder) -> Result<String, AdmissionError> {
        order.validate()?;
        if self.counter.is_sold_out().await? {
            return Err(AdmissionError::SoldOut);
        }

        let order_id = Uuid::new_v4().to_string();
        let patch = OrderPatch {
            email: Some(order.email),
            filename: Some(order.filename),
            photo_filename: order.photo_filename,
            ..Default::default()
        };
        self.tracker
            .update(&order_id, OrderStatus::PendingPayment, patch)
            .await
            .ok_or_else(|| AdmissionError::Unrecorded(order_id.clone()))?;

        info!("Checkout opened for order {order_id}");
        Ok(order_id)
    }

    /// Admits directly, bypassing payment.
    pub async fn simulate(&self, order: NewOrder) -> Result<Admitted, AdmissionError> {
        order.validate()?;
        let order_id = Uuid::new_v4().to_string();
        let position = self.counter.admit(&order.email, &order_id).await?;
        Ok(self.start(&order_id, order, position).await)
    }

    /// Queues an order that holds slot `position`, sends the confirmation and
    /// starts the pipeline in the background. Called once per admitted order.
    async fn start(&self, order_id: &str, order: NewOrder, position: u32) -> Admitted {
        let now = Utc::now();
        let patch = OrderPatch {
            email: Some(order.email.clone()),
            filename: Some(order.filename.clone()),
            photo_filename: order.photo_filename.clone(),
            position: Some(position),
            eta_minutes: Some(self.eta_minutes),
            ..Default::default()
        }
        .step(Step::Queued, now);
        self.tracker.update(order_id, OrderStatus::Queued, patch).await;

        let confirmation = match self
            .notifier
            .confirmation(&order.email, order_id, self.eta_minutes)
            .await
        {
            Ok(preview) => OrderPatch::default().email(EmailKind::Confirmation, preview),
            Err(e) => {
                warn!("Confirmation email for order {order_id} failed: {e}");
                OrderPatch {
                    email_error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };
        self.tracker
            .update(order_id, OrderStatus::Queued, confirmation)
            .await;

        let job = OrderJob {
            order_id: order_id.to_string(),
            email: order.email,
            position,
            resume_filename: order.filename,
            photo_filename: order.photo_filename,
        };
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move { runner.run(job).await });

        info!(
            "Order {order_id} admitted at #{position}/{}",
            self.counter.max()
        );
        Admitted {
            order_id: order_id.to_string(),
            position,
            eta_minutes: self.eta_minutes,
        }
    }

    /// Applies a payment gateway callback.
    ///
    /// Every outcome is a conditional move out of `pending_payment`, so of
    /// several concurrent or redelivered callbacks exactly one takes effect.
    /// The rest are acknowledged as [`CallbackOutcome::AlreadyAdmitted`].
    pub async fn payment_callback(
        &self,
        callback: PaymentCallback,
    ) -> Result<CallbackOutcome, AdmissionError> {
        let order_id = callback.order_id.as_str();
        let (next, outcome) = match callback.status.trim() {
            "1" => (OrderStatus::Queued, None),
            "2" => (OrderStatus::PendingPayment, Some(CallbackOutcome::Pending)),
            _ => (OrderStatus::PaymentFailed, Some(CallbackOutcome::Failed)),
        };
        let patch = OrderPatch {
            payment_ref: callback.reference,
            payment_reason: callback.reason,
            payment_amount: callback.amount,
            ..Default::default()
        };

        let claimed = self
            .tracker
            .transition(order_id, OrderStatus::PendingPayment, next, patch)
            .await?;
        let Some(record) = claimed else {
            return match self.tracker.get(order_id).await.status {
                OrderStatus::NotFound => Err(AdmissionError::UnknownOrder(order_id.to_string())),
                _ => {
                    info!("Ignoring repeated payment callback for order {order_id}");
                    Ok(CallbackOutcome::AlreadyAdmitted)
                }
            };
        };
        if let Some(outcome) = outcome {
            info!("Payment for order {order_id} is {}", next.as_str());
            return Ok(outcome);
        }

        let (Some(email), Some(filename)) = (record.email, record.filename) else {
            self.fail(order_id, "Order has no upload on record").await;
            return Err(AdmissionError::UnknownOrder(order_id.to_string()));
        };
        let order = NewOrder {
            email,
            filename,
            photo_filename: record.photo_filename,
        };
        match self.counter.admit(&order.email, order_id).await {
            Ok(position) => Ok(CallbackOutcome::Admitted(
                self.start(order_id, order, position).await,
            )),
            Err(CounterError::SoldOut) => {
                self.reject_sold_out(order_id, &order.email).await;
                Ok(CallbackOutcome::SoldOut)
            }
            Err(CounterError::Store(e)) => {
                error!("Paid order {order_id} could not take a slot: {e}");
                self.fail(order_id, "Admission could not be recorded").await;
                Err(e.into())
            }
        }
    }

    async fn fail(&self, order_id: &str, reason: &str) {
        let patch = OrderPatch {
            error: Some(reason.to_string()),
            ..Default::default()
        };
        self.tracker
            .update(order_id, OrderStatus::Failed, patch)
            .await;
    }

    async fn reject_sold_out(&self, order_id: &str, email: &str) {
        warn!("Order {order_id} paid after sell-out");
        let mut patch = OrderPatch {
            error: Some("SOLD_OUT".to_string()),
            ..Default::default()
        };
        match self.notifier.sold_out(email).await {
            Ok(preview) => patch = patch.email(EmailKind::SoldOut, preview),
            Err(e) => patch.email_error = Some(e.to_string()),
        }
        self.tracker
            .update(order_id, OrderStatus::Failed, patch)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::counter::file::FileCounterStore;
    use crate::notify::PreviewMailer;
    use crate::orders::file::FileOrderStore;

    #[derive(Default)]
    struct RecordingRunner {
        jobs: Mutex<Vec<OrderJob>>,
    }

    #[async_trait]
    impl OrderRunner for RecordingRunner {
        async fn run(&self, job: OrderJob) {
            self.jobs.lock().await.push(job);
        }
    }

    struct Setup {
        admission: Admission,
        counter: Counter,
        tracker: OrderTracker,
        runner: Arc<RecordingRunner>,
        _dir: tempfile::TempDir,
    }

    async fn setup(max: u32) -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let counter_store = FileCounterStore::open(dir.path().join("counter.json"))
            .await
            .unwrap();
        let order_store = FileOrderStore::open(dir.path().join("orders.json"))
            .await
            .unwrap();
        let tracker = OrderTracker::new(Arc::new(order_store));
        let runner = Arc::new(RecordingRunner::default());
        let counter = Counter::new(Arc::new(counter_store), max);
        let admission = Admission::new(
            counter.clone(),
            tracker.clone(),
            Notifier::new(Arc::new(PreviewMailer), None, max),
            runner.clone(),
            3,
        );
        Setup {
            admission,
            counter,
            tracker,
            runner,
            _dir: dir,
        }
    }

    fn order(email: &str) -> NewOrder {
        NewOrder {
            email: email.into(),
            filename: "r.pdf".into(),
            photo_filename: None,
        }
    }

    async fn wait_for_jobs(runner: &RecordingRunner, n: usize) {
        for _ in 0..100 {
            if runner.jobs.lock().await.len() >= n {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("runner never received {n} jobs");
    }

    #[tokio::test]
    async fn test_simulate_queues_and_starts_pipeline() {
        let s = setup(50).await;
        let admitted = s.admission.simulate(order("a@b.com")).await.unwrap();
        assert_eq!(admitted.position, 1);
        assert_eq!(admitted.eta_minutes, 3);

        let record = s.tracker.get(&admitted.order_id).await;
        assert_eq!(record.status, OrderStatus::Queued);
        assert_eq!(record.position, Some(1));
        assert!(record.steps.contains_key(&Step::Queued));
        assert!(record.emails[&EmailKind::Confirmation].preview);

        wait_for_jobs(&s.runner, 1).await;
        let jobs = s.runner.jobs.lock().await;
        assert_eq!(jobs[0].order_id, admitted.order_id);
        assert_eq!(jobs[0].resume_filename, "r.pdf");
    }

    #[tokio::test]
    async fn test_simulate_rejects_bad_input_and_sold_out() {
        let s = setup(1).await;
        assert!(matches!(
            s.admission.simulate(order("not-an-email")).await,
            Err(AdmissionError::Validation(_))
        ));
        let mut escaping = order("a@b.com");
        escaping.filename = "../secrets.pdf".into();
        assert!(matches!(
            s.admission.simulate(escaping).await,
            Err(AdmissionError::Validation(_))
        ));
        s.admission.simulate(order("a@b.com")).await.unwrap();
        assert!(matches!(
            s.admission.simulate(order("c@d.com")).await,
            Err(AdmissionError::SoldOut)
        ));
        assert!(matches!(
            s.admission.checkout(order("c@d.com")).await,
            Err(AdmissionError::SoldOut)
        ));
    }

    fn callback(order_id: &str, status: &str) -> PaymentCallback {
        PaymentCallback {
            order_id: order_id.into(),
            status: status.into(),
            reference: Some("TP123".into()),
            reason: Some("Approved".into()),
            amount: Some("2900".into()),
        }
    }

    #[tokio::test]
    async fn test_paid_callback_admits_once() {
        let s = setup(50).await;
        let order_id = s.admission.checkout(order("a@b.com")).await.unwrap();
        assert_eq!(
            s.tracker.get(&order_id).await.status,
            OrderStatus::PendingPayment
        );

        let first = s.admission.payment_callback(callback(&order_id, "1")).await.unwrap();
        assert!(matches!(first, CallbackOutcome::Admitted(ref a) if a.position == 1));
        let again = s.admission.payment_callback(callback(&order_id, "1")).await.unwrap();
        assert_eq!(again, CallbackOutcome::AlreadyAdmitted);
        let late_failure = s.admission.payment_callback(callback(&order_id, "3")).await.unwrap();
        assert_eq!(late_failure, CallbackOutcome::AlreadyAdmitted);
        assert_eq!(s.tracker.get(&order_id).await.status, OrderStatus::Queued);

        let record = s.tracker.get(&order_id).await;
        assert_eq!(record.payment_ref.as_deref(), Some("TP123"));
        assert_eq!(record.payment_amount.as_deref(), Some("2900"));
        assert_eq!(s.counter.remaining_slots().await.unwrap(), 49);

        wait_for_jobs(&s.runner, 1).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(s.runner.jobs.lock().await.len(), 1);
    }

    async fn jobs_for(runner: &RecordingRunner, order_id: &str) -> usize {
        let jobs = runner.jobs.lock().await;
        jobs.iter().filter(|j| j.order_id == order_id).count()
    }

    async fn settle() {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    async fn race(s: &Setup, order_id: &str, a: &str, b: &str) -> (CallbackOutcome, CallbackOutcome) {
        let (first, second) = (s.admission.clone(), s.admission.clone());
        let (cb_a, cb_b) = (callback(order_id, a), callback(order_id, b));
        let ta = tokio::spawn(async move { first.payment_callback(cb_a).await });
        let tb = tokio::spawn(async move { second.payment_callback(cb_b).await });
        (ta.await.unwrap().unwrap(), tb.await.unwrap().unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_paid_callbacks_start_one_pipeline() {
        let s = setup(50).await;
        for _ in 0..20 {
            let order_id = s.admission.checkout(order("a@b.com")).await.unwrap();
            let (a, b) = race(&s, &order_id, "1", "1").await;

            let admitted = [&a, &b]
                .iter()
                .filter(|o| matches!(o, CallbackOutcome::Admitted(_)))
                .count();
            assert_eq!(admitted, 1, "outcomes: {a:?} / {b:?}");
            assert!(a == CallbackOutcome::AlreadyAdmitted || b == CallbackOutcome::AlreadyAdmitted);

            settle().await;
            assert_eq!(jobs_for(&s.runner, &order_id).await, 1);
            assert_eq!(s.tracker.get(&order_id).await.status, OrderStatus::Queued);
        }
        assert_eq!(s.counter.remaining_slots().await.unwrap(), 30);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_paid_and_failed_callbacks_agree_with_record() {
        let s = setup(50).await;
        for _ in 0..20 {
            let order_id = s.admission.checkout(order("a@b.com")).await.unwrap();
            let (paid, failed) = race(&s, &order_id, "1", "3").await;
            settle().await;

            let record = s.tracker.get(&order_id).await;
            match (paid, failed) {
                (CallbackOutcome::Admitted(_), CallbackOutcome::AlreadyAdmitted) => {
                    assert_eq!(record.status, OrderStatus::Queued);
                    assert_eq!(jobs_for(&s.runner, &order_id).await, 1);
                }
                (CallbackOutcome::AlreadyAdmitted, CallbackOutcome::Failed) => {
                    assert_eq!(record.status, OrderStatus::PaymentFailed);
                    assert_eq!(jobs_for(&s.runner, &order_id).await, 0);
                }
                other => panic!("inconsistent outcomes: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_pending_and_failed_callbacks() {
        let s = setup(50).await;
        let pending = s.admission.checkout(order("a@b.com")).await.unwrap();
        let outcome = s.admission.payment_callback(callback(&pending, "2")).await.unwrap();
        assert_eq!(outcome, CallbackOutcome::Pending);
        let record = s.tracker.get(&pending).await;
        assert_eq!(record.status, OrderStatus::PendingPayment);
        assert_eq!(record.payment_reason.as_deref(), Some("Approved"));

        let failed = s.admission.checkout(order("c@d.com")).await.unwrap();
        let outcome = s.admission.payment_callback(callback(&failed, "3")).await.unwrap();
        assert_eq!(outcome, CallbackOutcome::Failed);
        assert_eq!(s.tracker.get(&failed).await.status, OrderStatus::PaymentFailed);
    }

    #[tokio::test]
    async fn test_paid_after_sell_out_fails_with_email() {
        let s = setup(1).await;
        let late = s.admission.checkout(order("late@b.com")).await.unwrap();
        s.admission.simulate(order("a@b.com")).await.unwrap();

        let outcome = s.admission.payment_callback(callback(&late, "1")).await.unwrap();
        assert_eq!(outcome, CallbackOutcome::SoldOut);
        let record = s.tracker.get(&late).await;
        assert_eq!(record.status, OrderStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("SOLD_OUT"));
        assert!(record.emails.contains_key(&EmailKind::SoldOut));
    }

    #[tokio::test]
    async fn test_callback_for_unknown_order() {
        let s = setup(50).await;
        assert!(matches!(
            s.admission.payment_callback(callback("missing", "1")).await,
            Err(AdmissionError::UnknownOrder(_))
        ));
    }
}
