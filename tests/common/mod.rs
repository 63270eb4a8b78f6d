#![allow(dead_code)]

use async_trait::async_trait;
use khazna::application::catalog::FeeCatalog;
use khazna::application::enforcer::ScheduleEnforcer;
use khazna::application::ledger::SafeLedger;
use khazna::application::lifecycle::PaymentLifecycle;
use khazna::domain::id::{FeeId, ProgramId, TraineeId, UserId};
use khazna::domain::payment::TraineePayment;
use khazna::domain::ports::{
    AccessPolicy, AllowAll, ProgramDirectory, RestrictionGate, TreasuryStore, TreasuryStoreArc,
};
use khazna::domain::safe::Currency;
use khazna::domain::schedule::NonPaymentAction;
use khazna::error::{Result, TreasuryError};
use khazna::infrastructure::in_memory::InMemoryTreasuryStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

pub const ACTOR: UserId = UserId(1);

pub fn egp() -> Currency {
    Currency::new("EGP").unwrap()
}

/// Directory fake with a fixed enrollment list.
pub struct StaticDirectory {
    trainees: Vec<TraineeId>,
}

impl StaticDirectory {
    pub fn with_trainees(count: u64) -> Self {
        Self {
            trainees: (1..=count).map(TraineeId).collect(),
        }
    }
}

#[async_trait]
impl ProgramDirectory for StaticDirectory {
    async fn enrolled_trainees(
        &self,
        _program: ProgramId,
        _academic_year: &str,
    ) -> Result<Vec<TraineeId>> {
        Ok(self.trainees.clone())
    }
}

/// Directory fake that always fails, for fan-out atomicity tests.
pub struct FailingDirectory;

#[async_trait]
impl ProgramDirectory for FailingDirectory {
    async fn enrolled_trainees(
        &self,
        _program: ProgramId,
        _academic_year: &str,
    ) -> Result<Vec<TraineeId>> {
        Err(TreasuryError::Storage("directory unavailable".to_string()))
    }
}

/// Policy fake that denies the listed operations and permits everything else,
/// so a test can set up state and then exercise one forbidden call.
pub struct DenyListed(pub &'static [&'static str]);

impl AccessPolicy for DenyListed {
    fn can_perform(&self, _actor: UserId, operation: &'static str) -> bool {
        !self.0.contains(&operation)
    }
}

/// Gate fake that records the last absolute state per (trainee, action).
#[derive(Default)]
pub struct RecordingGate {
    states: Mutex<HashMap<(TraineeId, NonPaymentAction), bool>>,
    calls: AtomicUsize,
}

impl RecordingGate {
    pub async fn is_restricted(&self, trainee: TraineeId, action: NonPaymentAction) -> bool {
        *self
            .states
            .lock()
            .await
            .get(&(trainee, action))
            .unwrap_or(&false)
    }

    pub async fn snapshot(&self) -> HashMap<(TraineeId, NonPaymentAction), bool> {
        self.states.lock().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestrictionGate for RecordingGate {
    async fn set_restricted(
        &self,
        trainee: TraineeId,
        action: NonPaymentAction,
        restricted: bool,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .await
            .insert((trainee, action), restricted);
        Ok(())
    }
}

/// Fully wired in-memory treasury for integration tests.
pub struct Harness {
    pub store: InMemoryTreasuryStore,
    pub ledger: Arc<SafeLedger>,
    pub catalog: FeeCatalog,
    pub lifecycle: Arc<PaymentLifecycle>,
    pub enforcer: ScheduleEnforcer,
    pub gate: Arc<RecordingGate>,
}

impl Harness {
    pub fn new(enrolled: u64) -> Self {
        Self::build(
            Arc::new(StaticDirectory::with_trainees(enrolled)),
            Arc::new(AllowAll),
        )
    }

    pub fn with_directory(directory: Arc<dyn ProgramDirectory>) -> Self {
        Self::build(directory, Arc::new(AllowAll))
    }

    pub fn with_access(enrolled: u64, access: Arc<dyn AccessPolicy>) -> Self {
        Self::build(Arc::new(StaticDirectory::with_trainees(enrolled)), access)
    }

    fn build(directory: Arc<dyn ProgramDirectory>, access: Arc<dyn AccessPolicy>) -> Self {
        let store = InMemoryTreasuryStore::new();
        let store_arc: TreasuryStoreArc = Arc::new(store.clone());
        let gate = Arc::new(RecordingGate::default());

        let ledger = Arc::new(SafeLedger::new(store_arc.clone(), access.clone()));
        let catalog = FeeCatalog::new(store_arc.clone(), directory, access.clone());
        let lifecycle = Arc::new(PaymentLifecycle::new(
            store_arc.clone(),
            ledger.clone(),
            access.clone(),
        ));
        let enforcer = ScheduleEnforcer::new(store_arc, gate.clone(), access);

        Self {
            store,
            ledger,
            catalog,
            lifecycle,
            enforcer,
            gate,
        }
    }

    /// Payment rows under a fee, straight from the store, ordered by id.
    pub async fn store_payments(&self, fee: FeeId) -> Vec<TraineePayment> {
        self.store.payments_for_fee(fee).await.unwrap()
    }
}
