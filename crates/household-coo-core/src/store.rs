//! Application state and the operations the dashboard performs on it.
//!
//! [`Store`] owns the key/value [`Database`] and keeps three documents in it:
//! the app state (tasks, integrations, last refresh), the budget, and the
//! feedback log. Every mutating operation writes through immediately.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::budget::{BudgetService, BudgetState};
use crate::error::{CoreError, Result};
use crate::feedback::{FeedbackItem, FeedbackLog, Signal};
use crate::instructions::{request_instructions, InstructionProvider, InstructionResponse};
use crate::integrations::{Integration, IntegrationsState};
use crate::money::Usd;
use crate::scoring::{adjust_task_score_by, distinct_top_tasks, Spotlight};
use crate::storage::{keys, Config, Database};
use crate::task::fixtures::demo_tasks;
use crate::task::{Dimension, Task, TaskPatch, TaskStatus};

/// Everything the dashboard shows; also the export/import document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,
    pub budget: BudgetState,
    #[serde(default)]
    pub integrations: IntegrationsState,
    #[serde(rename = "lastRefreshISO")]
    pub last_refresh: DateTime<Utc>,
}

/// The part of [`AppState`] stored under [`keys::APP_STATE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    integrations: IntegrationsState,
    #[serde(rename = "lastRefreshISO")]
    last_refresh: DateTime<Utc>,
}

pub struct Store {
    db: Database,
    config: Config,
    state: AppState,
}

impl Store {
    /// Open the store and run [`Store::load_initial_data`].
    pub fn open(db: Database, config: Config) -> Result<Self> {
        let budget = Self::budget_service_for(&db, &config).get()?;
        let mut store = Self {
            db,
            config,
            state: AppState {
                tasks: Vec::new(),
                feedback: Vec::new(),
                budget,
                integrations: IntegrationsState::default(),
                last_refresh: Utc::now(),
            },
        };
        store.load_initial_data()?;
        Ok(store)
    }

    fn budget_service_for<'a>(db: &'a Database, config: &Config) -> BudgetService<'a> {
        BudgetService::new(db).with_cost(Usd::from_dollars(config.budget.cost_per_instruction_usd))
    }

    fn budget_service(&self) -> BudgetService<'_> {
        Self::budget_service_for(&self.db, &self.config)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn task(&self, task_id: &str) -> Result<&Task> {
        self.state
            .tasks
            .iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))
    }

    /// Load persisted state, seeding the demo tasks when none are stored.
    pub fn load_initial_data(&mut self) -> Result<()> {
        let persisted = self.db.load_json::<PersistedState>(keys::APP_STATE)?;
        let (mut tasks, integrations, last_refresh) = match persisted {
            Some(p) => (p.tasks, p.integrations, p.last_refresh),
            None => (Vec::new(), self.default_integrations(), Utc::now()),
        };

        let seeded = tasks.is_empty();
        if seeded {
            tasks = demo_tasks();
        }

        self.state = AppState {
            tasks,
            feedback: FeedbackLog::new(&self.db).items()?,
            budget: self.budget_service().get()?,
            integrations,
            last_refresh,
        };

        if seeded {
            tracing::info!(count = self.state.tasks.len(), "seeded demo tasks");
            self.persist()?;
        }
        Ok(())
    }

    fn default_integrations(&self) -> IntegrationsState {
        IntegrationsState {
            whatsapp_bot_id: self.config.integrations.whatsapp_bot_id.clone(),
            ..IntegrationsState::default()
        }
    }

    fn persist(&self) -> Result<()> {
        let persisted = PersistedState {
            tasks: self.state.tasks.clone(),
            integrations: self.state.integrations.clone(),
            last_refresh: self.state.last_refresh,
        };
        self.db.save_json(keys::APP_STATE, &persisted)
    }

    /// Simulated refresh from the sources.
    pub fn sync(&mut self) -> Result<()> {
        self.sync_with_rng(&mut rand::thread_rng())
    }

    /// Re-stamp every task's `received_at` to a random instant in the last
    /// 24 hours and record the refresh time.
    pub fn sync_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let now = Utc::now();
        let day_ms = Duration::hours(24).num_milliseconds();
        for task in self.state.tasks.iter_mut() {
            task.received_at = now - Duration::milliseconds(rng.gen_range(0..day_ms));
        }
        self.state.last_refresh = now;
        self.persist()?;
        tracing::info!(tasks = self.state.tasks.len(), "synced");
        Ok(())
    }

    /// Apply a partial update to one task.
    pub fn update_task(&mut self, task_id: &str, patch: &TaskPatch) -> Result<&Task> {
        let index = self
            .state
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;
        patch.apply(&mut self.state.tasks[index]);
        self.persist()?;
        Ok(&self.state.tasks[index])
    }

    pub fn mark_task_done(&mut self, task_id: &str) -> Result<&Task> {
        self.update_task(task_id, &TaskPatch::status(TaskStatus::Done))
    }

    pub fn dismiss_task(&mut self, task_id: &str) -> Result<&Task> {
        self.update_task(task_id, &TaskPatch::status(TaskStatus::Dismissed))
    }

    /// Record feedback and nudge the task's score on `dimension`.
    pub fn submit_feedback(
        &mut self,
        task_id: &str,
        dimension: Dimension,
        signal: Signal,
    ) -> Result<&Task> {
        let index = self
            .state
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;

        let item = FeedbackLog::new(&self.db).submit(task_id, dimension, signal)?;
        self.state.feedback.push(item);

        let step = self.config.scoring.feedback_step;
        let updated = adjust_task_score_by(&self.state.tasks[index], dimension, signal, step);
        tracing::debug!(
            task_id,
            dimension = %dimension,
            from = self.state.tasks[index].score(dimension),
            to = updated.score(dimension),
            "score adjusted"
        );
        self.state.tasks[index] = updated;
        self.persist()?;
        Ok(&self.state.tasks[index])
    }

    pub fn budget(&self) -> &BudgetState {
        &self.state.budget
    }

    /// Re-read the budget from storage.
    pub fn refresh_budget(&mut self) -> Result<&BudgetState> {
        self.state.budget = self.budget_service().get()?;
        Ok(&self.state.budget)
    }

    pub fn add_funds(&mut self, amount: Usd) -> Result<&BudgetState> {
        self.state.budget = self.budget_service().add_funds(amount, Some("Add funds"))?;
        Ok(&self.state.budget)
    }

    pub fn reset_budget(&mut self) -> Result<&BudgetState> {
        self.state.budget = self.budget_service().reset()?;
        Ok(&self.state.budget)
    }

    /// Flip a connection flag; returns the new value.
    pub fn toggle_integration(&mut self, integration: Integration) -> Result<bool> {
        let connected = self.state.integrations.toggle(integration);
        self.persist()?;
        Ok(connected)
    }

    pub fn spotlight(&self) -> Spotlight {
        distinct_top_tasks(&self.state.tasks)
    }

    /// Buy instructions for a task with budget credits.
    pub async fn request_instructions<P: InstructionProvider>(
        &mut self,
        task_id: &str,
        provider: &mut P,
    ) -> Result<InstructionResponse> {
        self.task(task_id)?;
        let result = request_instructions(&self.budget_service(), provider, task_id).await;
        // The charge may have landed even if the fetch failed.
        self.refresh_budget()?;
        result
    }

    /// Pretty-printed JSON of the full state.
    pub fn export_data(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    /// Replace all stored state with an exported document.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidImport`] if the document does not parse
    /// or contains an invalid task; nothing is written in that case.
    pub fn import_data(&mut self, json: &str) -> Result<()> {
        let imported: AppState =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidImport(e.to_string()))?;
        for task in &imported.tasks {
            task.validate()
                .map_err(|e| CoreError::InvalidImport(format!("task '{}': {e}", task.id)))?;
        }

        self.db.save_json(keys::BUDGET, &imported.budget)?;
        self.db.save_json(keys::FEEDBACK, &imported.feedback)?;
        self.state = imported;
        self.persist()?;
        // Stored budget may need the configured instruction price applied.
        self.refresh_budget()?;
        tracing::info!(tasks = self.state.tasks.len(), "imported state");
        Ok(())
    }

    /// Clear all stored state and start over from the demo data.
    pub fn reset_demo(&mut self) -> Result<()> {
        self.db.kv_remove(keys::APP_STATE)?;
        FeedbackLog::new(&self.db).clear()?;
        self.budget_service().reset()?;
        self.load_initial_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BudgetError;
    use crate::instructions::MockInstructionProvider;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn store() -> Store {
        Store::open(Database::open_memory().unwrap(), Config::default()).unwrap()
    }

    #[test]
    fn first_open_seeds_demo_tasks() {
        let store = store();
        assert_eq!(store.tasks().len(), 5);
        assert!(store.database().kv_get(keys::APP_STATE).unwrap().is_some());
        assert_eq!(store.budget().balance_usd, Usd::from_cents(1248));
        assert!(store.state().feedback.is_empty());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coo.db");
        {
            let mut store = Store::open(Database::open_at(&path).unwrap(), Config::default()).unwrap();
            store.mark_task_done("t1").unwrap();
            store.toggle_integration(Integration::Gmail).unwrap();
        }
        let store = Store::open(Database::open_at(&path).unwrap(), Config::default()).unwrap();
        assert_eq!(store.task("t1").unwrap().status, TaskStatus::Done);
        assert!(!store.state().integrations.gmail_connected);
    }

    #[test]
    fn corrupt_app_state_falls_back_to_fixtures() {
        let db = Database::open_memory().unwrap();
        db.kv_set(keys::APP_STATE, "[[[").unwrap();
        let store = Store::open(db, Config::default()).unwrap();
        assert_eq!(store.tasks().len(), 5);
    }

    #[test]
    fn feedback_nudges_score_and_is_logged() {
        let mut store = store();
        let task = store.submit_feedback("t2", Dimension::Savings, Signal::Up).unwrap();
        assert_eq!(task.savings_score, 91);
        assert_eq!(store.state().feedback.len(), 1);
        assert_eq!(FeedbackLog::new(store.database()).items().unwrap().len(), 1);
    }

    #[test]
    fn feedback_step_follows_config() {
        let mut config = Config::default();
        config.scoring.feedback_step = 10;
        let mut store = Store::open(Database::open_memory().unwrap(), config).unwrap();
        let task = store.submit_feedback("t1", Dimension::Urgency, Signal::Down).unwrap();
        assert_eq!(task.urgency, 68);
    }

    #[test]
    fn unknown_task_is_reported() {
        let mut store = store();
        assert!(matches!(store.mark_task_done("nope"), Err(CoreError::TaskNotFound(_))));
        assert!(matches!(
            store.submit_feedback("nope", Dimension::Importance, Signal::Up),
            Err(CoreError::TaskNotFound(_))
        ));
        assert!(store.state().feedback.is_empty());
    }

    #[test]
    fn closing_tasks_changes_the_spotlight() {
        let mut store = store();
        assert_eq!(store.spotlight().importance.map(|t| t.id), Some("t3".to_string()));
        store.dismiss_task("t3").unwrap();
        store.mark_task_done("t2").unwrap();
        let spotlight = store.spotlight();
        assert_eq!(spotlight.importance.map(|t| t.id), Some("t1".to_string()));
        assert_eq!(spotlight.urgency.map(|t| t.id), Some("t5".to_string()));
        assert_eq!(spotlight.savings.map(|t| t.id), Some("t4".to_string()));
    }

    #[test]
    fn sync_restamps_within_a_day() {
        let mut store = store();
        let before = Utc::now();
        store.sync_with_rng(&mut Mcg128Xsl64::seed_from_u64(3)).unwrap();
        for task in store.tasks() {
            assert!(task.received_at <= Utc::now());
            assert!(task.received_at >= before - Duration::hours(24));
        }
        assert!(store.state().last_refresh >= before);
    }

    #[test]
    fn add_funds_updates_cached_budget() {
        let mut store = store();
        let budget = store.add_funds(Usd::from_cents(500)).unwrap();
        assert_eq!(budget.balance_usd, Usd::from_cents(1748));
        assert!(store.add_funds(Usd::ZERO).is_err());
    }

    #[tokio::test]
    async fn instructions_charge_the_budget() {
        let mut store = store();
        let mut provider = MockInstructionProvider::reliable();
        let response = store.request_instructions("t3", &mut provider).await.unwrap();
        assert!(!response.steps.is_empty());
        assert_eq!(store.budget().balance_usd, Usd::from_cents(1246));
    }

    #[tokio::test]
    async fn instructions_for_unknown_task_cost_nothing() {
        let mut store = store();
        let mut provider = MockInstructionProvider::reliable();
        assert!(store.request_instructions("t9", &mut provider).await.is_err());
        assert_eq!(store.budget().balance_usd, Usd::from_cents(1248));
    }

    #[tokio::test]
    async fn instructions_refused_when_broke() {
        let mut config = Config::default();
        config.budget.cost_per_instruction_usd = 50.0;
        let mut store = Store::open(Database::open_memory().unwrap(), config).unwrap();
        let mut provider = MockInstructionProvider::reliable();
        let err = store.request_instructions("t1", &mut provider).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Budget(BudgetError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn export_then_import_restores_state() {
        let mut store = store();
        store.submit_feedback("t1", Dimension::Importance, Signal::Down).unwrap();
        store.dismiss_task("t4").unwrap();
        let exported = store.export_data().unwrap();

        let mut other = self::store();
        other.import_data(&exported).unwrap();
        assert_eq!(other.task("t1").unwrap().importance, 89);
        assert_eq!(other.task("t4").unwrap().status, TaskStatus::Dismissed);
        assert_eq!(other.state().feedback.len(), 1);
        assert_eq!(FeedbackLog::new(other.database()).items().unwrap().len(), 1);
    }

    #[test]
    fn export_uses_original_field_names() {
        let json: serde_json::Value = serde_json::from_str(&store().export_data().unwrap()).unwrap();
        assert!(json.get("lastRefreshISO").is_some());
        assert_eq!(json["integrations"]["whatsappBotId"], "+1-555-COO-HELP");
        assert_eq!(json["budget"]["balanceUsd"], 12.48);
    }

    #[test]
    fn import_rejects_invalid_json_without_writing() {
        let mut store = store();
        store.dismiss_task("t1").unwrap();
        let err = store.import_data("{ nope").unwrap_err();
        assert!(matches!(err, CoreError::InvalidImport(_)));
        assert!(err.to_string().starts_with("Invalid JSON data"));
        assert_eq!(store.task("t1").unwrap().status, TaskStatus::Dismissed);
    }

    #[test]
    fn reset_demo_restores_everything() {
        let mut store = store();
        store.submit_feedback("t1", Dimension::Importance, Signal::Up).unwrap();
        store.mark_task_done("t1").unwrap();
        store.add_funds(Usd::from_cents(1000)).unwrap();

        store.reset_demo().unwrap();
        assert_eq!(store.task("t1").unwrap().status, TaskStatus::Open);
        assert_eq!(store.task("t1").unwrap().importance, 92);
        assert!(store.state().feedback.is_empty());
        assert_eq!(store.budget().balance_usd, Usd::from_cents(1248));
    }
}
