//! Integration tests for the dashboard workflow over on-disk storage.

use household_coo_core::{
    BudgetError, Config, CoreError, Database, Dimension, MockInstructionProvider, RecordDb,
    Signal, Store, TaskStatus, Usd,
};

fn open(path: &std::path::Path) -> Store {
    Store::open(Database::open_at(path).unwrap(), Config::default()).unwrap()
}

#[tokio::test]
async fn test_full_triage_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coo.db");
    let mut store = open(&path);

    let spotlight = store.spotlight();
    let ids: Vec<_> = spotlight.iter().map(|(_, t)| t.id.clone()).collect();
    assert_eq!(ids, vec!["t3", "t1", "t2"]);

    // Push t1 ahead of t3 on importance.
    for _ in 0..2 {
        store.submit_feedback("t1", Dimension::Importance, Signal::Up).unwrap();
    }
    assert_eq!(store.task("t1").unwrap().importance, 98);
    assert_eq!(store.spotlight().importance.map(|t| t.id), Some("t1".into()));

    let mut provider = MockInstructionProvider::reliable();
    store.request_instructions("t1", &mut provider).await.unwrap();
    store.mark_task_done("t1").unwrap();
    drop(store);

    let store = open(&path);
    assert_eq!(store.task("t1").unwrap().status, TaskStatus::Done);
    assert_eq!(store.state().feedback.len(), 2);
    assert_eq!(store.budget().balance_usd, Usd::from_cents(1246));
    assert_eq!(store.budget().ledger[0].note.as_deref(), Some("Instruction: t1"));
}

#[tokio::test]
async fn test_budget_runs_dry() {
    let mut config = Config::default();
    config.budget.cost_per_instruction_usd = 5.0;
    let mut store = Store::open(Database::open_memory().unwrap(), config).unwrap();
    let mut provider = MockInstructionProvider::reliable();

    // $12.48 covers two $5 requests, not three.
    store.request_instructions("t2", &mut provider).await.unwrap();
    store.request_instructions("t2", &mut provider).await.unwrap();
    let err = store
        .request_instructions("t2", &mut provider)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Insufficient balance. Required: $5.00, Available: $2.48"
    );
    match err {
        CoreError::Budget(BudgetError::InsufficientBalance { required, available }) => {
            assert_eq!(required, Usd::from_cents(500));
            assert_eq!(available, Usd::from_cents(248));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.budget().balance_usd, Usd::from_cents(248));
    assert_eq!(store.budget().instructions_remaining(), 0);
}

#[test]
fn test_export_import_between_stores() {
    let mut source = Store::open(Database::open_memory().unwrap(), Config::default()).unwrap();
    source.dismiss_task("t5").unwrap();
    source.submit_feedback("t4", Dimension::Savings, Signal::Down).unwrap();
    source.add_funds(Usd::from_cents(100)).unwrap();
    let json = source.export_data().unwrap();

    let mut target = Store::open(Database::open_memory().unwrap(), Config::default()).unwrap();
    target.import_data(&json).unwrap();
    assert_eq!(target.state(), source.state());

    assert!(matches!(
        target.import_data("{\"tasks\": 3}"),
        Err(CoreError::InvalidImport(_))
    ));
    assert_eq!(target.state(), source.state());
}

#[test]
fn test_snapshot_to_record_db() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(Database::open_memory().unwrap(), Config::default()).unwrap();
    store.submit_feedback("t2", Dimension::Urgency, Signal::Up).unwrap();

    let records = RecordDb::open_at(&dir.path().join("records.db")).unwrap();
    let summary = records.snapshot(store.state()).unwrap();
    assert_eq!(summary.tasks, 5);
    assert_eq!(summary.feedback, 1);

    let stored = records.list_tasks().unwrap();
    let t2 = stored.iter().find(|t| t.id == "t2").unwrap();
    assert_eq!(t2.urgency, 68);
    assert_eq!(records.list_feedback().unwrap()[0].item.task_id, "t2");
}
