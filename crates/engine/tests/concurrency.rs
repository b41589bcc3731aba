use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait};
use uuid::Uuid;

use engine::{DepositCmd, Engine, EngineError, TransferCmd, WithdrawCmd};
use migration::MigratorTrait;

async fn engine_with_file_db() -> (Arc<Engine>, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (Arc::new(engine), db, path)
}

async fn seed_account(db: &DatabaseConnection, id: &str, username: &str, balance_minor: i64) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO accounts (id, username, balance_minor, is_frozen, created_at) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            id.into(),
            username.into(),
            balance_minor.into(),
            false.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

async fn balance_of(db: &DatabaseConnection, id: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT balance_minor FROM accounts WHERE id = ?",
            vec![id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "balance_minor").unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_jointly_respect_the_daily_cap() {
    let (engine, db, path) = engine_with_file_db().await;
    seed_account(&db, "A-100", "alice", 100_000_00).await;
    seed_account(&db, "B-200", "bob", 10_000_00).await;

    // 10 transfers of 6000.00 against a 50 000.00 daily cap: exactly 8 fit.
    let now = Utc::now();
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let engine = engine.clone();
        tasks.spawn(async move {
            loop {
                let cmd = TransferCmd::new("A-100", "bob", 6_000_00, now);
                match engine.transfer(cmd).await {
                    Err(EngineError::Busy) => continue,
                    other => break other,
                }
            }
        });
    }

    let mut settled = 0;
    let mut capped = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => settled += 1,
            Err(EngineError::DailyCapExceeded(_)) => capped += 1,
            Err(err) => panic!("unexpected transfer failure: {err}"),
        }
    }

    assert_eq!(settled, 8);
    assert_eq!(capped, 2);
    assert_eq!(balance_of(&db, "A-100").await, 100_000_00 - 48_000_00);
    assert_eq!(balance_of(&db, "B-200").await, 10_000_00 + 48_000_00);

    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposing_transfers_complete_without_deadlock() {
    let (engine, db, path) = engine_with_file_db().await;
    seed_account(&db, "A-100", "alice", 10_000_00).await;
    seed_account(&db, "B-200", "bob", 10_000_00).await;

    let now = Utc::now();
    let run = async {
        let mut tasks = tokio::task::JoinSet::new();
        for (sender, recipient, amount) in
            [("A-100", "bob", 2_000_00), ("B-200", "alice", 3_000_00)]
        {
            let engine = engine.clone();
            tasks.spawn(async move {
                loop {
                    let cmd = TransferCmd::new(sender, recipient, amount, now);
                    match engine.transfer(cmd).await {
                        Err(EngineError::Busy) => continue,
                        other => break other,
                    }
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }
    };
    // Bounded: a lock-ordering regression shows up as a timeout, not a hang.
    tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("transfers deadlocked");

    assert_eq!(balance_of(&db, "A-100").await, 11_000_00);
    assert_eq!(balance_of(&db, "B-200").await, 9_000_00);

    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_account_operations_never_lose_updates() {
    let (engine, db, path) = engine_with_file_db().await;
    seed_account(&db, "A-100", "alice", 0).await;

    let now = Utc::now();
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let engine = engine.clone();
        tasks.spawn(async move {
            loop {
                match engine.deposit(DepositCmd::new("A-100", 10_00, now)).await {
                    Err(EngineError::Busy) => continue,
                    other => break other,
                }
            }
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(balance_of(&db, "A-100").await, 100_00);

    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn a_contended_lock_times_out_as_busy() {
    let (_engine, db, path) = engine_with_file_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .lock_wait(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    seed_account(&db, "A-100", "alice", 5_000_00).await;

    // Hold the writer side of the ledger open from another connection.
    let blocker = db.begin().await.unwrap();
    let backend = db.get_database_backend();
    blocker
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE accounts SET balance_minor = balance_minor WHERE id = ?",
            vec!["A-100".into()],
        ))
        .await
        .unwrap();

    let err = engine
        .withdraw(WithdrawCmd::new("A-100", 100_00, Utc::now()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Busy);

    drop(blocker);
    drop(db);
    let _ = std::fs::remove_file(path);
}
