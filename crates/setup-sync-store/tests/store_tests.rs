use serde_json::json;
use setup_sync::{ModuleEntry, ModuleRegistry, RemoteRecord, SessionHandle, SetupOutcome};
use setup_sync_store::{LocalStore, RecordChange, SyncStatus};

fn record(value: serde_json::Value) -> RemoteRecord {
    serde_json::from_value(value).unwrap()
}

fn create_store() -> LocalStore {
    LocalStore::open_in_memory().unwrap()
}

#[test]
fn upsert_reports_insert_update_and_unchanged() {
    let store = create_store();

    let first = record(json!({"id": 1, "name": "Azure Interior"}));
    assert_eq!(
        store.upsert_record("res.partner", &first).unwrap(),
        RecordChange::Inserted
    );
    assert_eq!(
        store.upsert_record("res.partner", &first).unwrap(),
        RecordChange::Unchanged
    );

    let renamed = record(json!({"id": 1, "name": "Azure Interior Ltd"}));
    assert_eq!(
        store.upsert_record("res.partner", &renamed).unwrap(),
        RecordChange::Updated
    );
    assert_eq!(store.record_count("res.partner").unwrap(), 1);
}

#[test]
fn upsert_rejects_record_without_id() {
    let store = create_store();
    let result = store.upsert_record("res.partner", &record(json!({"name": "No Id"})));
    assert!(result.is_err());
}

#[test]
fn apply_records_counts_every_change() {
    let store = create_store();
    store
        .apply_records(
            "res.country",
            &[
                record(json!({"id": 1, "code": "BE"})),
                record(json!({"id": 2, "code": "FR"})),
                record(json!({"id": 3, "code": "NL"})),
            ],
        )
        .unwrap();

    let stats = store
        .apply_records(
            "res.country",
            &[
                record(json!({"id": 1, "code": "BE"})),
                record(json!({"id": 2, "code": "FRA"})),
                record(json!({"id": 4, "code": "DE"})),
                record(json!({"code": "??"})),
            ],
        )
        .unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.failed, 1);

    let codes: Vec<String> = store
        .records("res.country")
        .unwrap()
        .iter()
        .filter_map(|r| r.get_str("code").map(str::to_owned))
        .collect();
    assert_eq!(codes, vec!["BE", "FRA", "DE"]);
}

#[test]
fn apply_records_is_scoped_to_model() {
    let store = create_store();
    store
        .apply_records("res.partner", &[record(json!({"id": 1}))])
        .unwrap();
    store
        .apply_records("res.country", &[record(json!({"id": 1}))])
        .unwrap();

    let stats = store.apply_records("res.country", &[]).unwrap();
    assert_eq!(stats.deleted, 1);
    assert_eq!(store.record_count("res.partner").unwrap(), 1);
    assert_eq!(store.record_count("res.country").unwrap(), 0);
}

#[test]
fn model_status_tracks_freshness() {
    let store = create_store();
    assert_eq!(
        store.model_status("res.partner").unwrap(),
        SyncStatus::NeverSynced
    );

    store.record_model_sync("res.partner").unwrap();
    assert_eq!(
        store.model_status("res.partner").unwrap(),
        SyncStatus::Fresh { days_old: 0 }
    );

    let ten_days_ago = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        - 10 * 86400;
    store.set_last_synced_at("res.partner", ten_days_ago).unwrap();
    assert_eq!(
        store.model_status("res.partner").unwrap(),
        SyncStatus::Stale { days_old: 10 }
    );
}

#[tokio::test]
async fn registry_reads_module_model_in_id_order() {
    let store = create_store();
    store
        .apply_records(
            "ir.module.module",
            &[
                record(json!({"id": 5, "shortdesc": "Sales", "state": "uninstalled"})),
                record(json!({"id": 2, "shortdesc": "Discuss", "state": "installed"})),
            ],
        )
        .unwrap();

    let session = SessionHandle::new("admin", "prod").unwrap();
    let modules = store.modules(&session).await.unwrap();
    assert_eq!(
        modules,
        vec![
            ModuleEntry::new("Discuss", "installed"),
            ModuleEntry::new("Sales", "uninstalled"),
        ]
    );
}

#[tokio::test]
async fn registry_model_is_configurable() {
    let store = create_store().with_registry_model("x.addons");
    store
        .apply_records(
            "x.addons",
            &[record(json!({"id": 1, "name": "stock", "state": "installed"}))],
        )
        .unwrap();

    let session = SessionHandle::new("admin", "prod").unwrap();
    let modules = store.modules(&session).await.unwrap();
    assert_eq!(modules, vec![ModuleEntry::new("stock", "installed")]);
}

#[test]
fn setup_history_round_trips() {
    let store = create_store();
    assert!(store.last_setup("admin").unwrap().is_none());

    store
        .record_setup(
            "admin",
            &SetupOutcome::DependencyFailed(vec!["Sales".into(), "CRM".into()]),
        )
        .unwrap();
    let last = store.last_setup("admin").unwrap().unwrap();
    assert_eq!(last.outcome, "dependency_failed");
    assert_eq!(last.missing, vec!["Sales", "CRM"]);

    store.record_setup("admin", &SetupOutcome::Completed).unwrap();
    let last = store.last_setup("admin").unwrap().unwrap();
    assert_eq!(last.outcome, "completed");
    assert!(last.missing.is_empty());
}

#[test]
fn file_store_persists_between_opens() {
    let dir = std::env::temp_dir().join("setup-sync-store-test-persist");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("local.db");

    {
        let store = LocalStore::open(&path).unwrap();
        store
            .apply_records("res.partner", &[record(json!({"id": 1}))])
            .unwrap();
    }

    let reopened = LocalStore::open(&path).unwrap();
    assert_eq!(reopened.record_count("res.partner").unwrap(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}
