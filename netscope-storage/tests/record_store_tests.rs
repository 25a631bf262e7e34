//! Record store behavior across namespaces.

use chrono::{TimeZone, Utc};
use netscope_core::{DeviceInventoryRecord, QueryLogRecord, ResponseBody, StorageError};
use netscope_storage::{RecordStore, StoreStats};
use netscope_test_utils::fixtures::{command_api_endpoint, fleet_endpoint, sample_catalog};
use netscope_test_utils::generators::{arb_endpoint, arb_query_record};
use proptest::prelude::*;
use tempfile::TempDir;

fn open_store() -> (RecordStore, TempDir) {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let store = RecordStore::open(dir.path(), 16).expect("store open should succeed");
    (store, dir)
}

fn record_at(endpoint_id: &str, nanos: i64, id: &str) -> QueryLogRecord {
    QueryLogRecord {
        id: id.to_string(),
        endpoint_id: endpoint_id.to_string(),
        method: "GET".to_string(),
        path: "/api/config/running".to_string(),
        body: None,
        status: 200,
        response: ResponseBody::Empty,
        timestamp: Utc.timestamp_nanos(nanos),
        elapsed_ms: 3,
        error: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn get_after_put_returns_equal_endpoint(endpoint in arb_endpoint()) {
        let (store, _dir) = open_store();
        store.save_endpoint(&endpoint).expect("save should succeed");
        prop_assert_eq!(store.endpoint(&endpoint.id).expect("get should succeed"), endpoint);
    }

    #[test]
    fn query_log_enumerates_chronologically(
        records in prop::collection::vec(arb_query_record("ep_prop".to_string()), 1..20)
    ) {
        let (store, _dir) = open_store();
        for record in &records {
            store.append_query_record(record).expect("append should succeed");
        }
        let log = store.query_log().expect("list should succeed");
        prop_assert_eq!(log.len(), records.len());
        for pair in log.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}

#[test]
fn query_log_ignores_insertion_order() {
    let (store, _dir) = open_store();
    store.append_query_record(&record_at("ep_a", 3_000, "req_3")).expect("append");
    store.append_query_record(&record_at("ep_a", 1_000, "req_1")).expect("append");
    store.append_query_record(&record_at("ep_a", 2_000, "req_2")).expect("append");

    let ids: Vec<String> = store
        .query_log()
        .expect("list should succeed")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["req_1", "req_2", "req_3"]);
}

#[test]
fn query_log_is_append_only() {
    let (store, _dir) = open_store();
    let record = record_at("ep_a", 1_000, "req_1");
    store.append_query_record(&record).expect("first append should succeed");
    let err = store
        .append_query_record(&record)
        .expect_err("duplicate key should be rejected");
    assert!(matches!(err, StorageError::Transaction { .. }));
    assert_eq!(store.query_log().expect("list").len(), 1);
}

#[test]
fn query_log_filters_by_endpoint() {
    let (store, _dir) = open_store();
    store.append_query_record(&record_at("ep_a", 1_000, "req_1")).expect("append");
    store.append_query_record(&record_at("ep_b", 2_000, "req_2")).expect("append");
    store.append_query_record(&record_at("ep_a", 3_000, "req_3")).expect("append");

    let for_a = store.query_log_for_endpoint("ep_a").expect("filter should succeed");
    assert_eq!(for_a.len(), 2);
    assert!(for_a.iter().all(|r| r.endpoint_id == "ep_a"));
    assert!(store.query_log_for_endpoint("ep_none").expect("filter").is_empty());
}

#[test]
fn inventory_is_independent_of_endpoints() {
    let (store, _dir) = open_store();
    let endpoint = command_api_endpoint("http://h");
    store.save_endpoint(&endpoint).expect("save endpoint");
    store
        .save_inventory_record(&DeviceInventoryRecord::mirror(&endpoint))
        .expect("save inventory");

    assert!(store.delete_endpoint(&endpoint.id).expect("delete endpoint"));
    let record = store
        .inventory_record(&endpoint.id)
        .expect("inventory record survives endpoint deletion");
    assert_eq!(record.name, endpoint.name);
}

#[test]
fn stats_count_every_namespace() {
    let (store, _dir) = open_store();
    let a = command_api_endpoint("http://a");
    let b = fleet_endpoint("https://b");
    store.save_endpoint(&a).expect("save");
    store.save_endpoint(&b).expect("save");
    store.save_inventory_record(&DeviceInventoryRecord::mirror(&a)).expect("save");
    store.save_catalog(&sample_catalog()).expect("save");
    store.append_query_record(&record_at(&a.id, 1, "req_1")).expect("append");

    assert_eq!(
        store.stats().expect("stats"),
        StoreStats {
            endpoints: 2,
            query_log: 1,
            catalog: 1,
            inventory: 1,
        }
    );
}

#[test]
fn catalog_snapshot_keeps_definitions() {
    let (store, _dir) = open_store();
    let catalog = sample_catalog();
    store.save_catalog(&catalog).expect("save");
    let loaded = store.catalog().expect("load");
    assert!(loaded.same_definitions(&catalog));
    assert_eq!(loaded.last_updated, catalog.last_updated);
}
