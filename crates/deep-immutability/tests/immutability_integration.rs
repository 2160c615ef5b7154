//! Integration tests for deep immutability verification.
//!
//! Covers primitives, fresh and frozen composites, every container kind,
//! cycle safety, aliasing, date exemption, assertion messages and the
//! audited verifier.

#![forbid(unsafe_code)]

use chrono::{TimeZone, Utc};
use deep_immutability::object_model::{PropertyKey, SymbolId};
use deep_immutability::{
    ImmutabilityError, ImmutabilityVerifier, JsValue, JsonFreeze, ObjectHandle, ObjectHeap,
    PathSegment, VerifierConfig, VerifierEvent, ViolationReason, assert_immutable,
    check_immutability, is_deep_immutable,
};

fn obj(handle: ObjectHandle) -> JsValue {
    JsValue::Object(handle)
}

fn frozen_record(heap: &mut ObjectHeap, fields: Vec<(&str, JsValue)>) -> ObjectHandle {
    let handle = heap.alloc_record(fields).unwrap();
    heap.freeze(handle).unwrap();
    handle
}

fn violation_paths(heap: &ObjectHeap, value: &JsValue) -> Vec<String> {
    check_immutability(heap, value, &VerifierConfig::default())
        .violations
        .iter()
        .map(|v| v.path.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Primitives and fresh composites
// ---------------------------------------------------------------------------

#[test]
fn primitives_are_deeply_immutable() {
    let heap = ObjectHeap::new();
    for value in [
        JsValue::Int(42),
        JsValue::Str("hello".to_string()),
        JsValue::Bool(false),
        JsValue::Null,
        JsValue::Undefined,
        JsValue::Symbol(SymbolId(1)),
    ] {
        assert!(is_deep_immutable(&heap, &value));
        assert!(assert_immutable(&heap, &value).is_ok());
    }
}

#[test]
fn fresh_composites_are_mutable() {
    let mut heap = ObjectHeap::new();
    let empty_record = heap.alloc_plain().unwrap();
    let empty_array = heap.alloc_array(vec![]).unwrap();
    let one_field = heap.alloc_record([("a", JsValue::Int(1))]).unwrap();
    assert!(!is_deep_immutable(&heap, &obj(empty_record)));
    assert!(!is_deep_immutable(&heap, &obj(empty_array)));
    assert!(!is_deep_immutable(&heap, &obj(one_field)));
}

#[test]
fn frozen_nested_records_and_arrays() {
    let mut heap = ObjectHeap::new();
    let inner = frozen_record(&mut heap, vec![("b", JsValue::Int(1))]);
    let outer = frozen_record(&mut heap, vec![("a", obj(inner))]);
    assert!(is_deep_immutable(&heap, &obj(outer)));

    let element = frozen_record(&mut heap, vec![("a", JsValue::Int(1))]);
    let array = heap.alloc_array(vec![obj(element)]).unwrap();
    heap.freeze(array).unwrap();
    assert!(is_deep_immutable(&heap, &obj(array)));
}

#[test]
fn sealed_is_not_frozen() {
    let mut heap = ObjectHeap::new();
    let record = heap.alloc_record([("a", JsValue::Int(1))]).unwrap();
    heap.seal(record).unwrap();
    assert!(!is_deep_immutable(&heap, &obj(record)));
}

// ---------------------------------------------------------------------------
// Maps and sets
// ---------------------------------------------------------------------------

#[test]
fn frozen_map_with_frozen_value() {
    let mut heap = ObjectHeap::new();
    let value = frozen_record(&mut heap, vec![("value", JsValue::Int(1))]);
    let map = heap.alloc_map(vec![(JsValue::from("key"), obj(value))]).unwrap();
    heap.freeze(map).unwrap();
    assert!(is_deep_immutable(&heap, &obj(map)));
}

#[test]
fn frozen_map_with_unfrozen_value_reports_value_path() {
    let mut heap = ObjectHeap::new();
    let key = frozen_record(&mut heap, vec![("b", JsValue::Int(1))]);
    let value = heap.alloc_record([("c", JsValue::Int(2))]).unwrap();
    let map = heap.alloc_map(vec![(obj(key), obj(value))]).unwrap();
    heap.freeze(map).unwrap();

    assert!(!is_deep_immutable(&heap, &obj(map)));
    let result = check_immutability(&heap, &obj(map), &VerifierConfig::default());
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].path.to_string(), "<value:0>");
    assert_eq!(
        result.violations[0].path.segments(),
        &[PathSegment::MapValue(0)]
    );
    assert_eq!(result.violations[0].value, obj(value));
}

#[test]
fn frozen_set_with_frozen_record() {
    let mut heap = ObjectHeap::new();
    let item = frozen_record(&mut heap, vec![("item", JsValue::Int(1))]);
    let set = heap.alloc_set(vec![obj(item)]).unwrap();
    heap.freeze(set).unwrap();
    assert!(is_deep_immutable(&heap, &obj(set)));
}

#[test]
fn set_item_paths_follow_insertion_order() {
    let mut heap = ObjectHeap::new();
    let good = frozen_record(&mut heap, vec![]);
    let bad = heap.alloc_plain().unwrap();
    let set = heap.alloc_set(vec![obj(good), JsValue::Int(7), obj(bad)]).unwrap();
    heap.freeze(set).unwrap();
    assert_eq!(violation_paths(&heap, &obj(set)), vec!["<item:2>"]);
}

#[test]
fn unfrozen_map_is_not_descended() {
    let mut heap = ObjectHeap::new();
    let value = heap.alloc_plain().unwrap();
    let map = heap.alloc_map(vec![(JsValue::Int(1), obj(value))]).unwrap();
    assert_eq!(violation_paths(&heap, &obj(map)), vec!["root"]);
}

#[test]
fn entries_added_after_freeze_are_still_checked() {
    let mut heap = ObjectHeap::new();
    let map = heap.alloc_map(vec![]).unwrap();
    heap.freeze(map).unwrap();
    assert!(is_deep_immutable(&heap, &obj(map)));

    let late = heap.alloc_plain().unwrap();
    heap.map_set(map, JsValue::from("late"), obj(late)).unwrap();
    assert_eq!(violation_paths(&heap, &obj(map)), vec!["<value:0>"]);
}

// ---------------------------------------------------------------------------
// Cycles and aliasing
// ---------------------------------------------------------------------------

#[test]
fn frozen_self_reference_is_immutable() {
    let mut heap = ObjectHeap::new();
    let record = heap.alloc_plain().unwrap();
    heap.set_property(record, PropertyKey::from("self"), obj(record))
        .unwrap();
    heap.freeze(record).unwrap();
    assert!(is_deep_immutable(&heap, &obj(record)));
}

#[test]
fn mutual_cycle_through_containers_terminates() {
    let mut heap = ObjectHeap::new();
    let array = heap.alloc_array(vec![]).unwrap();
    let record = heap.alloc_record([("items", obj(array))]).unwrap();
    heap.array_push(array, obj(record)).unwrap();
    heap.freeze(array).unwrap();
    heap.freeze(record).unwrap();
    let result = check_immutability(&heap, &obj(record), &VerifierConfig::default());
    assert!(result.is_immutable);
    assert_eq!(result.objects_visited, 2);
}

#[test]
fn cycle_with_unfrozen_member_reports_it_once() {
    let mut heap = ObjectHeap::new();
    let a = heap.alloc_plain().unwrap();
    let b = heap.alloc_record([("back", obj(a))]).unwrap();
    heap.set_property(a, PropertyKey::from("next"), obj(b)).unwrap();
    heap.freeze(a).unwrap();
    assert_eq!(violation_paths(&heap, &obj(a)), vec!["next"]);
}

#[test]
fn distinct_but_equal_objects_tracked_separately() {
    let mut heap = ObjectHeap::new();
    let left = heap.alloc_record([("v", JsValue::Int(1))]).unwrap();
    let right = heap.alloc_record([("v", JsValue::Int(1))]).unwrap();
    assert_eq!(heap.get(left).unwrap(), heap.get(right).unwrap());
    let root = frozen_record(&mut heap, vec![("left", obj(left)), ("right", obj(right))]);
    assert_eq!(violation_paths(&heap, &obj(root)), vec!["left", "right"]);
}

#[test]
fn aliased_substructure_visited_once() {
    let mut heap = ObjectHeap::new();
    let shared = frozen_record(&mut heap, vec![("v", JsValue::Int(1))]);
    let elements = vec![obj(shared); 50];
    let array = heap.alloc_array(elements).unwrap();
    heap.freeze(array).unwrap();
    let result = check_immutability(&heap, &obj(array), &VerifierConfig::default());
    assert!(result.is_immutable);
    assert_eq!(result.objects_visited, 2);
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[test]
fn unfrozen_date_inside_frozen_record_is_immutable() {
    let mut heap = ObjectHeap::new();
    let date = heap.alloc_date(Utc.with_ymd_and_hms(2023, 11, 5, 8, 0, 0).unwrap()).unwrap();
    let record = frozen_record(&mut heap, vec![("when", obj(date))]);
    assert!(!heap.is_frozen(date).unwrap());
    assert!(is_deep_immutable(&heap, &obj(record)));
}

#[test]
fn unfrozen_date_root_is_immutable() {
    let mut heap = ObjectHeap::new();
    let date = heap.alloc_date(Utc.with_ymd_and_hms(2023, 11, 5, 8, 0, 0).unwrap()).unwrap();
    assert!(is_deep_immutable(&heap, &obj(date)));
}

// ---------------------------------------------------------------------------
// Assertion messages
// ---------------------------------------------------------------------------

#[test]
fn assertion_reports_root_for_unfrozen_root() {
    let mut heap = ObjectHeap::new();
    let inner = heap.alloc_record([("mutable", JsValue::Bool(true))]).unwrap();
    let root = heap.alloc_record([("nested", obj(inner))]).unwrap();
    let err = assert_immutable(&heap, &obj(root)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Value is not immutable at path \"root\": Object is not frozen"
    );
}

#[test]
fn assertion_reports_first_of_many_violations() {
    let mut heap = ObjectHeap::new();
    let settings = heap.alloc_record([("theme", JsValue::from("dark"))]).unwrap();
    let user = frozen_record(&mut heap, vec![("settings", obj(settings))]);
    let other = heap.alloc_plain().unwrap();
    let users = heap.alloc_array(vec![obj(user), obj(other)]).unwrap();
    heap.freeze(users).unwrap();
    let root = frozen_record(&mut heap, vec![("users", obj(users))]);

    assert_eq!(
        violation_paths(&heap, &obj(root)),
        vec!["users.[0].settings", "users.[1]"]
    );
    let err = assert_immutable(&heap, &obj(root)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Value is not immutable at path \"users.[0].settings\": Object is not frozen"
    );
    assert!(matches!(
        err,
        ImmutabilityError::NotImmutable {
            reason: ViolationReason::NotFrozen,
            ..
        }
    ));
}

#[test]
fn repeated_checks_are_idempotent() {
    let mut heap = ObjectHeap::new();
    let inner = heap.alloc_plain().unwrap();
    let root = frozen_record(&mut heap, vec![("inner", obj(inner))]);
    let first = check_immutability(&heap, &obj(root), &VerifierConfig::default());
    let second = check_immutability(&heap, &obj(root), &VerifierConfig::default());
    assert_eq!(first, second);
    assert_eq!(
        is_deep_immutable(&heap, &obj(root)),
        is_deep_immutable(&heap, &obj(root))
    );
}

#[test]
fn check_does_not_modify_heap() {
    let mut heap = ObjectHeap::new();
    let inner = heap.alloc_plain().unwrap();
    let root = frozen_record(&mut heap, vec![("inner", obj(inner))]);
    let before = heap.clone();
    let _ = assert_immutable(&heap, &obj(root));
    assert_eq!(heap, before);
}

// ---------------------------------------------------------------------------
// JSON-loaded graphs
// ---------------------------------------------------------------------------

#[test]
fn deep_frozen_json_is_immutable() {
    let mut heap = ObjectHeap::new();
    let json = serde_json::json!({
        "users": [{ "id": 1, "settings": { "theme": "dark" } }],
        "tags": ["a", "b"]
    });
    let root = heap.alloc_json(&json, JsonFreeze::Deep).unwrap();
    assert!(is_deep_immutable(&heap, &root));

    let mut heap = ObjectHeap::new();
    let root = heap.alloc_json(&json, JsonFreeze::None).unwrap();
    assert!(!is_deep_immutable(&heap, &root));
}

#[test]
fn json_violations_follow_document_field_order() {
    let mut heap = ObjectHeap::new();
    let json: serde_json::Value =
        serde_json::from_str(r#"{"zeta": {"n": 1}, "alpha": {"n": 2}}"#).unwrap();
    let root = heap.alloc_json(&json, JsonFreeze::None).unwrap();
    let root_handle = root.as_object().unwrap();
    heap.freeze(root_handle).unwrap();
    assert_eq!(violation_paths(&heap, &root), vec!["zeta", "alpha"]);
}

#[test]
fn sparse_frozen_array_with_huge_index() {
    let mut heap = ObjectHeap::new();
    let element = frozen_record(&mut heap, vec![("v", JsValue::Int(1))]);
    let array = heap.alloc_array(vec![]).unwrap();
    heap.set_property(array, PropertyKey::from(4_000_000_000u32), obj(element))
        .unwrap();
    heap.freeze(array).unwrap();
    let result = check_immutability(&heap, &obj(array), &VerifierConfig::default());
    assert!(result.is_immutable);
    assert_eq!(result.objects_visited, 2);
}

// ---------------------------------------------------------------------------
// ImmutabilityVerifier
// ---------------------------------------------------------------------------

#[test]
fn verifier_events_serialize() {
    let mut heap = ObjectHeap::new();
    let bad = heap.alloc_plain().unwrap();
    let root = frozen_record(&mut heap, vec![("bad", obj(bad))]);
    let mut verifier = ImmutabilityVerifier::new(VerifierConfig {
        component: "ingest_guard".to_string(),
        ..VerifierConfig::default()
    });
    let result = verifier.check(&heap, &obj(root), "trace-42");
    assert!(!result.is_immutable);

    let events = verifier.drain_events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.component, "ingest_guard");
    assert_eq!(event.outcome, "not_immutable");
    assert_eq!(event.violation_count, 1);
    assert_eq!(event.objects_visited, 2);
    assert_eq!(event.first_violation_path.as_deref(), Some("bad"));

    let json = serde_json::to_string(event).unwrap();
    let restored: VerifierEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, event);
}

#[test]
fn verifier_respects_time_leaf_policy() {
    let mut heap = ObjectHeap::new();
    let date = heap.alloc_date(Utc.with_ymd_and_hms(2022, 2, 2, 2, 2, 2).unwrap()).unwrap();
    let root = frozen_record(&mut heap, vec![("at", obj(date))]);
    let config = VerifierConfig::from_json(r#"{"exempt_time_leaves": false}"#).unwrap();
    let mut verifier = ImmutabilityVerifier::new(config);
    let err = verifier
        .assert_immutable(&heap, &obj(root), "trace-date")
        .unwrap_err();
    assert_eq!(err.path().to_string(), "at");
    assert_eq!(
        verifier.event_counts().get("immutability_assertion:not_immutable"),
        Some(&1)
    );
}
