use std::fs;

use chrono::{TimeZone, Utc};
use deep_immutability::{
    ImmutabilityVerifier, JsValue, JsonFreeze, ObjectHeap, VerifierConfig, assert_immutable,
    is_deep_immutable,
};

const TRACE_ID: &str = "immutability-demo";

fn main() {
    if let Err(error) = run(std::env::args().skip(1).collect()) {
        eprintln!("{error}");
        std::process::exit(2);
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    if args.is_empty() {
        return Err(usage());
    }

    match args[0].as_str() {
        "demo" => run_demo(),
        "check" => run_check(&args[1..]),
        "help" | "--help" | "-h" => {
            println!("{}", usage());
            Ok(())
        }
        other => Err(format!("unknown subcommand '{other}'\n\n{}", usage())),
    }
}

fn usage() -> String {
    [
        "immutability_demo usage:",
        "  immutability_demo demo",
        "  immutability_demo check --input <path> [--freeze] [--config <path>] [--summary]",
    ]
    .join("\n")
}

fn run_demo() -> Result<(), String> {
    let mut heap = ObjectHeap::new();

    let data = build_sample(&mut heap, false).map_err(|error| error.to_string())?;
    println!(
        "Original data is immutable: {}",
        is_deep_immutable(&heap, &data)
    );

    let frozen = build_sample(&mut heap, true).map_err(|error| error.to_string())?;
    println!(
        "Frozen data is immutable: {}",
        is_deep_immutable(&heap, &frozen)
    );

    match assert_immutable(&heap, &frozen) {
        Ok(()) => println!("Assertion passed"),
        Err(error) => println!("Assertion failed: {error}"),
    }

    let mutable = heap
        .alloc_record([("mutable", JsValue::Bool(true))])
        .map_err(|error| error.to_string())?;
    if let Err(error) = assert_immutable(&heap, &JsValue::Object(mutable)) {
        println!("Expected error: {error}");
    }
    Ok(())
}

/// Users, a metadata map, a tag set and a creation date. The date is never
/// frozen; it is exempt from the marker rule.
fn build_sample(
    heap: &mut ObjectHeap,
    freeze: bool,
) -> Result<JsValue, deep_immutability::ObjectError> {
    let mut frozen = Vec::new();

    let mut users = Vec::new();
    for (id, name, theme) in [(1, "Alice", "dark"), (2, "Bob", "light")] {
        let settings = heap.alloc_record([("theme", JsValue::from(theme))])?;
        let user = heap.alloc_record([
            ("id", JsValue::Int(id)),
            ("name", JsValue::from(name)),
            ("settings", JsValue::Object(settings)),
        ])?;
        frozen.extend([settings, user]);
        users.push(JsValue::Object(user));
    }
    let users = heap.alloc_array(users)?;
    let metadata = heap.alloc_map(vec![(JsValue::from("version"), JsValue::from("1.0.0"))])?;
    let tags = heap.alloc_set(vec![JsValue::from("production"), JsValue::from("stable")])?;
    let created_at = heap.alloc_date(
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
            .single()
            .unwrap_or_default(),
    )?;
    let root = heap.alloc_record([
        ("users", JsValue::Object(users)),
        ("metadata", JsValue::Object(metadata)),
        ("tags", JsValue::Object(tags)),
        ("created_at", JsValue::Object(created_at)),
    ])?;
    frozen.extend([users, metadata, tags, root]);

    if freeze {
        for handle in frozen {
            heap.freeze(handle)?;
        }
    }
    Ok(JsValue::Object(root))
}

fn run_check(args: &[String]) -> Result<(), String> {
    let mut input_path: Option<&str> = None;
    let mut config_path: Option<&str> = None;
    let mut freeze = JsonFreeze::None;
    let mut summary = false;

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--input" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--input requires a path".to_string())?;
                input_path = Some(value);
            }
            "--config" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--config requires a path".to_string())?;
                config_path = Some(value);
            }
            "--freeze" => freeze = JsonFreeze::Deep,
            "--summary" => summary = true,
            flag => return Err(format!("unknown flag for check: {flag}")),
        }
        index += 1;
    }

    let path = input_path.ok_or_else(|| "missing required --input <path>".to_string())?;
    let config = match config_path {
        Some(config_path) => {
            let raw = fs::read_to_string(config_path)
                .map_err(|error| format!("failed to read config {config_path}: {error}"))?;
            VerifierConfig::from_json(&raw).map_err(|error| error.to_string())?
        }
        None => VerifierConfig::default(),
    };

    let raw =
        fs::read_to_string(path).map_err(|error| format!("failed to read {path}: {error}"))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|error| format!("failed to parse {path} as JSON: {error}"))?;

    let mut heap = ObjectHeap::new();
    let root = heap
        .alloc_json(&json, freeze)
        .map_err(|error| format!("failed to load {path}: {error}"))?;

    let mut verifier = ImmutabilityVerifier::new(config);
    let result = verifier.check(&heap, &root, TRACE_ID);

    if summary {
        println!(
            "immutable={} violations={} objects_visited={}",
            result.is_immutable,
            result.violations.len(),
            result.objects_visited
        );
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&result)
                .map_err(|error| format!("failed to encode check result: {error}"))?
        );
    }

    result.into_assertion().map_err(|error| error.to_string())
}
