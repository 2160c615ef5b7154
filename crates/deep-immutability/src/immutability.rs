//! Deep immutability verification over the managed object heap.
//!
//! A value is deeply immutable when it and every composite reachable from it
//! carries the frozen marker. Descent follows each container's own iteration
//! rule:
//!
//! - arrays by ascending index (`[i]`)
//! - maps entry by entry, key then value (`<key:i>`, `<value:i>`)
//! - sets in insertion order (`<item:i>`)
//! - plain records by own enumerable field (field name)
//!
//! Dates are leaves and are exempt from the marker rule by default. An
//! unfrozen composite yields one violation and its children are not visited;
//! sibling subtrees are still checked, so a single traversal can report many
//! violations. Identity-keyed visitation makes the walk terminate on cyclic
//! graphs and visit shared substructure once.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object_model::{HeapObject, JsValue, ObjectHandle, ObjectHeap, ObjectKind};

pub const IMMUTABILITY_COMPONENT: &str = "immutability_verifier";
pub const NOT_IMMUTABLE_ERROR_CODE: &str = "FE-IMMUT-0001";

const ROOT_PATH: &str = "root";
const PATH_SEPARATOR: &str = ".";

// ---------------------------------------------------------------------------
// PathSegment / ValuePath
// ---------------------------------------------------------------------------

/// One step from a container to a child.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Array element.
    Index(usize),
    /// Key of the i-th map entry.
    MapKey(usize),
    /// Value of the i-th map entry.
    MapValue(usize),
    /// i-th set element.
    SetItem(usize),
    /// Record field.
    Field(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::MapKey(i) => write!(f, "<key:{i}>"),
            Self::MapValue(i) => write!(f, "<value:{i}>"),
            Self::SetItem(i) => write!(f, "<item:{i}>"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// Location of a node relative to the checked root.
///
/// Renders as its segments joined by `.`, or `root` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl From<Vec<PathSegment>> for ValuePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(ROOT_PATH);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(PATH_SEPARATOR)?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Violation / CheckResult
// ---------------------------------------------------------------------------

/// Why a node failed the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    NotFrozen,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFrozen => f.write_str("Object is not frozen"),
        }
    }
}

/// A composite that failed the marker check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: ValuePath,
    pub value: JsValue,
    pub reason: ViolationReason,
}

/// Outcome of one top-level check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub is_immutable: bool,
    /// Depth-first, left-to-right discovery order.
    pub violations: Vec<Violation>,
    /// Distinct composites entered during the traversal.
    pub objects_visited: usize,
}

impl CheckResult {
    pub fn first_violation(&self) -> Option<&Violation> {
        self.violations.first()
    }

    /// Convert to the assertion outcome, keeping only the first violation.
    pub fn into_assertion(self) -> Result<(), ImmutabilityError> {
        match self.violations.into_iter().next() {
            None => Ok(()),
            Some(Violation {
                path,
                value,
                reason,
            }) => Err(ImmutabilityError::NotImmutable {
                path,
                value,
                reason,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ImmutabilityError
// ---------------------------------------------------------------------------

/// Raised by `assert_immutable`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ImmutabilityError {
    #[error("Value is not immutable at path \"{path}\": {reason}")]
    NotImmutable {
        path: ValuePath,
        value: JsValue,
        reason: ViolationReason,
    },
}

impl ImmutabilityError {
    pub fn stable_code(&self) -> &'static str {
        match self {
            Self::NotImmutable { .. } => NOT_IMMUTABLE_ERROR_CODE,
        }
    }

    pub fn path(&self) -> &ValuePath {
        match self {
            Self::NotImmutable { path, .. } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// VerifierConfig
// ---------------------------------------------------------------------------

/// Verifier policy knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Treat dates as immutable leaves regardless of their marker. When off,
    /// an unfrozen date is a violation (dates are never descended into).
    pub exempt_time_leaves: bool,
    /// Component name stamped on audit events.
    pub component: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            exempt_time_leaves: true,
            component: IMMUTABILITY_COMPONENT.to_string(),
        }
    }
}

impl VerifierConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(input: &str) -> Result<Self, VerifierConfigError> {
        let config: Self =
            serde_json::from_str(input).map_err(|error| VerifierConfigError::Parse {
                detail: error.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VerifierConfigError> {
        if self.component.trim().is_empty() {
            return Err(VerifierConfigError::EmptyComponent);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierConfigError {
    #[error("invalid verifier config: {detail}")]
    Parse { detail: String },
    #[error("verifier config `component` must not be empty")]
    EmptyComponent,
}

// ---------------------------------------------------------------------------
// ValueShape — one classification per node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Node<'h> {
    handle: ObjectHandle,
    object: &'h HeapObject,
}

#[derive(Debug, Clone, Copy)]
enum ValueShape<'h> {
    Primitive,
    /// Handle with no object behind it; it cannot report a marker.
    Unresolved(ObjectHandle),
    TimeLeaf(Node<'h>),
    Sequence(Node<'h>),
    Mapping(Node<'h>, &'h [(JsValue, JsValue)]),
    UniqueCollection(Node<'h>, &'h [JsValue]),
    Record(Node<'h>),
}

fn classify<'h>(heap: &'h ObjectHeap, value: &JsValue) -> ValueShape<'h> {
    let JsValue::Object(handle) = value else {
        return ValueShape::Primitive;
    };
    let Ok(object) = heap.get(*handle) else {
        return ValueShape::Unresolved(*handle);
    };
    let node = Node {
        handle: *handle,
        object,
    };
    match &object.kind {
        ObjectKind::Ordinary => ValueShape::Record(node),
        ObjectKind::Array => ValueShape::Sequence(node),
        ObjectKind::Map { entries } => ValueShape::Mapping(node, entries),
        ObjectKind::Set { items } => ValueShape::UniqueCollection(node, items),
        ObjectKind::Date { .. } => ValueShape::TimeLeaf(node),
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

struct Traversal<'h> {
    heap: &'h ObjectHeap,
    config: &'h VerifierConfig,
    visited: HashSet<ObjectHandle>,
    path: Vec<PathSegment>,
    violations: Vec<Violation>,
}

impl<'h> Traversal<'h> {
    fn new(heap: &'h ObjectHeap, config: &'h VerifierConfig) -> Self {
        Self {
            heap,
            config,
            visited: HashSet::new(),
            path: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn visit(&mut self, value: &JsValue) {
        let shape = classify(self.heap, value);
        let node = match shape {
            ValueShape::Primitive => return,
            ValueShape::Unresolved(handle) => {
                if self.visited.insert(handle) {
                    self.record(value);
                }
                return;
            }
            ValueShape::TimeLeaf(node)
            | ValueShape::Sequence(node)
            | ValueShape::Mapping(node, _)
            | ValueShape::UniqueCollection(node, _)
            | ValueShape::Record(node) => node,
        };

        if !self.visited.insert(node.handle) {
            return;
        }
        if matches!(shape, ValueShape::TimeLeaf(_)) && self.config.exempt_time_leaves {
            return;
        }
        if !node.object.is_frozen() {
            self.record(value);
            return;
        }

        match shape {
            ValueShape::Sequence(node) => {
                for (index, element) in node.object.array_entries() {
                    self.descend(PathSegment::Index(index as usize), element);
                }
            }
            ValueShape::Mapping(_, entries) => {
                for (i, (key, entry_value)) in entries.iter().enumerate() {
                    self.descend(PathSegment::MapKey(i), key);
                    self.descend(PathSegment::MapValue(i), entry_value);
                }
            }
            ValueShape::UniqueCollection(_, items) => {
                for (i, item) in items.iter().enumerate() {
                    self.descend(PathSegment::SetItem(i), item);
                }
            }
            ValueShape::Record(node) => {
                for (name, field_value) in node.object.own_enumerable_entries() {
                    self.descend(PathSegment::Field(name), &field_value);
                }
            }
            ValueShape::TimeLeaf(_) | ValueShape::Primitive | ValueShape::Unresolved(_) => {}
        }
    }

    fn descend(&mut self, segment: PathSegment, child: &JsValue) {
        self.path.push(segment);
        self.visit(child);
        self.path.pop();
    }

    fn record(&mut self, value: &JsValue) {
        self.violations.push(Violation {
            path: ValuePath::from(self.path.clone()),
            value: value.clone(),
            reason: ViolationReason::NotFrozen,
        });
    }

    fn finish(self) -> CheckResult {
        CheckResult {
            is_immutable: self.violations.is_empty(),
            objects_visited: self.visited.len(),
            violations: self.violations,
        }
    }
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

/// Run the full check and return every violation found.
pub fn check_immutability(
    heap: &ObjectHeap,
    value: &JsValue,
    config: &VerifierConfig,
) -> CheckResult {
    let mut traversal = Traversal::new(heap, config);
    traversal.visit(value);
    traversal.finish()
}

/// Is `value` deeply immutable under the default policy?
pub fn is_deep_immutable(heap: &ObjectHeap, value: &JsValue) -> bool {
    check_immutability(heap, value, &VerifierConfig::default()).is_immutable
}

/// Fail with the first violation if `value` is not deeply immutable.
pub fn assert_immutable(heap: &ObjectHeap, value: &JsValue) -> Result<(), ImmutabilityError> {
    check_immutability(heap, value, &VerifierConfig::default()).into_assertion()
}

// ---------------------------------------------------------------------------
// VerifierEvent — structured audit event
// ---------------------------------------------------------------------------

/// Structured event emitted once per verifier call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierEvent {
    pub trace_id: String,
    pub component: String,
    /// `deep_immutability_check` or `immutability_assertion`.
    pub event: String,
    /// `immutable` or `not_immutable`.
    pub outcome: String,
    pub error_code: Option<String>,
    pub violation_count: usize,
    pub objects_visited: usize,
    pub first_violation_path: Option<String>,
}

// ---------------------------------------------------------------------------
// ImmutabilityVerifier — configured verifier with an audit trail
// ---------------------------------------------------------------------------

/// Verifier bound to a config that records one audit event per call.
#[derive(Debug, Default)]
pub struct ImmutabilityVerifier {
    config: VerifierConfig,
    events: Vec<VerifierEvent>,
    event_counts: BTreeMap<String, u64>,
}

impl ImmutabilityVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            events: Vec::new(),
            event_counts: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Full check with every violation.
    pub fn check(&mut self, heap: &ObjectHeap, value: &JsValue, trace_id: &str) -> CheckResult {
        let result = check_immutability(heap, value, &self.config);
        self.emit("deep_immutability_check", trace_id, &result);
        result
    }

    pub fn is_deep_immutable(
        &mut self,
        heap: &ObjectHeap,
        value: &JsValue,
        trace_id: &str,
    ) -> bool {
        self.check(heap, value, trace_id).is_immutable
    }

    pub fn assert_immutable(
        &mut self,
        heap: &ObjectHeap,
        value: &JsValue,
        trace_id: &str,
    ) -> Result<(), ImmutabilityError> {
        let result = check_immutability(heap, value, &self.config);
        self.emit("immutability_assertion", trace_id, &result);
        result.into_assertion()
    }

    /// Drain accumulated events.
    pub fn drain_events(&mut self) -> Vec<VerifierEvent> {
        std::mem::take(&mut self.events)
    }

    /// Per-outcome counters, keyed `<event>:<outcome>`.
    pub fn event_counts(&self) -> &BTreeMap<String, u64> {
        &self.event_counts
    }

    // -- Internal --

    fn emit(&mut self, event: &str, trace_id: &str, result: &CheckResult) {
        let outcome = if result.is_immutable {
            "immutable"
        } else {
            "not_immutable"
        };
        *self
            .event_counts
            .entry(format!("{event}:{outcome}"))
            .or_insert(0) += 1;
        self.events.push(VerifierEvent {
            trace_id: trace_id.to_string(),
            component: self.config.component.clone(),
            event: event.to_string(),
            outcome: outcome.to_string(),
            error_code: (!result.is_immutable).then(|| NOT_IMMUTABLE_ERROR_CODE.to_string()),
            violation_count: result.violations.len(),
            objects_visited: result.objects_visited,
            first_violation_path: result.first_violation().map(|v| v.path.to_string()),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
