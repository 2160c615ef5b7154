//! Deep immutability verification for value graphs held on a managed heap.
//!
//! [`object_model`] provides the heap, its handles and the freeze/seal
//! integrity levels; [`immutability`] walks a value graph and reports every
//! composite that is not frozen, with the path that reaches it.

#![forbid(unsafe_code)]

pub mod immutability;
pub mod object_model;

pub use immutability::{
    CheckResult, ImmutabilityError, ImmutabilityVerifier, PathSegment, ValuePath, VerifierConfig,
    VerifierConfigError, VerifierEvent, Violation, ViolationReason, assert_immutable,
    check_immutability, is_deep_immutable,
};
pub use object_model::{JsValue, JsonFreeze, ObjectError, ObjectHandle, ObjectHeap, ObjectKind};
