//! Integration tests for error classification and context
//!
//! Tests that errors raised by the storage layer carry the right kind and
//! the frames added on the way out.

use fabula_foundation::{Error, ErrorKind, Fact, Value};
use fabula_storage::{PropertySchema, World, computed};

#[test]
fn storage_authoring_mistakes_are_classified() {
    let mut w = World::new();
    w.define_property(PropertySchema::new("Name", 1)).unwrap();

    let duplicate = w.define_property(PropertySchema::new("Name", 1)).unwrap_err();
    assert!(matches!(duplicate.kind, ErrorKind::DuplicateDefinition(_)));
    assert!(duplicate.is_authoring());

    let arity = w.get("Name", []).unwrap_err();
    assert!(arity.is_authoring());

    w.seal();
    let sealed = w.define_property(PropertySchema::new("Weight", 1)).unwrap_err();
    assert!(matches!(sealed.kind, ErrorKind::SealedSchema(_)));
    assert!(sealed.is_authoring());
}

#[test]
fn computed_failures_carry_a_frame() {
    let mut w = World::new();
    w.define_property(PropertySchema::new("Weight", 1)).unwrap();
    w.compute("Weight", computed(|_, _, _| Err(Error::internal("scale broke"))))
        .unwrap();

    let err = w.read(&Fact::new("Weight", [Value::object("anvil")])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
    assert!(!err.is_authoring());
    let frames = err.context.map(|c| c.stack).unwrap_or_default();
    assert_eq!(frames, ["computing Weight(anvil)"]);
}

#[test]
fn messages_name_the_offending_kind() {
    let w = World::new();
    let err = w.get("IsOpen", [Value::object("door")]).unwrap_err();
    assert_eq!(err.to_string(), "undefined property: IsOpen");
}
