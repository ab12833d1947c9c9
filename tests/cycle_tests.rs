use recdiff::{compare_records, ensure_acyclic, DiffConfig, DiffError, Node, Record};

#[test]
fn test_self_reference_fails_comparison() {
    let previous = Record::new().with("name", "Wade Hills");
    previous.insert("self", previous.clone());
    let latest = Record::new().with("name", "Wade Hills");

    let err = compare_records(&previous, &latest, &DiffConfig::default()).unwrap_err();
    assert_eq!(err, DiffError::circular_reference("self"));
}

#[test]
fn test_cycle_in_latest_detected() {
    let previous = Record::new().with("name", "Jacques");
    let store = Record::new().with("name", "Jacques");
    let address = Record::new().with("city", "New Cordell");
    store.insert("address", address.clone());
    address.insert("postalCode", store.clone());

    let err = compare_records(&previous, &store, &DiffConfig::default()).unwrap_err();
    assert!(matches!(err, DiffError::CircularReference { .. }));
    assert!(err.to_string().contains("address.postalCode"));
}

#[test]
fn test_cycle_through_array() {
    let root = Record::new();
    let owner = Record::new().with("name", "A");
    owner.insert("company", root.clone());
    root.insert("owners", Node::Array(vec![Node::from(owner)]));

    assert_eq!(
        ensure_acyclic(&root),
        Err(DiffError::circular_reference("owners[0].company"))
    );
}

#[test]
fn test_shared_record_is_not_a_cycle() {
    let address = Record::new().with("city", "Oslo");
    let previous = Record::new()
        .with("registered", address.clone())
        .with("trading", address.clone());
    let latest = Record::new()
        .with("registered", address.clone())
        .with("trading", Record::new().with("city", "Bergen"));

    assert!(ensure_acyclic(&previous).is_ok());
    let tree = compare_records(&previous, &latest, &DiffConfig::default()).unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.lookup(&["trading", "city"]).is_some());
}

#[test]
fn test_same_handle_on_both_sides() {
    let record = Record::new().with("a", 1).with("b", Record::new().with("c", 2));
    let tree = compare_records(&record, &record, &DiffConfig::default()).unwrap();
    assert!(tree.is_empty());
}
