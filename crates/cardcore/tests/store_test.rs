use cardcore::{CardPatch, CardStatus, CardStore, Position};
use uuid::Uuid;

#[test]
fn create_root_uses_default_position() {
    let mut store = CardStore::new();
    let id = store.create_card(None).expect("root creation cannot fail");

    let card = store.get(&id).unwrap();
    assert!(card.is_root());
    assert_eq!(card.status, CardStatus::Idle);
    assert!(card.result.is_none());
    assert_eq!(card.position, Position::new(50.0, 50.0));
}

#[test]
fn second_root_is_placed_below_the_first() {
    let mut store = CardStore::new();
    let first = store.create_card(None).unwrap();
    let second = store.create_card(None).unwrap();

    let first_y = store.get(&first).unwrap().position.y;
    let second_y = store.get(&second).unwrap().position.y;
    assert!(second_y > first_y);
}

#[test]
fn create_child_links_both_directions() {
    let mut store = CardStore::new();
    let parent = store.create_card(None).unwrap();
    let child = store.create_card(Some(parent)).unwrap();

    assert_eq!(store.get(&child).unwrap().parent, Some(parent));
    assert_eq!(store.get(&parent).unwrap().children, vec![child]);
    // Child sits to the right of its parent on the canvas
    assert!(store.get(&child).unwrap().position.x > store.get(&parent).unwrap().position.x);
}

#[test]
fn create_with_unknown_parent_inserts_nothing() {
    let mut store = CardStore::new();
    let result = store.create_card(Some(Uuid::new_v4()));

    assert!(result.is_none());
    assert!(store.is_empty());
}

#[test]
fn apply_merges_only_given_fields() {
    let mut store = CardStore::new();
    let id = store.create_card(None).unwrap();

    store.apply(
        id,
        CardPatch {
            prompt: Some("summarize".to_string()),
            position: None,
        },
    );

    let card = store.get(&id).unwrap();
    assert_eq!(card.prompt, "summarize");
    assert_eq!(card.position, Position::new(50.0, 50.0));

    // Unknown id is a no-op
    store.apply(Uuid::new_v4(), CardPatch::default());
    assert_eq!(store.len(), 1);
}

#[test]
fn delete_removes_exactly_the_descendant_closure() {
    let mut store = CardStore::new();
    let a = store.create_card(None).unwrap();
    let b = store.create_card(Some(a)).unwrap();
    let c = store.create_card(Some(a)).unwrap();
    let d = store.create_card(Some(b)).unwrap();
    let other_root = store.create_card(None).unwrap();

    store.delete_card(a);

    for id in [a, b, c, d] {
        assert!(!store.contains(&id));
    }
    assert!(store.contains(&other_root));
    assert_eq!(store.len(), 1);
    store.validate().unwrap();
}

#[test]
fn delete_subtree_detaches_from_parent() {
    let mut store = CardStore::new();
    let root = store.create_card(None).unwrap();
    let kept = store.create_card(Some(root)).unwrap();
    let removed = store.create_card(Some(root)).unwrap();
    let grandchild = store.create_card(Some(removed)).unwrap();

    store.delete_card(removed);

    assert!(!store.contains(&removed));
    assert!(!store.contains(&grandchild));
    assert_eq!(store.get(&root).unwrap().children, vec![kept]);
    store.validate().unwrap();
}

#[test]
fn delete_is_idempotent() {
    let mut store = CardStore::new();
    let id = store.create_card(None).unwrap();

    store.delete_card(id);
    store.delete_card(id);

    assert!(store.is_empty());
}

#[test]
fn reset_all_clears_status_and_result() {
    let mut store = CardStore::new();
    let id = store.create_card(None).unwrap();
    store.mark_done(id, "{\"text\": \"out\"}".to_string());

    store.reset_all();

    let card = store.get(&id).unwrap();
    assert_eq!(card.status, CardStatus::Idle);
    assert!(card.result.is_none());
}

#[test]
fn validate_rejects_dangling_parent() {
    let mut store = CardStore::new();
    let id = store.create_card(None).unwrap();
    store.cards.get_mut(&id).unwrap().parent = Some(Uuid::new_v4());

    assert!(store.validate().is_err());
}

#[test]
fn roots_skips_linked_cards() {
    let mut store = CardStore::new();
    let a = store.create_card(None).unwrap();
    let _b = store.create_card(Some(a)).unwrap();
    let c = store.create_card(None).unwrap();

    let mut roots: Vec<_> = store.roots().map(|card| card.id).collect();
    roots.sort();
    let mut expected = vec![a, c];
    expected.sort();
    assert_eq!(roots, expected);
}
