use rowbind_core::{record, Value};
use rowbind_data::{Condition, DataError, DataSource, ErrorKind, KeyValue, Model, Operator, Order, Plain};
use rowbind_test::{Membership, MockDatabase, User};
use std::sync::Arc;

fn setup() -> (Arc<MockDatabase>, DataSource) {
    let db = Arc::new(
        MockDatabase::new()
            .with_table("users", User::schema())
            .with_table("memberships", Membership::schema()),
    );
    let source = DataSource::new(db.clone());
    (db, source)
}

fn loaded_user(db: &MockDatabase, source: &DataSource) -> Model<User> {
    db.push_row(Some(record! { "id" => 7, "name" => "ann", "email" => "ann@example.com" }));
    let mut user = source.model(User::default()).unwrap();
    user.set_primary_key_value(7i64).unwrap();
    assert!(user.load().unwrap());
    db.clear_statements();
    user
}

#[test]
fn pure_entity_rejects_every_persistence_operation() {
    let (db, source) = setup();
    let mut model = source.model(Plain).unwrap();
    assert!(!model.is_data_model());

    model.set("aa", "x").unwrap();
    model.set("bb", 5).unwrap();
    assert_eq!(model.get("aa").unwrap(), Value::from("x"));
    assert_eq!(model.get("bb").unwrap(), Value::Int(5));
    assert_eq!(model.to_record(), record! { "aa" => "x", "bb" => 5 });

    let results = [
        model.load().map(|_| ()),
        model.create(),
        model.update().map(|_| ()),
        model.delete().map(|_| ()),
        model.exists().map(|_| ()),
        model.replace(),
    ];
    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, DataError::NotDataModel(_)), "got {err:?}");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
    assert!(db.statements().is_empty());
}

#[test]
fn composite_key_round_trip() {
    let (_db, source) = setup();
    let mut membership = source.model(Membership).unwrap();
    let key = KeyValue::composite([("pk1", Value::Int(1)), ("pk2", Value::from("a"))]);

    membership.set_primary_key_value(key.clone()).unwrap();
    assert_eq!(membership.primary_key_value(), Some(key));

    let condition = membership.primary_key_condition().unwrap();
    let criteria: Vec<_> = condition.iter().collect();
    assert_eq!(criteria.len(), 2);
    assert_eq!(criteria[0].field, "pk1");
    assert_eq!(criteria[0].value, Value::Int(1));
    assert_eq!(criteria[1].field, "pk2");
    assert_eq!(criteria[1].value, Value::from("a"));
    assert!(criteria.iter().all(|c| c.operator == Operator::Eq));
}

#[test]
fn key_shape_must_match_schema() {
    let (_db, source) = setup();
    let mut membership = source.model(Membership).unwrap();
    assert!(matches!(
        membership.set_primary_key_value(5i64),
        Err(DataError::InvalidArgument(_))
    ));
    assert!(matches!(
        membership.set_primary_key_value(KeyValue::composite([("pk1", 1i64)])),
        Err(DataError::InvalidArgument(_))
    ));

    let mut user = source.model(User::default()).unwrap();
    assert!(matches!(
        user.set_primary_key_value(record! { "id" => 1 }),
        Err(DataError::InvalidArgument(_))
    ));
}

#[test]
fn partial_or_null_key_is_unset() {
    let (_db, source) = setup();
    let mut membership = source.model(Membership).unwrap();
    membership.set("pk1", 1).unwrap();
    assert_eq!(membership.primary_key_value(), None);
    membership.set("pk2", Value::Null).unwrap();
    assert_eq!(membership.primary_key_value(), None);
    assert!(matches!(
        membership.primary_key_condition(),
        Err(DataError::InvalidArgument(_))
    ));
}

#[test]
fn mark_loaded_requires_a_key() {
    let (_db, source) = setup();
    let mut user = source.model(User::default()).unwrap();
    assert!(!user.is_loaded());
    assert!(matches!(user.mark_loaded(), Err(DataError::UnexpectedState(_))));

    user.set("id", 3).unwrap();
    user.mark_loaded().unwrap();
    assert!(user.is_loaded());
}

#[test]
fn load_assigns_row_and_marks_loaded() {
    let (db, source) = setup();
    let user = loaded_user(&db, &source);

    assert!(user.is_loaded());
    assert_eq!(user.entity().display_name.as_deref(), Some("ann"));
    assert_eq!(user.get("email").unwrap(), Value::from("ann@example.com"));
    assert_eq!(user.primary_key_value(), Some(KeyValue::from(7i64)));
}

#[test]
fn load_sends_single_row_query() {
    let (db, source) = setup();
    let mut user = source.model(User::default()).unwrap();
    user.set("id", 7).unwrap();
    assert!(!user.load().unwrap());

    let stmt = db.last_statement().unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM users WHERE id = ? LIMIT 1");
    assert_eq!(stmt.args, vec![Value::Int(7)]);
}

#[test]
fn load_miss_is_not_an_error() {
    let (_db, source) = setup();
    let mut user = source.model(User::default()).unwrap();
    user.set("id", 99).unwrap();
    assert!(!user.load().unwrap());
    assert!(!user.is_loaded());
    assert!(!user.has_error());
}

#[test]
fn load_by_condition_honours_order() {
    let (db, source) = setup();
    db.push_row(Some(record! { "id" => 2, "name" => "bo" }));
    let mut user = source.model(User::default()).unwrap();

    let found = user
        .load_by_condition(Condition::new().eq("name", "bo"), &[Order::desc("id")])
        .unwrap();
    assert!(found);
    assert_eq!(
        db.last_statement().unwrap().sql,
        "SELECT * FROM users WHERE name = ? ORDER BY id DESC LIMIT 1"
    );
    assert_eq!(user.entity().id, Some(2));
}

#[test]
fn load_by_condition_rejects_empty_and_invalid_conditions() {
    let (db, source) = setup();
    let mut user = source.model(User::default()).unwrap();

    assert!(matches!(
        user.load_by_condition(Condition::new(), &[]),
        Err(DataError::InvalidArgument(_))
    ));
    assert!(matches!(
        user.load_by_condition(Condition::new().eq("name; DROP TABLE users", 1), &[]),
        Err(DataError::InvalidArgument(_))
    ));
    assert!(db.statements().is_empty());
}

#[test]
fn apart_model_keeps_its_key() {
    let (db, source) = setup();
    let mut user = loaded_user(&db, &source);

    user.set("id", 7).unwrap();
    assert!(user.is_loaded());

    assert!(matches!(user.set("id", 8), Err(DataError::PrimaryKeyReadOnly(_))));
    assert!(matches!(user.remove("id"), Err(DataError::PrimaryKeyReadOnly(_))));
    assert!(matches!(
        user.set_primary_key_value(8i64),
        Err(DataError::PrimaryKeyReadOnly(_))
    ));
    assert_eq!(user.entity().id, Some(7));
    assert!(user.is_loaded());
}

#[test]
fn apart_guard_covers_dynamic_key_components() {
    let (_db, source) = setup();
    let mut membership = source.model(Membership).unwrap();
    membership
        .bulk_assign(record! { "pk1" => 1, "pk2" => "a", "role" => "admin" }, true)
        .unwrap();

    membership.set("role", "owner").unwrap();
    assert!(matches!(
        membership.set("pk2", "b"),
        Err(DataError::PrimaryKeyReadOnly(_))
    ));
    assert!(membership.is_loaded());
}

#[test]
fn forced_key_change_invalidates_loaded_state() {
    let (db, source) = setup();
    let mut user = loaded_user(&db, &source);

    user.entity_mut().id = Some(9);
    assert!(!user.is_loaded());

    user.entity_mut().id = Some(7);
    assert!(user.is_loaded());
}

#[test]
fn non_apart_model_may_be_repointed() {
    let (db, source) = setup();
    let mut user = loaded_user(&db, &source);
    user.set_instance_apart(false);
    assert!(!user.is_instance_apart());

    user.set("id", 10).unwrap();
    assert!(!user.is_loaded());
    assert_eq!(user.primary_key_value(), Some(KeyValue::from(10i64)));
}

#[test]
fn exists_short_circuits_when_loaded() {
    let (db, source) = setup();
    let mut user = loaded_user(&db, &source);
    assert!(user.exists().unwrap());
    assert!(db.statements().is_empty());
}

#[test]
fn exists_counts_by_primary_key() {
    let (db, source) = setup();
    db.push_count(1);
    let mut user = source.model(User::default()).unwrap();
    user.set("id", 4).unwrap();

    assert!(user.exists().unwrap());
    let stmt = db.last_statement().unwrap();
    assert_eq!(stmt.sql, "SELECT COUNT(*) FROM users WHERE id = ?");
    assert_eq!(stmt.args, vec![Value::Int(4)]);

    assert!(!user.exists().unwrap());
}

#[test]
fn loading_another_row_into_apart_model_changes_nothing() {
    let (db, source) = setup();
    let mut user = loaded_user(&db, &source);
    db.push_row(Some(record! { "id" => 8, "name" => "bob", "email" => "bob@example.com" }));

    let err = user
        .load_by_condition(Condition::new().eq("name", "bob"), &[])
        .unwrap_err();
    assert!(matches!(err, DataError::PrimaryKeyReadOnly(_)), "got {err:?}");

    assert_eq!(user.get("id").unwrap(), Value::Int(7));
    assert_eq!(user.get("name").unwrap(), Value::from("ann"));
    assert_eq!(user.get("email").unwrap(), Value::from("ann@example.com"));
    assert!(user.is_loaded());
}

#[test]
fn reloading_the_same_row_refreshes_apart_model() {
    let (db, source) = setup();
    let mut user = loaded_user(&db, &source);
    db.push_row(Some(record! { "id" => 7, "name" => "annie", "email" => Value::Null }));

    assert!(user.load().unwrap());
    assert_eq!(user.get("name").unwrap(), Value::from("annie"));
    assert_eq!(user.get("email").unwrap(), Value::Null);
    assert!(user.is_loaded());
}
