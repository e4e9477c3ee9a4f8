use rowbind::prelude::*;
use rowbind_test::{MockDatabase, User};
use std::sync::Arc;

#[test]
fn prelude_covers_a_basic_round_trip() {
    let db = Arc::new(MockDatabase::new().with_table("users", User::schema()).with_insert_id(1));
    let source = DataSource::new(db.clone());

    let mut user: Model<User> = source.model(User::default()).unwrap();
    user.bulk_assign(record! { "name" => "bob", "email" => "bob@example.com" }, false)
        .unwrap();
    user.save().unwrap();

    assert!(user.is_loaded());
    assert_eq!(user.primary_key_value(), Some(KeyValue::from(1i64)));
    assert_eq!(
        db.last_statement().unwrap().sql,
        "INSERT INTO users (name, email) VALUES (?, ?)"
    );
}

#[test]
fn core_types_are_reexported_at_the_root() {
    let mut errors = rowbind::ErrorContainer::multiple();
    errors.push(ErrorRecord::new("boom"));
    assert_eq!(errors.len(), 1);
    assert_eq!(Value::from(3), Value::Int(3));
}
