//! Models shared by the integration tests

#![allow(dead_code)]

use quill_orm::{fields, Database, DatabaseConfig, FieldSet, Model, SharedDatabase};

pub struct User;

impl Model for User {
    fn model_name() -> &'static str {
        "User"
    }

    fn declare_fields(fields: &mut FieldSet) {
        fields
            .add("name", fields::char_field(255).not_null())
            .add("age", fields::integer_field().not_null());
    }
}

pub struct Book;

impl Model for Book {
    fn model_name() -> &'static str {
        "Book"
    }

    fn declare_fields(fields: &mut FieldSet) {
        fields.add("name", fields::char_field(255));
    }
}

/// Fresh in-memory database with the `user` table created
pub async fn memory_database() -> SharedDatabase {
    let db = Database::connect(DatabaseConfig::in_memory())
        .await
        .expect("in-memory database should open")
        .shared();
    db.create_table_if_missing::<User>()
        .await
        .expect("user table should be created");
    db
}

/// One field of every storage type
pub struct Event;

impl Model for Event {
    fn model_name() -> &'static str {
        "Event"
    }

    fn declare_fields(fields: &mut FieldSet) {
        fields
            .add("title", fields::char_field(120).not_null())
            .add("attendees", fields::integer_field())
            .add("rating", fields::float_field())
            .add("public", fields::boolean_field())
            .add("day", fields::date_field())
            .add("starts_at", fields::datetime_field());
    }
}

/// Model that tries to declare its own `id`
pub struct Ticket;

impl Model for Ticket {
    fn model_name() -> &'static str {
        "Ticket"
    }

    fn declare_fields(fields: &mut FieldSet) {
        fields
            .add("id", fields::integer_field())
            .add("code", fields::char_field(20));
    }
}
