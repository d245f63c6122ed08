//! Model declaration and reflection
//!
//! Models declare their fields once, statically, through [`Model::declare_fields`].
//! Reflection turns that declaration into the ordered list of
//! [`FieldDescriptor`]s the database façade compiles payloads and filters
//! against. Every model carries an implicit `id` field (integer, primary key,
//! auto-increment) which is always system-assigned.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};
use crate::fields::{id_field, Field, FieldDescriptor, ID_FIELD};
use crate::value::DatabaseValue;

/// A declared data model mapping to one storage table
///
/// ```
/// use quill_orm::{fields, FieldSet, Model};
///
/// struct User;
///
/// impl Model for User {
///     fn model_name() -> &'static str {
///         "User"
///     }
///
///     fn declare_fields(fields: &mut FieldSet) {
///         fields
///             .add("name", fields::char_field(255).not_null())
///             .add("age", fields::integer_field().not_null());
///     }
/// }
///
/// assert_eq!(User::table_name(), "user");
/// ```
pub trait Model: Send + Sync + 'static {
    /// Model identifier
    fn model_name() -> &'static str;

    /// Declare the model's typed fields, in column order
    fn declare_fields(fields: &mut FieldSet);

    /// Storage table name: the lower-cased model identifier
    fn table_name() -> String {
        table_name_for(Self::model_name())
    }
}

/// Ordered registration list of a model's fields
#[derive(Debug, Clone)]
pub struct FieldSet {
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    fn with_implicit_id() -> Self {
        Self {
            fields: vec![id_field()],
        }
    }

    /// Register a field. Re-declaring a name replaces the earlier
    /// declaration in place, so names stay unique. The implicit `id` cannot
    /// be redeclared; such a declaration is ignored.
    pub fn add(&mut self, name: &str, field: Field) -> &mut Self {
        if name == ID_FIELD {
            tracing::warn!("Ignoring declaration of reserved field '{}'", ID_FIELD);
            return self;
        }
        let descriptor = field.named(name);
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = descriptor,
            None => self.fields.push(descriptor),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldDescriptor> {
        self.fields
    }
}

/// Derive a table name from a model identifier
pub fn table_name_for(model_name: &str) -> String {
    model_name.to_lowercase()
}

/// Enumerate every field of a model, implicit `id` first
pub fn reflect_fields<M: Model>() -> Vec<FieldDescriptor> {
    let mut fields = FieldSet::with_implicit_id();
    M::declare_fields(&mut fields);
    fields.into_vec()
}

/// Storage table name of a model
pub fn table_name<M: Model>() -> String {
    M::table_name()
}

/// Fields a caller may assign in a create/update payload
pub fn assignable_fields<M: Model>() -> Vec<FieldDescriptor> {
    reflect_fields::<M>()
        .into_iter()
        .filter(|f| !f.is_system_assigned())
        .collect()
}

/// Raw entry values keyed by field name, as supplied by a caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    values: HashMap<String, DatabaseValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn set(mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<DatabaseValue> {
        self.values.remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatabaseValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a payload from a JSON object
    pub fn from_json(json: JsonValue) -> ModelResult<Self> {
        match json {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, DatabaseValue::from_json(v)))
                .collect()),
            other => Err(ModelError::Serialization(format!(
                "Payload must be a JSON object, got {}",
                other
            ))),
        }
    }
}

impl IntoIterator for Payload {
    type Item = (String, DatabaseValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, DatabaseValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<DatabaseValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, DatabaseValue>> for Payload {
    fn from(values: HashMap<String, DatabaseValue>) -> Self {
        Self { values }
    }
}

/// Build a [`Payload`] from `name => value` pairs
#[macro_export]
macro_rules! payload {
    () => {
        $crate::model::Payload::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::model::Payload::new()$(.set($name, $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{self, FieldType};
    use serde_json::json;

    struct User;

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

    struct Empty;

    impl Model for Empty {
        fn model_name() -> &'static str {
            "EmptyThing"
        }

        fn declare_fields(_fields: &mut FieldSet) {}
    }

    #[test]
    fn test_reflect_fields_in_declaration_order() {
        let fields = reflect_fields::<User>();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert_eq!(fields[1].field_type, FieldType::String);
        assert_eq!(fields[2].field_type, FieldType::Integer);
    }

    #[test]
    fn test_table_name_is_lowercased() {
        assert_eq!(table_name::<User>(), "user");
        assert_eq!(Empty::table_name(), "emptything");
    }

    #[test]
    fn test_model_without_fields_has_only_id() {
        let fields = reflect_fields::<Empty>();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
        assert!(assignable_fields::<Empty>().is_empty());
    }

    #[test]
    fn test_id_is_never_assignable() {
        assert!(assignable_fields::<User>().iter().all(|f| f.name != "id"));
    }

    #[test]
    fn test_redeclared_field_replaces_in_place() {
        let mut set = FieldSet::with_implicit_id();
        set.add("name", fields::char_field(10))
            .add("age", fields::integer_field())
            .add("name", fields::char_field(20).unique());
        let fields = set.into_vec();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1].name, "name");
        assert_eq!(fields[1].max_length, Some(20));
        assert!(fields[1].constraints.unique);
    }

    struct Shadowed;

    impl Model for Shadowed {
        fn model_name() -> &'static str {
            "Shadowed"
        }

        fn declare_fields(fields: &mut FieldSet) {
            fields
                .add("id", fields::integer_field())
                .add("name", fields::char_field(50));
        }
    }

    #[test]
    fn test_redeclared_id_keeps_implicit_key() {
        let fields = reflect_fields::<Shadowed>();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(fields[0].is_system_assigned());
        assert!(fields[0].constraints.primary_key);

        let assignable: Vec<String> = assignable_fields::<Shadowed>()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(assignable, vec!["name"]);
    }

    #[test]
    fn test_payload_macro_and_from_json() {
        let p = payload! { "name" => "Renan", "age" => 26 };
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("age"), Some(&DatabaseValue::Integer(26)));

        let j = Payload::from_json(json!({"name": "Ana", "age": 27})).unwrap();
        assert_eq!(j.get("name"), Some(&DatabaseValue::from("Ana")));

        assert!(Payload::from_json(json!([1, 2])).is_err());
    }
}
