//! SQL Generation
//!
//! Renders driver operations into statement text plus bound parameters.
//! Everything dialect-specific (column types, placeholders, comparator
//! spelling) is behind [`SqlDialect`]; the statement shapes and the predicate
//! grouping rules are shared by every SQL backend.

use crate::backends::{DatabaseFilter, DatabaseFilterGroup, DatabaseFilterNode, DatabasePayload};
use crate::error::{ModelError, ModelResult};
use crate::fields::{FieldConstraints, FieldDescriptor, FieldType};
use crate::filter::Comparator;
use crate::security::escape_identifier;
use crate::value::DatabaseValue;

/// Backend-specific pieces of SQL rendering
pub trait SqlDialect: Send + Sync {
    /// Native column type for a storage type
    fn column_type(&self, field_type: FieldType) -> &'static str;

    /// Parameter placeholder for the zero-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    /// Predicate that holds for every row
    fn always_true(&self) -> &'static str {
        "1 = 1"
    }

    /// Modifier emitted right after `PRIMARY KEY` for auto-increment keys
    fn auto_increment(&self) -> Option<&'static str> {
        None
    }

    /// Render one `column comparator value` condition
    fn condition(&self, column: &str, comparator: Comparator, placeholder: &str) -> String {
        format!("{} {} {}", column, comparator, placeholder)
    }
}

/// Statement text with its parameters in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

/// Statement builder for one dialect
pub struct SqlRenderer<'d, D: SqlDialect + ?Sized> {
    dialect: &'d D,
}

impl<'d, D: SqlDialect + ?Sized> SqlRenderer<'d, D> {
    pub fn new(dialect: &'d D) -> Self {
        Self { dialect }
    }

    /// Column modifiers in fixed order: NOT NULL, PRIMARY KEY, UNIQUE
    pub fn column_modifiers(&self, constraints: &FieldConstraints) -> String {
        let mut modifiers = Vec::new();

        if constraints.not_null {
            modifiers.push("NOT NULL");
        }
        if constraints.primary_key {
            modifiers.push("PRIMARY KEY");
            if constraints.auto_increment {
                if let Some(auto) = self.dialect.auto_increment() {
                    modifiers.push(auto);
                }
            }
        }
        if constraints.unique {
            modifiers.push("UNIQUE");
        }

        modifiers.join(" ")
    }

    /// Render a filter group as a predicate, pushing bound values onto `params`
    ///
    /// An empty group renders as the always-true predicate. A group with more
    /// than one child is parenthesised so it keeps its meaning when nested in
    /// an outer group of a different operator; a single child is not.
    pub fn predicate(&self, group: &DatabaseFilterGroup, params: &mut Vec<DatabaseValue>) -> String {
        if group.filters.is_empty() {
            return self.dialect.always_true().to_string();
        }

        let parts: Vec<String> = group
            .filters
            .iter()
            .map(|node| match node {
                DatabaseFilterNode::Condition(filter) => self.condition(filter, params),
                DatabaseFilterNode::Group(inner) => self.predicate(inner, params),
            })
            .collect();

        let separator = format!(" {} ", group.operator);
        let joined = parts.join(separator.as_str());
        if parts.len() > 1 {
            format!("({})", joined)
        } else {
            joined
        }
    }

    fn condition(&self, filter: &DatabaseFilter, params: &mut Vec<DatabaseValue>) -> String {
        let placeholder = self.dialect.placeholder(params.len());
        params.push(filter.value.clone());
        self.dialect.condition(
            &escape_identifier(&filter.field),
            filter.comparator,
            &placeholder,
        )
    }

    /// ` WHERE ...`, or nothing for an empty group
    pub fn where_clause(&self, group: &DatabaseFilterGroup, params: &mut Vec<DatabaseValue>) -> String {
        if group.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicate(group, params))
        }
    }

    pub fn create_table(&self, table_name: &str, fields: &[FieldDescriptor]) -> Statement {
        let columns: Vec<String> = fields
            .iter()
            .map(|field| {
                let mut column = format!(
                    "{} {}",
                    escape_identifier(&field.name),
                    self.dialect.column_type(field.field_type)
                );
                let modifiers = self.column_modifiers(&field.constraints);
                if !modifiers.is_empty() {
                    column.push(' ');
                    column.push_str(&modifiers);
                }
                column
            })
            .collect();

        Statement {
            sql: format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
                escape_identifier(table_name),
                columns.join(",\n    ")
            ),
            params: Vec::new(),
        }
    }

    pub fn insert(&self, table_name: &str, payload: DatabasePayload) -> Statement {
        if payload.is_empty() {
            return Statement {
                sql: format!(
                    "INSERT INTO {} DEFAULT VALUES RETURNING *",
                    escape_identifier(table_name)
                ),
                params: Vec::new(),
            };
        }

        let (columns, params): (Vec<String>, Vec<DatabaseValue>) = payload
            .into_iter()
            .map(|(name, value)| (escape_identifier(&name), value))
            .unzip();
        let placeholders: Vec<String> = (0..params.len())
            .map(|i| self.dialect.placeholder(i))
            .collect();

        Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
                escape_identifier(table_name),
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        }
    }

    /// Multi-row insert; every payload must carry the same columns in the same order
    pub fn insert_many(&self, table_name: &str, payloads: Vec<DatabasePayload>) -> ModelResult<Statement> {
        let mut payloads = payloads.into_iter();
        let first = payloads
            .next()
            .ok_or_else(|| ModelError::Query("Cannot build an insert without rows".to_string()))?;

        let columns: Vec<String> = first.iter().map(|(name, _)| name.clone()).collect();
        let mut rows = vec![first];
        for payload in payloads {
            let same_columns = payload.len() == columns.len()
                && payload.iter().zip(&columns).all(|((name, _), c)| name == c);
            if !same_columns {
                return Err(ModelError::Query(format!(
                    "All rows inserted into '{}' together must set the same fields",
                    table_name
                )));
            }
            rows.push(payload);
        }

        if rows.len() == 1 {
            let row = rows.pop().unwrap_or_default();
            return Ok(self.insert(table_name, row));
        }
        if columns.is_empty() {
            return Err(ModelError::Query(format!(
                "Cannot insert several rows into '{}' without any field values",
                table_name
            )));
        }

        let mut params = Vec::with_capacity(rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            let mut placeholders = Vec::with_capacity(row.len());
            for (_, value) in row {
                placeholders.push(self.dialect.placeholder(params.len()));
                params.push(value);
            }
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let column_list: Vec<String> = columns.iter().map(|c| escape_identifier(c)).collect();
        Ok(Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES {} RETURNING *",
                escape_identifier(table_name),
                column_list.join(", "),
                tuples.join(", ")
            ),
            params,
        })
    }

    pub fn select(&self, table_name: &str, filters: &DatabaseFilterGroup, limit: Option<u64>) -> Statement {
        let mut params = Vec::new();
        let mut sql = format!("SELECT * FROM {}", escape_identifier(table_name));
        sql.push_str(&self.where_clause(filters, &mut params));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Statement { sql, params }
    }

    /// UPDATE statement; callers skip empty payloads
    pub fn update(
        &self,
        table_name: &str,
        filters: &DatabaseFilterGroup,
        payload: DatabasePayload,
    ) -> Statement {
        let mut params = Vec::with_capacity(payload.len());
        let assignments: Vec<String> = payload
            .into_iter()
            .map(|(name, value)| {
                let placeholder = self.dialect.placeholder(params.len());
                params.push(value);
                format!("{} = {}", escape_identifier(&name), placeholder)
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            escape_identifier(table_name),
            assignments.join(", ")
        );
        sql.push_str(&self.where_clause(filters, &mut params));
        Statement { sql, params }
    }

    pub fn delete(&self, table_name: &str, filters: &DatabaseFilterGroup) -> Statement {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", escape_identifier(table_name));
        sql.push_str(&self.where_clause(filters, &mut params));
        Statement { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::SqliteDialect;
    use crate::fields;
    use crate::filter::FilterOperator;
    use sqlparser::dialect::SQLiteDialect;
    use sqlparser::parser::Parser;

    fn leaf(field: &str, value: impl Into<DatabaseValue>) -> DatabaseFilterNode {
        DatabaseFilterNode::Condition(DatabaseFilter {
            field: field.to_string(),
            comparator: Comparator::Eq,
            value: value.into(),
        })
    }

    fn group(operator: FilterOperator, filters: Vec<DatabaseFilterNode>) -> DatabaseFilterGroup {
        DatabaseFilterGroup::new(operator, filters)
    }

    fn assert_parses(sql: &str) {
        Parser::parse_sql(&SQLiteDialect {}, sql)
            .unwrap_or_else(|e| panic!("statement does not parse: {}\n{}", e, sql));
    }

    #[test]
    fn test_empty_group_is_always_true() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let mut params = Vec::new();
        assert_eq!(renderer.predicate(&DatabaseFilterGroup::all(), &mut params), "1 = 1");
        assert_eq!(renderer.where_clause(&DatabaseFilterGroup::all(), &mut params), "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_single_child_is_not_parenthesised() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let mut params = Vec::new();
        let g = group(FilterOperator::And, vec![leaf("name", "Renan")]);
        assert_eq!(renderer.predicate(&g, &mut params), "\"name\" = ?");
        assert_eq!(params, vec![DatabaseValue::from("Renan")]);
    }

    #[test]
    fn test_mixed_operators_keep_precedence() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let mut params = Vec::new();
        let g = group(
            FilterOperator::Or,
            vec![
                DatabaseFilterNode::Group(group(
                    FilterOperator::And,
                    vec![leaf("name", "Renan"), leaf("age", 25)],
                )),
                leaf("age", 27),
            ],
        );
        assert_eq!(
            renderer.predicate(&g, &mut params),
            "((\"name\" = ? AND \"age\" = ?) OR \"age\" = ?)"
        );
        assert_eq!(
            params,
            vec![
                DatabaseValue::from("Renan"),
                DatabaseValue::Integer(25),
                DatabaseValue::Integer(27)
            ]
        );
    }

    #[test]
    fn test_nested_empty_group_renders_always_true() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let mut params = Vec::new();
        let g = group(
            FilterOperator::Or,
            vec![DatabaseFilterNode::Group(DatabaseFilterGroup::all()), leaf("age", 1)],
        );
        assert_eq!(renderer.predicate(&g, &mut params), "(1 = 1 OR \"age\" = ?)");
    }

    #[test]
    fn test_column_modifier_order() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let all = FieldConstraints {
            not_null: true,
            unique: true,
            primary_key: true,
            auto_increment: false,
        };
        assert_eq!(renderer.column_modifiers(&all), "NOT NULL PRIMARY KEY UNIQUE");
        assert_eq!(renderer.column_modifiers(&FieldConstraints::default()), "");
    }

    #[test]
    fn test_create_table_statement() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let fields = vec![
            crate::fields::id_field(),
            fields::char_field(255).not_null().named("name"),
            fields::integer_field().not_null().named("age"),
            fields::float_field().named("score"),
            fields::boolean_field().named("active"),
            fields::date_field().named("born"),
            fields::datetime_field().unique().named("seen_at"),
        ];
        let statement = renderer.create_table("user", &fields);
        assert_eq!(
            statement.sql,
            "CREATE TABLE IF NOT EXISTS \"user\" (\n    \
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             \"name\" TEXT NOT NULL,\n    \
             \"age\" INTEGER NOT NULL,\n    \
             \"score\" REAL,\n    \
             \"active\" INTEGER,\n    \
             \"born\" TEXT,\n    \
             \"seen_at\" TEXT UNIQUE\n)"
        );
        assert_parses(&statement.sql);
    }

    #[test]
    fn test_insert_statements() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let statement = renderer.insert(
            "user",
            vec![
                ("name".to_string(), DatabaseValue::from("Renan")),
                ("age".to_string(), DatabaseValue::Integer(26)),
            ],
        );
        assert_eq!(
            statement.sql,
            "INSERT INTO \"user\" (\"name\", \"age\") VALUES (?, ?) RETURNING *"
        );
        assert_eq!(statement.params.len(), 2);

        let empty = renderer.insert("user", Vec::new());
        assert_eq!(empty.sql, "INSERT INTO \"user\" DEFAULT VALUES RETURNING *");
    }

    #[test]
    fn test_insert_many_statement() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let row = |name: &str, age: i64| {
            vec![
                ("name".to_string(), DatabaseValue::from(name)),
                ("age".to_string(), DatabaseValue::Integer(age)),
            ]
        };
        let statement = renderer
            .insert_many("user", vec![row("Breno", 27), row("Ana", 27)])
            .unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO \"user\" (\"name\", \"age\") VALUES (?, ?), (?, ?) RETURNING *"
        );
        assert_eq!(statement.params.len(), 4);
        assert_parses(&statement.sql);

        let mismatched = renderer.insert_many(
            "user",
            vec![row("Breno", 27), vec![("name".to_string(), DatabaseValue::from("Ana"))]],
        );
        assert!(matches!(mismatched, Err(ModelError::Query(_))));
        assert!(renderer.insert_many("user", Vec::new()).is_err());
    }

    #[test]
    fn test_update_parameters_follow_placeholder_order() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let filters = group(FilterOperator::And, vec![leaf("name", "Ana")]);
        let statement = renderer.update(
            "user",
            &filters,
            vec![("age".to_string(), DatabaseValue::Integer(1))],
        );
        assert_eq!(statement.sql, "UPDATE \"user\" SET \"age\" = ? WHERE \"name\" = ?");
        assert_eq!(
            statement.params,
            vec![DatabaseValue::Integer(1), DatabaseValue::from("Ana")]
        );
        assert_parses(&statement.sql);
    }

    #[test]
    fn test_select_and_delete() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let select = renderer.select("user", &DatabaseFilterGroup::all(), Some(1));
        assert_eq!(select.sql, "SELECT * FROM \"user\" LIMIT 1");

        let filters = group(FilterOperator::Or, vec![leaf("name", "Renan"), leaf("age", 27)]);
        let delete = renderer.delete("user", &filters);
        assert_eq!(delete.sql, "DELETE FROM \"user\" WHERE (\"name\" = ? OR \"age\" = ?)");
        assert_parses(&delete.sql);
    }

    #[test]
    fn test_ilike_uses_dialect_spelling() {
        let renderer = SqlRenderer::new(&SqliteDialect);
        let mut params = Vec::new();
        let g = group(
            FilterOperator::And,
            vec![DatabaseFilterNode::Condition(DatabaseFilter {
                field: "name".to_string(),
                comparator: Comparator::ILike,
                value: DatabaseValue::from("ren%"),
            })],
        );
        let predicate = renderer.predicate(&g, &mut params);
        assert_eq!(predicate, "lower(\"name\") LIKE lower(?)");
        assert_parses(&format!("SELECT * FROM \"user\" WHERE {}", predicate));
    }
}
