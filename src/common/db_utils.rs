// src/common/db_utils.rs

use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    models::entity::{Cell, Column, ColumnKind},
    services::filter::Predicate,
};

// ---
// Helpers de SQL dinâmico: todo valor passa por push_bind, todo nome de
// coluna vem do catálogo estático.
// ---

/// Faz o bind de uma célula respeitando o tipo da coluna (NULL também precisa de tipo).
pub(crate) fn push_cell(qb: &mut QueryBuilder<'_, Postgres>, kind: ColumnKind, cell: Cell) {
    match cell {
        Cell::Null => match kind {
            ColumnKind::Text => qb.push_bind(None::<String>),
            ColumnKind::Decimal => qb.push_bind(None::<Decimal>),
            ColumnKind::Integer => qb.push_bind(None::<i64>),
            ColumnKind::Boolean => qb.push_bind(None::<bool>),
            ColumnKind::Date => qb.push_bind(None::<chrono::NaiveDate>),
            ColumnKind::Timestamp => qb.push_bind(None::<chrono::DateTime<chrono::Utc>>),
        },
        Cell::Text(v) => qb.push_bind(v),
        Cell::Decimal(v) => qb.push_bind(v),
        Cell::Integer(v) => qb.push_bind(v),
        Cell::Boolean(v) => qb.push_bind(v),
        Cell::Date(v) => qb.push_bind(v),
        Cell::Timestamp(v) => qb.push_bind(v),
    };
}

/// Comparação de igualdade/desigualdade. Se o valor não bateu com o tipo da
/// coluna (virou texto), compara pela forma textual da coluna.
fn push_comparison(qb: &mut QueryBuilder<'_, Postgres>, column: &Column, op: &str, value: &Cell) {
    let as_text = matches!(value, Cell::Text(_)) && column.kind != ColumnKind::Text;
    if as_text {
        qb.push(format!("CAST({} AS TEXT) {} ", column.db, op));
        push_cell(qb, ColumnKind::Text, value.clone());
    } else {
        qb.push(format!("{} {} ", column.db, op));
        push_cell(qb, column.kind, value.clone());
    }
}

/// Traduz o predicado do compilador de filtros para SQL parametrizado.
pub(crate) fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::All => {
            qb.push("TRUE");
        }
        Predicate::Eq(column, value) => push_comparison(qb, column, "=", value),
        Predicate::NotEq(column, value) => push_comparison(qb, column, "<>", value),
        Predicate::Contains(column, needle) => {
            // strpos evita ter que escapar % e _ de um LIKE
            qb.push(format!("strpos(CAST({} AS TEXT), ", column.db));
            qb.push_bind(needle.clone());
            qb.push(") > 0");
        }
        Predicate::IsNull(column) => {
            qb.push(format!("{} IS NULL", column.db));
        }
        Predicate::IsNotNull(column) => {
            qb.push(format!("{} IS NOT NULL", column.db));
        }
        Predicate::And(items) | Predicate::Or(items) if items.is_empty() => {
            qb.push(if matches!(predicate, Predicate::And(_)) { "TRUE" } else { "FALSE" });
        }
        Predicate::And(items) | Predicate::Or(items) => {
            let joiner = if matches!(predicate, Predicate::And(_)) { " AND " } else { " OR " };
            qb.push("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_predicate(qb, item);
            }
            qb.push(")");
        }
    }
}

/// Converte violação de UNIQUE em um erro de negócio; o resto segue como erro de banco.
pub(crate) fn map_unique_violation(
    e: sqlx::Error,
    on_conflict: impl FnOnce() -> crate::common::error::AppError,
) -> crate::common::error::AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_conflict();
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::EntityKind;

    fn column(key: &str) -> &'static Column {
        EntityKind::Contact.column(key).unwrap()
    }

    fn render(predicate: &Predicate) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_predicate(&mut qb, predicate);
        qb.sql().to_string()
    }

    #[test]
    fn renders_parameterized_sql() {
        let predicate = Predicate::And(vec![
            Predicate::Or(vec![
                Predicate::Contains(column("firstName"), "an".into()),
                Predicate::Contains(column("email"), "an".into()),
            ]),
            Predicate::Eq(column("executiveOrNot"), Cell::Boolean(true)),
            Predicate::IsNull(column("accountId")),
        ]);

        assert_eq!(
            render(&predicate),
            "((strpos(CAST(first_name AS TEXT), $1) > 0 OR strpos(CAST(email AS TEXT), $2) > 0) \
             AND executive_or_not = $3 AND account_id IS NULL)"
        );
    }

    #[test]
    fn mismatched_values_compare_as_text() {
        let predicate = Predicate::NotEq(column("doNotCall"), Cell::Text("maybe".into()));
        assert_eq!(render(&predicate), "CAST(do_not_call AS TEXT) <> $1");
    }

    #[test]
    fn user_text_never_reaches_the_sql_string() {
        let hostile = "x'); DROP TABLE contacts; --";
        let sql = render(&Predicate::Eq(column("email"), Cell::Text(hostile.into())));
        assert!(!sql.contains("DROP"));
        assert_eq!(sql, "email = $1");
    }
}
