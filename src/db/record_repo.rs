// src/db/record_repo.rs

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::{map_unique_violation, push_cell, push_predicate},
        error::AppError,
    },
    db::{RecordQuery, RecordStore},
    models::entity::CrmRecord,
    services::filter::Predicate,
};

// Repositório genérico de registros base: o SQL sai inteiro do catálogo de
// colunas da entidade, então Account e Contact compartilham o mesmo código.
pub struct RecordRepository<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordRepository<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: CrmRecord> RecordRepository<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    fn table() -> &'static str {
        R::KIND.table()
    }
}

/// Erros de escrita que são culpa do cliente: id repetido ou referência quebrada
fn write_error<R: CrmRecord>(e: sqlx::Error, record: &R) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return AppError::InvalidInput(format!(
                "{} '{}' referencia um registro que não existe",
                R::KIND,
                record.id()
            ));
        }
    }
    // id informado pelo cliente/CSV
    map_unique_violation(e, || {
        AppError::RecordAlreadyExists(format!("{} '{}' já existe", R::KIND, record.id()))
    })
}

#[async_trait]
impl<R: CrmRecord> RecordStore<R> for RecordRepository<R> {
    async fn insert(&self, record: &R) -> Result<R, AppError> {
        let columns = R::KIND.columns();

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", Self::table()));
        let names: Vec<&str> = columns.iter().map(|c| c.db).collect();
        qb.push(names.join(", "));
        qb.push(") VALUES (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_cell(&mut qb, column.kind, record.cell(column.key));
        }
        qb.push(") RETURNING *");

        let created = qb
            .build_query_as::<R>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, record))?;

        Ok(created)
    }

    async fn update(&self, record: &R) -> Result<Option<R>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", Self::table()));

        // id e created_date nunca mudam
        let editable = R::KIND
            .columns()
            .iter()
            .filter(|c| c.key != "id" && c.key != "createdDate");
        for (i, column) in editable.enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("{} = ", column.db));
            push_cell(&mut qb, column.kind, record.cell(column.key));
        }
        qb.push(" WHERE id = ");
        qb.push_bind(record.id().to_string());
        qb.push(" RETURNING *");

        let updated = qb
            .build_query_as::<R>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, record))?;
        Ok(updated)
    }

    async fn find(&self, id: &str) -> Result<Option<R>, AppError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", Self::table());
        let record = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_many(&self, query: &RecordQuery) -> Result<Vec<R>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE ", Self::table()));
        push_predicate(&mut qb, &query.predicate);

        // Desempate por id: a ordem do export precisa ser determinística
        qb.push(format!(
            " ORDER BY {} {} NULLS LAST, id ASC",
            query.sort.db,
            if query.descending { "DESC" } else { "ASC" }
        ));

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
            qb.push(" OFFSET ");
            qb.push_bind(query.offset);
        }

        let records = qb.build_query_as::<R>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} WHERE ", Self::table()));
        push_predicate(&mut qb, predicate);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }
}
