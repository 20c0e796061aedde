//! SQL text generation for the [`RecordBuilder`](crate::RecordBuilder) operations.
//!
//! Values never reach the SQL text: each one is referenced through a named
//! placeholder and carried in the statement's [`ParameterSet`]. Table and column
//! names are wrapped in backticks but not escaped, so they must come from
//! trusted code; names containing a backtick are rejected.

use crate::builder::PlaceholderNamer;
use crate::error::{Error, Result};
use crate::params::{ColumnValue, ParameterSet};

/// Generated SQL and the values to bind to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledStatement {
    pub sql: String,
    pub params: ParameterSet,
}

/// Wraps `name` in backticks.
pub fn quote_identifier(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('`') {
        return Err(Error::InvalidIdentifier(name.to_owned()));
    }
    Ok(format!("`{name}`"))
}

/// Fails when a column is named twice; placeholder tokens are kept apart by the namer.
fn reject_repeated_columns(columns: &[ColumnValue]) -> Result<()> {
    for (index, column) in columns.iter().enumerate() {
        if columns[..index].iter().any(|c| c.name == column.name) {
            return Err(Error::DuplicatePlaceholder(format!(":{}", column.name)));
        }
    }
    Ok(())
}

/// ``INSERT INTO `t` (`a`,`b`) VALUES (:a,:b)``
///
/// # Examples
///
/// ```
/// use sqlx_chainer::sql::insert_statement;
/// use sqlx_chainer::ColumnValue;
///
/// let statement = insert_statement(
///     "users",
///     &[ColumnValue::new("name", "Ann"), ColumnValue::int("age", 30)],
/// )?;
/// assert_eq!(statement.sql, "INSERT INTO `users` (`name`,`age`) VALUES (:name,:age)");
/// # Ok::<(), sqlx_chainer::Error>(())
/// ```
pub fn insert_statement(table: &str, columns: &[ColumnValue]) -> Result<AssembledStatement> {
    if columns.is_empty() {
        return Err(Error::EmptyColumns { operation: "insert" });
    }
    let table = quote_identifier(table)?;
    reject_repeated_columns(columns)?;

    let mut namer = PlaceholderNamer::new();
    let mut params = ParameterSet::new();
    let mut fields = Vec::with_capacity(columns.len());
    let mut placeholders = Vec::with_capacity(columns.len());
    for column in columns {
        fields.push(quote_identifier(&column.name)?);
        let token = namer.unique(&column.name);
        params.push(&token, column.bound())?;
        placeholders.push(token);
    }

    Ok(AssembledStatement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            fields.join(","),
            placeholders.join(",")
        ),
        params,
    })
}

/// ``UPDATE `t` SET `a` = :a,`b` = :b WHERE `id` = :id1 LIMIT n``
///
/// Condition placeholders carry a sequence number so they never clash with the
/// SET placeholder of the same column. Without conditions the WHERE clause is
/// left out and up to `limit` arbitrary rows are updated.
pub fn update_statement(
    table: &str,
    columns: &[ColumnValue],
    conditions: &[ColumnValue],
    limit: u64,
) -> Result<AssembledStatement> {
    if columns.is_empty() {
        return Err(Error::EmptyColumns { operation: "update" });
    }
    let table = quote_identifier(table)?;
    reject_repeated_columns(columns)?;

    let mut namer = PlaceholderNamer::new();
    let mut params = ParameterSet::new();
    let mut assignments = Vec::with_capacity(columns.len());
    for column in columns {
        let token = namer.unique(&column.name);
        assignments.push(format!("{} = {token}", quote_identifier(&column.name)?));
        params.push(&token, column.bound())?;
    }

    let mut filters = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let token = namer.sequenced(&condition.name);
        filters.push(format!("{} = {token}", quote_identifier(&condition.name)?));
        params.push(&token, condition.bound())?;
    }

    let mut sql = format!("UPDATE {table} SET {}", assignments.join(","));
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }
    sql.push_str(&format!(" LIMIT {limit}"));

    Ok(AssembledStatement { sql, params })
}

/// ``DELETE FROM `t` WHERE `a` = :a AND `b` = :b LIMIT n``
pub fn delete_statement(
    table: &str,
    conditions: &[ColumnValue],
    limit: u64,
) -> Result<AssembledStatement> {
    if conditions.is_empty() {
        return Err(Error::EmptyConditions { operation: "delete" });
    }
    let table = quote_identifier(table)?;

    let mut namer = PlaceholderNamer::new();
    let mut params = ParameterSet::new();
    let mut filters = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let token = namer.unique(&condition.name);
        filters.push(format!("{} = {token}", quote_identifier(&condition.name)?));
        params.push(&token, condition.bound())?;
    }

    Ok(AssembledStatement {
        sql: format!(
            "DELETE FROM {table} WHERE {} LIMIT {limit}",
            filters.join(" AND ")
        ),
        params,
    })
}

/// ``INSERT INTO `t` (`a`,`b`) VALUES (:a1,:b2),(:a3,:b4)``
///
/// The column list comes from the first row; every other row must name the
/// same columns in the same order. One counter numbers the placeholders of the
/// whole batch.
pub fn insert_multi_statement(table: &str, rows: &[Vec<ColumnValue>]) -> Result<AssembledStatement> {
    let Some(first) = rows.first().filter(|r| !r.is_empty()) else {
        return Err(Error::EmptyColumns {
            operation: "insert_multi",
        });
    };
    let table = quote_identifier(table)?;
    reject_repeated_columns(first)?;
    let fields = first
        .iter()
        .map(|column| quote_identifier(&column.name))
        .collect::<Result<Vec<_>>>()?;

    let mut namer = PlaceholderNamer::new();
    let mut params = ParameterSet::new();
    let mut groups = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let same_columns = row.len() == first.len()
            && row.iter().zip(first).all(|(a, b)| a.name == b.name);
        if !same_columns {
            return Err(Error::HeterogeneousRow { row: index });
        }

        let mut placeholders = Vec::with_capacity(row.len());
        for column in row {
            let token = namer.sequenced(&column.name);
            params.push(&token, column.bound())?;
            placeholders.push(token);
        }
        groups.push(format!("({})", placeholders.join(",")));
    }

    Ok(AssembledStatement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES {}",
            fields.join(","),
            groups.join(",")
        ),
        params,
    })
}
