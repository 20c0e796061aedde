mod common;

use sqlx_chainer::{ColumnValue, Error, ParamType, RecordBuilder, Selection, Value};

async fn setup(table: &str) -> Option<RecordBuilder> {
    let mut records = common::records().await?;
    common::users_table(records.chain_mut(), table).await;
    Some(records)
}

async fn teardown(mut records: RecordBuilder, table: &str) {
    common::drop_table(records.chain_mut(), table).await;
}

#[tokio::test]
async fn test_insert_then_select() {
    let table = "records_insert";
    let Some(mut records) = setup(table).await else {
        return;
    };

    let id = records
        .insert(
            table,
            &[ColumnValue::new("name", "Ann"), ColumnValue::int("age", 30)],
        )
        .await
        .unwrap();
    assert!(id > 0);

    let row = records
        .select(
            &format!("SELECT * FROM {table} WHERE id = :id"),
            1,
            &[ColumnValue::int("id", id)],
        )
        .await
        .unwrap()
        .into_row()
        .unwrap();
    assert_eq!(row.get("name"), Some(&Value::Text("Ann".into())));
    assert_eq!(row.get("age"), Some(&Value::Int(30)));
    assert_eq!(row.get("id").and_then(Value::as_i64), i64::try_from(id).ok());

    teardown(records, table).await;
}

#[tokio::test]
async fn test_insert_id_is_per_statement() {
    let table = "records_ids";
    let plain = "records_ids_plain";
    let Some(mut records) = setup(table).await else {
        return;
    };
    records
        .chain_mut()
        .query(format!("CREATE TABLE IF NOT EXISTS `{plain}` (code VARCHAR(10) PRIMARY KEY)"))
        .await
        .unwrap();

    let id = records
        .insert(table, &[ColumnValue::new("name", "Ann")])
        .await
        .unwrap();
    records
        .select_one(&format!("SELECT * FROM {table}"), &[])
        .await
        .unwrap();
    assert_eq!(records.chain().last_insert_id(), Some(id));

    let none = records
        .insert(plain, &[ColumnValue::new("code", "x")])
        .await
        .unwrap();
    assert_eq!(none, 0);
    assert_eq!(records.chain().last_insert_id(), Some(id));

    common::drop_table(records.chain_mut(), plain).await;
    teardown(records, table).await;
}

#[tokio::test]
async fn test_insert_typed_values() {
    let table = "records_typed";
    let Some(mut records) = setup(table).await else {
        return;
    };

    let id = records
        .insert(
            table,
            &[
                ColumnValue::new("name", "Bob"),
                ColumnValue::null("age"),
                ColumnValue::boolean("active", "1"),
                ColumnValue::blob("avatar", vec![0_u8, 159, 146, 150]),
                ColumnValue::new("created", "2024-05-06 07:08:09"),
            ],
        )
        .await
        .unwrap();

    let row = records
        .select_one(
            &format!("SELECT age, active, avatar, created FROM {table} WHERE id = :id"),
            &[ColumnValue::int("id", id)],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("age"), Some(&Value::Null));
    assert_eq!(row.get("active"), Some(&Value::Bool(true)));
    assert_eq!(row.get("avatar"), Some(&Value::Blob(vec![0, 159, 146, 150])));
    assert_eq!(row.get("created"), Some(&Value::Text("2024-05-06 07:08:09".into())));

    teardown(records, table).await;
}

#[tokio::test]
async fn test_update_with_shared_column_name() {
    let table = "records_update";
    let Some(mut records) = setup(table).await else {
        return;
    };

    let rows: Vec<_> = ["Ann", "Bob", "Cid"]
        .iter()
        .map(|name| vec![ColumnValue::new("name", *name), ColumnValue::int("age", 20)])
        .collect();
    records.insert_multi(table, &rows).await.unwrap();

    // SET `age` = :age ... WHERE `age` = :age1 must keep both values apart.
    let affected = records
        .update(
            table,
            &[ColumnValue::int("age", 21)],
            &[ColumnValue::int("age", 20), ColumnValue::new("name", "Bob")],
            1,
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let bob = records
        .select_one(
            &format!("SELECT age FROM {table} WHERE name = :name"),
            &[ColumnValue::new("name", "Bob")],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob.get("age"), Some(&Value::Int(21)));

    teardown(records, table).await;
}

#[tokio::test]
async fn test_update_limit_without_conditions() {
    let table = "records_update_all";
    let Some(mut records) = setup(table).await else {
        return;
    };

    let rows: Vec<_> = (0..4)
        .map(|i| vec![ColumnValue::new("name", format!("u{i}")), ColumnValue::int("age", i)])
        .collect();
    records.insert_multi(table, &rows).await.unwrap();

    let affected = records
        .update(table, &[ColumnValue::int("age", 99)], &[], 2)
        .await
        .unwrap();
    assert_eq!(affected, 2);

    teardown(records, table).await;
}

#[tokio::test]
async fn test_delete_counts_rows() {
    let table = "records_delete";
    let Some(mut records) = setup(table).await else {
        return;
    };

    let id = records
        .insert(table, &[ColumnValue::new("name", "Ann")])
        .await
        .unwrap();

    let deleted = records
        .delete(table, &[ColumnValue::int("id", id)], 1)
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let again = records
        .delete(table, &[ColumnValue::int("id", id)], 1)
        .await
        .unwrap();
    assert_eq!(again, 0);

    teardown(records, table).await;
}

#[tokio::test]
async fn test_insert_multi_and_select_shapes() {
    let table = "records_multi";
    let Some(mut records) = setup(table).await else {
        return;
    };

    let rows: Vec<_> = ["Ann", "Bob", "Cid"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            vec![
                ColumnValue::new("name", *name),
                ColumnValue::typed("age", i as i64 + 30, ParamType::Int),
            ]
        })
        .collect();
    let id = records.insert_multi(table, &rows).await.unwrap();
    assert!(id > 0);
    assert_eq!(records.chain().row_count().unwrap(), 3);

    let sql = format!("SELECT name FROM {table} ORDER BY id");
    match records.select(&sql, 2, &[]).await.unwrap() {
        Selection::Many(all) => {
            let names: Vec<_> = all.iter().filter_map(|r| r.get("name")).collect();
            assert_eq!(
                names,
                vec![
                    &Value::Text("Ann".into()),
                    &Value::Text("Bob".into()),
                    &Value::Text("Cid".into()),
                ]
            );
        }
        other => panic!("expected many rows, got {other:?}"),
    }

    match records.select(&sql, 1, &[]).await.unwrap() {
        Selection::One(Some(row)) => assert_eq!(row.get("name"), Some(&Value::Text("Ann".into()))),
        other => panic!("expected one row, got {other:?}"),
    }

    let missing = format!("SELECT name FROM {table} WHERE id = :id");
    assert_eq!(
        records.select(&missing, 1, &[ColumnValue::int("id", 0)]).await.unwrap(),
        Selection::One(None)
    );
    assert_eq!(
        records.select(&missing, 5, &[ColumnValue::int("id", 0)]).await.unwrap(),
        Selection::Many(Vec::new())
    );

    teardown(records, table).await;
}

#[tokio::test]
async fn test_generation_errors_do_not_touch_the_database() {
    let Some(mut records) = common::records().await else {
        return;
    };
    assert!(matches!(
        records.delete("anything", &[], 1).await,
        Err(Error::EmptyConditions { .. })
    ));
    assert!(matches!(
        records.insert("anything", &[]).await,
        Err(Error::EmptyColumns { .. })
    ));
    let rows = vec![vec![ColumnValue::new("a", 1)], vec![ColumnValue::new("b", 2)]];
    assert!(matches!(
        records.insert_multi("anything", &rows).await,
        Err(Error::HeterogeneousRow { row: 1 })
    ));
    assert!(records.chain().statement().is_none());
}
