#![allow(dead_code)]

use sqlx_chainer::{ChainerConfig, RecordBuilder, StatementChain};

/// Connects to `DATABASE_URL`, or returns `None` so the calling test can skip.
pub async fn connect() -> Option<StatementChain> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let config = ChainerConfig::from_url(&url).expect("invalid DATABASE_URL");
    Some(
        StatementChain::connect(config)
            .await
            .expect("failed to connect to DATABASE_URL"),
    )
}

pub async fn records() -> Option<RecordBuilder> {
    connect().await.map(RecordBuilder::new)
}

/// (Re)creates a `users`-shaped table under `name`.
pub async fn users_table(chain: &mut StatementChain, name: &str) {
    chain
        .query(format!("DROP TABLE IF EXISTS `{name}`"))
        .await
        .expect("drop table");
    chain
        .query(format!(
            "CREATE TABLE `{name}` (
                id INT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                age INT NULL,
                active BOOLEAN NOT NULL DEFAULT FALSE,
                avatar BLOB NULL,
                created DATETIME NULL
            )"
        ))
        .await
        .expect("create table");
}

pub async fn drop_table(chain: &mut StatementChain, name: &str) {
    chain
        .query(format!("DROP TABLE IF EXISTS `{name}`"))
        .await
        .expect("drop table");
}
