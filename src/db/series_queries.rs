use sqlx::PgPool;

/// Raw JSON documents of one asset in insertion order.
pub async fn fetch_documents(
    pool: &PgPool,
    asset: &str,
) -> Result<Vec<serde_json::Value>, sqlx::Error> {
    sqlx::query_scalar::<_, serde_json::Value>(
        r#"
        SELECT body
        FROM asset_documents
        WHERE asset = $1
        ORDER BY id ASC
        "#,
    )
    .bind(asset)
    .fetch_all(pool)
    .await
}

pub async fn list_assets(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT asset FROM asset_documents ORDER BY asset",
    )
    .fetch_all(pool)
    .await
}
