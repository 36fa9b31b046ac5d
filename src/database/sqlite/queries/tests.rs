use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use tempfile::TempDir;

use super::*;

async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options)
        .await
        .expect("failed to open test database");
    sqlx::migrate!("src/database/sqlite/migrations")
        .run(&pool)
        .await
        .expect("migrations should run");
    (dir, pool)
}

fn sample_document() -> NewDocument {
    NewDocument::new(
        "agenda.txt".to_string(),
        "Registration opens at 8:30. The keynote starts at 9:00.".to_string(),
        vec![
            "Registration opens at 8:30.".to_string(),
            "The keynote starts at 9:00.".to_string(),
        ],
    )
}

#[tokio::test]
async fn insert_and_get_document() {
    let (_dir, pool) = test_pool().await;
    let new_document = sample_document();

    let inserted = DocumentQueries::insert(&pool, &new_document)
        .await
        .expect("insert should succeed");
    assert_eq!(inserted.id, new_document.id);
    assert_eq!(inserted.filename, "agenda.txt");
    assert_eq!(inserted.chunk_texts(), new_document.chunk_texts);

    let fetched = DocumentQueries::get_by_id(&pool, &new_document.id)
        .await
        .expect("get should succeed");
    assert_eq!(fetched, Some(inserted));
}

#[tokio::test]
async fn exists_by_filename_reflects_inserts() {
    let (_dir, pool) = test_pool().await;

    assert!(
        !DocumentQueries::exists_by_filename(&pool, "agenda.txt")
            .await
            .expect("exists check should succeed")
    );

    DocumentQueries::insert(&pool, &sample_document())
        .await
        .expect("insert should succeed");

    assert!(
        DocumentQueries::exists_by_filename(&pool, "agenda.txt")
            .await
            .expect("exists check should succeed")
    );
    assert_eq!(
        DocumentQueries::count(&pool)
            .await
            .expect("count should succeed"),
        1
    );
}

#[tokio::test]
async fn insert_batch_and_scan_with_filename() {
    let (_dir, pool) = test_pool().await;
    let document = DocumentQueries::insert(&pool, &sample_document())
        .await
        .expect("insert should succeed");

    let embeddings = vec![
        NewEmbedding::new(
            document.id.clone(),
            "Registration opens at 8:30.".to_string(),
            vec![1.0, 0.0],
            0,
        ),
        NewEmbedding::new(
            document.id.clone(),
            "The keynote starts at 9:00.".to_string(),
            vec![0.0, 1.0],
            1,
        ),
    ];

    let inserted = EmbeddingQueries::insert_batch(&pool, &embeddings)
        .await
        .expect("batch insert should succeed");
    assert_eq!(inserted, 2);

    let rows = EmbeddingQueries::scan_all_with_filename(&pool)
        .await
        .expect("scan should succeed");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.filename == "agenda.txt"));
    assert_eq!(rows[0].chunk_index, 0);
    assert_eq!(rows[0].vector(), Some(vec![1.0, 0.0]));
    assert_eq!(rows[1].chunk_index, 1);

    let by_document = EmbeddingQueries::list_by_document(&pool, &document.id)
        .await
        .expect("list should succeed");
    assert_eq!(by_document.len(), 2);
    assert_eq!(by_document[0].chunk_text, "Registration opens at 8:30.");
}

#[tokio::test]
async fn insert_batch_with_no_embeddings_is_noop() {
    let (_dir, pool) = test_pool().await;

    let inserted = EmbeddingQueries::insert_batch(&pool, &[])
        .await
        .expect("empty batch should succeed");
    assert_eq!(inserted, 0);
    assert_eq!(
        EmbeddingQueries::count(&pool)
            .await
            .expect("count should succeed"),
        0
    );
}

#[tokio::test]
async fn deleting_document_cascades_to_embeddings() {
    let (_dir, pool) = test_pool().await;
    let document = DocumentQueries::insert(&pool, &sample_document())
        .await
        .expect("insert should succeed");

    EmbeddingQueries::insert_batch(
        &pool,
        &[NewEmbedding::new(
            document.id.clone(),
            "Registration opens at 8:30.".to_string(),
            vec![1.0],
            0,
        )],
    )
    .await
    .expect("batch insert should succeed");

    let deleted = DocumentQueries::delete(&pool, &document.id)
        .await
        .expect("delete should succeed");
    assert!(deleted);
    assert_eq!(
        EmbeddingQueries::count(&pool)
            .await
            .expect("count should succeed"),
        0
    );
}
