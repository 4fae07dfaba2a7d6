mod common;

use std::error::Error;
use std::io::{Cursor, Read};

use archive::{ArchiveError, DownloadPayload, build_download};
use bytes::Bytes;
use db::repositories::JobRepository;
use futures_util::StreamExt;
use print_core::{FileRef, JobStatus, PrintJob, PrintSide, PrintType, ShopId, TokenNumber};
use storage::{ArtifactStore, ArtifactStoreConfig};

async fn collect_body(payload: DownloadPayload) -> Result<Vec<u8>, ArchiveError> {
    let mut body = payload.into_body();
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf)
}

fn job_with_refs(shop_id: ShopId, token: &str, refs: Vec<FileRef>) -> PrintJob {
    PrintJob::new(
        shop_id,
        TokenNumber::new(token),
        PrintType::Bw,
        PrintSide::Single,
        refs,
    )
}

async fn put(store: &ArtifactStore, path: &str, content: &str) -> Result<(), Box<dyn Error>> {
    store
        .put_bytes(path, Bytes::from(content.to_string()))
        .await?;
    Ok(())
}

#[tokio::test]
async fn multi_file_batch_streams_as_a_zip() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;
    let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
    let shop_id = ShopId::new();
    let token = TokenNumber::new("T7K2M9");

    // two jobs holding one live file each, one job with no backing artifact
    put(&store, "uploads/a.pdf", "contents of a").await?;
    put(&store, "uploads/b.pdf", "contents of b").await?;
    JobRepository::create(&job_with_refs(
        shop_id,
        "T7K2M9",
        vec![FileRef::new("a.pdf", "uploads/a.pdf", 13)],
    ))
    .await?;
    JobRepository::create(&job_with_refs(
        shop_id,
        "T7K2M9",
        vec![FileRef::new("b.pdf", "uploads/b.pdf", 13)],
    ))
    .await?;
    JobRepository::create(&job_with_refs(
        shop_id,
        "T7K2M9",
        vec![FileRef::new("c.pdf", "uploads/c.pdf", 13).cleared()],
    ))
    .await?;

    let payload = build_download(&token, &store).await?;
    assert!(payload.is_archive());
    assert_eq!(payload.file_name(), "printjob-T7K2M9.zip");

    let bytes = collect_body(payload).await?;
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
    assert_eq!(zip.len(), 2);

    let mut names = Vec::new();
    for i in 0..zip.len() {
        names.push(zip.by_index(i)?.name().to_string());
    }
    names.sort();
    assert_eq!(names, vec!["a.pdf", "b.pdf"]);

    let mut content = String::new();
    zip.by_name("b.pdf")?.read_to_string(&mut content)?;
    assert_eq!(content, "contents of b");

    Ok(())
}

#[tokio::test]
async fn one_remaining_file_streams_without_a_zip_wrapper() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;
    let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
    let shop_id = ShopId::new();
    let token = TokenNumber::new("SINGLE");

    put(&store, "uploads/only.pdf", "the only file").await?;
    JobRepository::create(&job_with_refs(
        shop_id,
        "SINGLE",
        vec![FileRef::new("only.pdf", "uploads/only.pdf", 13)],
    ))
    .await?;

    let payload = build_download(&token, &store).await?;
    assert!(!payload.is_archive());
    assert_eq!(payload.file_name(), "only.pdf");

    let bytes = collect_body(payload).await?;
    assert_eq!(bytes, b"the only file");

    Ok(())
}

#[tokio::test]
async fn deleted_jobs_and_missing_artifacts_are_excluded() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;
    let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
    let shop_id = ShopId::new();

    // unknown token
    let err = build_download(&TokenNumber::new("NOPE00"), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));

    // a token whose only job is deleted
    let deleted = job_with_refs(
        shop_id,
        "DELETD",
        vec![FileRef::new("d.pdf", "uploads/d.pdf", 1)],
    );
    JobRepository::create(&deleted).await?;
    JobRepository::set_status_and_files(deleted.id, JobStatus::Deleted, deleted.cleared_files())
        .await?;
    let err = build_download(&TokenNumber::new("DELETD"), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));

    // paths that point at artifacts the store no longer holds are skipped;
    // when nothing is left the download is NotFound, not an empty zip
    JobRepository::create(&job_with_refs(
        shop_id,
        "GHOST1",
        vec![FileRef::new("ghost.pdf", "uploads/ghost.pdf", 1)],
    ))
    .await?;
    let err = build_download(&TokenNumber::new("GHOST1"), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));

    // a live file next to a missing one still downloads, alone
    put(&store, "uploads/live.pdf", "still here").await?;
    JobRepository::create(&job_with_refs(
        shop_id,
        "MIXED1",
        vec![
            FileRef::new("live.pdf", "uploads/live.pdf", 10),
            FileRef::new("ghost.pdf", "uploads/ghost2.pdf", 1),
        ],
    ))
    .await?;
    let payload = build_download(&TokenNumber::new("MIXED1"), &store).await?;
    assert!(!payload.is_archive());
    assert_eq!(payload.file_name(), "live.pdf");

    Ok(())
}

#[tokio::test]
async fn repeated_file_names_stay_distinct_in_the_zip() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;
    let store = ArtifactStore::new(ArtifactStoreConfig::memory())?;
    let shop_id = ShopId::new();
    let token = TokenNumber::new("DUPES1");

    put(&store, "uploads/1/scan.pdf", "first scan").await?;
    put(&store, "uploads/2/scan.pdf", "second scan").await?;
    JobRepository::create(&job_with_refs(
        shop_id,
        "DUPES1",
        vec![
            FileRef::new("scan.pdf", "uploads/1/scan.pdf", 10),
            FileRef::new("scan.pdf", "uploads/2/scan.pdf", 11),
        ],
    ))
    .await?;

    let payload = build_download(&token, &store).await?;
    let bytes = collect_body(payload).await?;
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
    assert_eq!(zip.len(), 2);

    let mut content = String::new();
    zip.by_name("scan.pdf")?.read_to_string(&mut content)?;
    assert_eq!(content, "first scan");
    content.clear();
    zip.by_name("scan (1).pdf")?.read_to_string(&mut content)?;
    assert_eq!(content, "second scan");

    Ok(())
}
