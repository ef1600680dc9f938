//! Result materializer tests.

use std::sync::Arc;

use rstest::{fixture, rstest};

use crate::artifact::{
    adapters::memory::{InMemoryArtifactStorage, StaticArtifactSource},
    domain::{ArtifactError, sha256_hex},
    services::{MaterializerSettings, ResultMaterializer},
};
use crate::test_support::FixedClock;

type TestMaterializer =
    ResultMaterializer<StaticArtifactSource, InMemoryArtifactStorage, FixedClock>;

const OUTPUT: &str = "https://cdn.example/out.png";

#[fixture]
fn storage() -> InMemoryArtifactStorage {
    InMemoryArtifactStorage::new("https://storage.example/public/")
}

fn materializer(
    source: StaticArtifactSource,
    storage: &InMemoryArtifactStorage,
) -> TestMaterializer {
    ResultMaterializer::new(
        Arc::new(source),
        Arc::new(storage.clone()),
        Arc::new(FixedClock::reference()),
        MaterializerSettings::default(),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn materialize_stores_bytes_under_sanitized_name(storage: InMemoryArtifactStorage) {
    let source =
        StaticArtifactSource::new().with_artifact(OUTPUT, b"png-bytes".to_vec(), Some("image/png"));
    let service = materializer(source, &storage);

    let stored = service
        .materialize(OUTPUT, "City Marathon!")
        .await
        .expect("materialization should succeed");

    let expected_path = "events/City_Marathon/1768469400000.png";
    assert_eq!(stored.path().as_str(), expected_path);
    assert_eq!(
        stored.reference(),
        "https://storage.example/public/events/City_Marathon/1768469400000.png"
    );
    assert_eq!(stored.checksum(), sha256_hex(b"png-bytes"));
    assert_eq!(stored.size(), 9);
    let object = storage.object(expected_path).expect("object stored");
    assert_eq!(object.bytes, b"png-bytes".to_vec());
    assert_eq!(object.content_type, "image/png");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn materialize_keeps_fetched_image_type(storage: InMemoryArtifactStorage) {
    let source =
        StaticArtifactSource::new().with_artifact(OUTPUT, b"jpeg".to_vec(), Some("image/jpeg"));
    let service = materializer(source, &storage);

    let stored = service
        .materialize(OUTPUT, "Harbour Swim")
        .await
        .expect("materialization should succeed");

    assert_eq!(stored.content_type(), "image/jpeg");
    assert!(stored.path().as_str().ends_with(".jpg"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn materialize_defaults_non_image_types(storage: InMemoryArtifactStorage) {
    let source = StaticArtifactSource::new().with_artifact(
        OUTPUT,
        b"bytes".to_vec(),
        Some("application/octet-stream"),
    );
    let service = materializer(source, &storage);

    let stored = service
        .materialize(OUTPUT, "")
        .await
        .expect("materialization should succeed");

    assert_eq!(stored.content_type(), "image/png");
    assert_eq!(stored.path().as_str(), "events/unnamed/1768469400000.png");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn materialize_overwrites_existing_objects(storage: InMemoryArtifactStorage) {
    let first = materializer(
        StaticArtifactSource::new().with_artifact(OUTPUT, b"first".to_vec(), None),
        &storage,
    );
    let second = materializer(
        StaticArtifactSource::new().with_artifact(OUTPUT, b"second".to_vec(), None),
        &storage,
    );

    first.materialize(OUTPUT, "Repeat").await.expect("first write");
    let stored = second.materialize(OUTPUT, "Repeat").await.expect("second write");

    let object = storage
        .object(stored.path().as_str())
        .expect("object stored");
    assert_eq!(object.bytes, b"second".to_vec());
    assert_eq!(storage.paths().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn materialize_propagates_fetch_failures(storage: InMemoryArtifactStorage) {
    let service = materializer(StaticArtifactSource::new(), &storage);

    let result = service.materialize(OUTPUT, "Missing").await;

    assert!(matches!(
        result,
        Err(ArtifactError::UnexpectedStatus { status: 404, .. })
    ));
    assert!(storage.paths().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn materialize_rejects_empty_downloads(storage: InMemoryArtifactStorage) {
    let source = StaticArtifactSource::new().with_artifact(OUTPUT, Vec::new(), Some("image/png"));
    let service = materializer(source, &storage);

    let result = service.materialize(OUTPUT, "Empty").await;

    assert!(matches!(result, Err(ArtifactError::EmptyBody(_))));
}
