//! Conformance checks for [`DataAvailability`] implementations.
//!
//! Every backend, and every proxy in front of one, must pass the same suite.
//! The checks assume the backend is used exclusively by the suite (in-memory
//! store, devnet, ...), so heights can be scanned to find submitted data.
//!
//! ```ignore
//! #[tokio::test(flavor = "multi_thread")]
//! async fn conformance() {
//!     da_test_suite::run_da_test_suite(Arc::new(MyBackend::new())).await;
//! }
//! ```

use da::{decode_height, Blob, DaError, DataAvailability, Id, SubmitOptions};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// How long [`get_ids_test`] scans heights before giving up.
const SCAN_TIMEOUT: Duration = Duration::from_secs(1);

/// Number of submissions (and height scans) in [`concurrent_read_write_test`].
const CONCURRENT_ROUNDS: u64 = 100;

/// Blob submitted by the writer in [`concurrent_read_write_test`].
const CONCURRENT_BLOB: &[u8] = b"test";

fn test_options() -> SubmitOptions {
    SubmitOptions::with_namespace(vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0])
}

/// Run all checks against the given backend.
pub async fn run_da_test_suite<D>(da: Arc<D>)
where
    D: DataAvailability + ?Sized + 'static,
{
    info!("Running basic DA test");
    basic_da_test(da.as_ref()).await;
    info!("Running get IDs test");
    get_ids_test(da.as_ref()).await;
    info!("Running error checks");
    check_errors(da.as_ref()).await;
    info!("Running commitment test");
    commitment_test(da.as_ref()).await;
    info!("Running validate length mismatch test");
    validate_length_mismatch_test(da.as_ref()).await;
    info!("Running concurrent read/write test");
    concurrent_read_write_test(da).await;
}

/// Round trip of messages to DA and back, plus proof validation.
pub async fn basic_da_test<D: DataAvailability + ?Sized>(da: &D) {
    let msg1: Blob = b"message 1".to_vec();
    let msg2: Blob = b"message 2".to_vec();
    let options = test_options();

    let r1 = da
        .submit(&[msg1.clone()], Some(&options))
        .await
        .expect("submit message 1");
    assert_eq!(r1.ids.len(), 1);
    assert_eq!(r1.proofs.len(), 1);
    assert!(!r1.ids[0].is_empty());
    assert!(!r1.proofs[0].is_empty());

    let r2 = da
        .submit(&[msg2.clone()], Some(&options))
        .await
        .expect("submit message 2");
    assert_eq!(r2.ids.len(), 1);
    assert!(!r2.proofs[0].is_empty());

    let r3 = da
        .submit(&[msg1.clone()], Some(&options))
        .await
        .expect("resubmit message 1");
    assert_eq!(r3.ids.len(), 1);
    assert!(!r3.proofs[0].is_empty());

    assert_ne!(r1.ids, r2.ids);
    assert_ne!(r1.ids, r3.ids);
    assert_ne!(r2.ids, r3.ids);

    let ret = da.get(&r1.ids).await.expect("get message 1");
    assert_eq!(ret, vec![msg1.clone()]);
    let ret = da.get(&r3.ids).await.expect("get resubmitted message 1");
    assert_eq!(ret, vec![msg1.clone()]);

    let commitment1 = da.commit(&[msg1]).await.expect("commit message 1");
    assert_eq!(commitment1.len(), 1);
    assert!(!commitment1[0].is_empty());
    let commitment2 = da.commit(&[msg2]).await.expect("commit message 2");
    assert_eq!(commitment2.len(), 1);
    assert_ne!(commitment1, commitment2);

    let oks = da.validate(&r1.ids, &r1.proofs).await.expect("validate 1");
    assert_eq!(oks, vec![true]);
    let oks = da.validate(&r2.ids, &r2.proofs).await.expect("validate 2");
    assert_eq!(oks, vec![true]);

    let oks = da.validate(&r1.ids, &r2.proofs).await.expect("validate 1/2");
    assert_eq!(oks, vec![false]);
    let oks = da.validate(&r2.ids, &r1.proofs).await.expect("validate 2/1");
    assert_eq!(oks, vec![false]);
}

/// A submitted batch is visible as a whole at exactly one height.
pub async fn get_ids_test<D: DataAvailability + ?Sized>(da: &D) {
    let msgs: Vec<Blob> = vec![b"msg1".to_vec(), b"msg2".to_vec(), b"msg3".to_vec()];

    let result = da
        .submit(&msgs, Some(&test_options()))
        .await
        .expect("submit batch");
    assert_eq!(result.ids.len(), msgs.len());
    assert_eq!(result.proofs.len(), msgs.len());

    let mut found = false;
    let deadline = Instant::now() + SCAN_TIMEOUT;
    let mut height = 1;
    while !found && Instant::now() < deadline {
        let ids = match da.get_ids(height).await {
            Ok(ids) => ids,
            Err(DaError::FutureHeight) => break,
            Err(e) => panic!("failed to get IDs at height {height}: {e}"),
        };
        if ids.contains(&result.ids[0]) {
            // Submit is atomic, so the whole batch shares this height.
            assert_eq!(ids, result.ids);
            let blobs = da.get(&ids).await.expect("get batch");
            assert_eq!(blobs, msgs);
            found = true;
        }
        height += 1;
    }

    assert!(found, "submitted batch not found at any height");
}

/// Malformed and unknown IDs fail without a partial result.
pub async fn check_errors<D: DataAvailability + ?Sized>(da: &D) {
    let err = da
        .get(&[b"invalid".to_vec()])
        .await
        .expect_err("get with malformed ID must fail");
    assert!(
        matches!(err, DaError::InvalidId | DaError::BlobNotFound),
        "unexpected error for malformed ID: {err:?}"
    );

    let mut unknown: Id = u64::MAX.to_le_bytes().to_vec();
    unknown.extend_from_slice(&[0u8; 32]);
    let err = da
        .get(&[unknown])
        .await
        .expect_err("get with unknown ID must fail");
    assert!(
        matches!(err, DaError::BlobNotFound | DaError::InvalidId),
        "unexpected error for unknown ID: {err:?}"
    );
}

/// Commitments depend on content only.
pub async fn commitment_test<D: DataAvailability + ?Sized>(da: &D) {
    let blob: Blob = b"commitment blob".to_vec();

    let before = da.commit(&[blob.clone()]).await.expect("commit");
    da.submit(&[blob.clone()], Some(&test_options()))
        .await
        .expect("submit");
    let after = da.commit(&[blob.clone(), blob]).await.expect("commit twice");

    assert_eq!(after.len(), 2);
    assert_eq!(before[0], after[0]);
    assert_eq!(after[0], after[1]);

    let empty = da.commit(&[]).await.expect("commit nothing");
    assert!(empty.is_empty());
}

/// `validate` rejects mismatched input lengths as a whole.
pub async fn validate_length_mismatch_test<D: DataAvailability + ?Sized>(da: &D) {
    let result = da
        .submit(&[b"a".to_vec(), b"b".to_vec()], Some(&test_options()))
        .await
        .expect("submit");

    let err = da
        .validate(&result.ids, &result.proofs[..1])
        .await
        .expect_err("validate with fewer proofs must fail");
    assert_eq!(err, DaError::LengthMismatch);

    let err = da
        .validate(&result.ids[..1], &result.proofs)
        .await
        .expect_err("validate with fewer IDs must fail");
    assert_eq!(err, DaError::LengthMismatch);
}

/// Interleaved submissions and height scans must not corrupt the store.
///
/// Every height the reader sees populated must match a completed submission:
/// IDs carry the height they were listed at, and a height holding a writer's
/// ID holds exactly that one-blob batch.
pub async fn concurrent_read_write_test<D>(da: Arc<D>)
where
    D: DataAvailability + ?Sized + 'static,
{
    let reader_da = Arc::clone(&da);
    let reader = tokio::spawn(async move {
        let mut observed = Vec::new();
        for height in 1..=CONCURRENT_ROUNDS {
            match reader_da.get_ids(height).await {
                Ok(ids) if ids.is_empty() => {}
                Ok(ids) => {
                    let blobs = reader_da.get(&ids).await.expect("get scanned IDs");
                    assert_eq!(blobs.len(), ids.len());
                    observed.push((height, ids, blobs));
                }
                Err(DaError::FutureHeight) => {}
                Err(e) => panic!("get_ids({height}) failed: {e}"),
            }
        }
        observed
    });

    let writer_da = Arc::clone(&da);
    let writer = tokio::spawn(async move {
        let mut ids = Vec::new();
        for _ in 0..CONCURRENT_ROUNDS {
            let result = writer_da
                .submit(&[CONCURRENT_BLOB.to_vec()], Some(&test_options()))
                .await
                .expect("concurrent submit");
            assert_eq!(result.ids.len(), 1);
            ids.extend(result.ids);
        }
        ids
    });

    let observed = reader.await.expect("reader task panicked");
    let ids = writer.await.expect("writer task panicked");

    let unique: HashSet<&Id> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "IDs must be unique across submissions");

    for (height, scanned, blobs) in observed {
        for id in &scanned {
            assert_eq!(
                decode_height(id).expect("scanned ID"),
                height,
                "ID listed at height {height} carries another height"
            );
        }
        if scanned.iter().any(|id| unique.contains(id)) {
            assert_eq!(scanned.len(), 1, "height {height} holds a torn batch");
            assert_eq!(blobs, vec![CONCURRENT_BLOB.to_vec()]);
        }
    }
}
