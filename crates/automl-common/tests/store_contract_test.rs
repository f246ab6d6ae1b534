//! Keyed store behavior over the local filesystem.
//!
//! Every store type must agree between `keys`, `contains` and `get`, and
//! must treat a missing directory as an empty store.

use std::collections::BTreeSet;
use std::sync::Arc;

use automl_common::backend::context::{AwsContext, Context};
use automl_common::{
    LocalContext, ModelStore, NdArray, NumpyStore, PickleStore, PredictionsStore, Store,
    StoreError, StoreView,
};
use tempfile::TempDir;

fn local() -> Arc<dyn Context> {
    Arc::new(LocalContext::new())
}

fn key_set<S: StoreView>(store: &S) -> BTreeSet<String> {
    store.keys().unwrap().into_iter().collect()
}

fn assert_consistent<S: StoreView>(store: &S, expected: &[&str]) {
    let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(key_set(store), expected);
    assert_eq!(store.len().unwrap(), expected.len());
    for key in &expected {
        assert!(store.contains(key), "store should contain {key}");
    }
}

#[test]
fn test_numpy_store_on_disk() {
    let tmp = TempDir::new().unwrap();
    let store = NumpyStore::new(tmp.path().join("arrays"), local());
    assert_consistent(&store, &[]);
    assert!(store.is_empty().unwrap());

    let matrix = NdArray::new(vec![2, 3], vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    for key in ["a", "b", "c"] {
        store.insert(key, &matrix).unwrap();
    }

    assert_consistent(&store, &["a", "b", "c"]);
    assert!(tmp.path().join("arrays/a.npy").is_file());
    assert_eq!(store.get("b").unwrap(), matrix);
    assert!(!store.contains("d"));
    assert!(store.get("d").unwrap_err().is_not_found());
}

#[test]
fn test_predictions_store_only_lists_prediction_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("run");
    let store = PredictionsStore::new(&dir, local());

    store.insert("train", &NdArray::from_vec(vec![0i64, 1])).unwrap();
    store.insert("valid", &NdArray::from_vec(vec![1i64, 1])).unwrap();
    std::fs::write(dir.join("model"), b"{}").unwrap();
    std::fs::write(dir.join("targets.npy"), b"").unwrap();

    assert_consistent(&store, &["train", "valid"]);
    assert!(dir.join("predictions_train.npy").is_file());
    assert_eq!(
        store.get("valid").unwrap(),
        NdArray::from_vec(vec![1i64, 1])
    );
}

#[test]
fn test_pickle_store_is_strict() {
    let tmp = TempDir::new().unwrap();
    let store = PickleStore::<Vec<String>>::new(tmp.path().join("objects"), local());

    let value = vec!["x".to_string(), "y".to_string()];
    store.insert("pair", &value).unwrap();

    assert_consistent(&store, &["pair"]);
    assert_eq!(store.get("pair").unwrap(), value);
    assert!(matches!(
        store.get("missing"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_model_store_is_unstrict() {
    let tmp = TempDir::new().unwrap();
    let store = ModelStore::<Vec<f64>>::new(tmp.path().join("models"), local());

    store.insert("m1", &vec![0.25, 0.75]).unwrap();
    std::fs::create_dir_all(tmp.path().join("models/m2")).unwrap();

    assert_consistent(&store, &["m1"]);
    assert!(tmp.path().join("models/m1/model").is_file());
    assert_eq!(store.get("m1").unwrap(), Some(vec![0.25, 0.75]));
    assert_eq!(store.get("m2").unwrap(), None);
    assert_eq!(store.get("m3").unwrap(), None);
}

#[test]
fn test_filtered_model_store_view() {
    let tmp = TempDir::new().unwrap();
    let store = ModelStore::<u32>::new(tmp.path().join("models"), local());
    for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
        store.insert(key, &(i as u32)).unwrap();
    }

    let filtered = store.filtered(["b", "d", "z"]);
    assert_consistent(&filtered, &["b", "d"]);
    assert_eq!(filtered.get("d").unwrap(), Some(3));
    assert_eq!(filtered.get("z").unwrap(), None);

    match filtered.get("a").unwrap_err() {
        StoreError::InvalidKey { key, valid } => {
            assert_eq!(key, "a");
            assert_eq!(valid, vec!["b", "d", "z"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_remove_from_disk() {
    let tmp = TempDir::new().unwrap();
    let models = ModelStore::<u32>::new(tmp.path().join("models"), local());
    models.insert("a", &1).unwrap();
    models.remove("a").unwrap();
    assert!(!tmp.path().join("models/a").exists());
    assert_consistent(&models, &[]);

    let arrays = NumpyStore::new(tmp.path().join("arrays"), local());
    arrays.insert("x", &NdArray::from_vec(vec![1u8])).unwrap();
    arrays.remove("x").unwrap();
    assert!(arrays.remove("x").unwrap_err().is_not_found());
}

#[test]
fn test_stores_over_same_dir_see_each_other() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("shared");
    let writer = NumpyStore::new(&dir, local());
    let reader = NumpyStore::new(&dir, local());

    writer.insert("a", &NdArray::from_vec(vec![7i32])).unwrap();
    assert!(reader.contains("a"));
    assert_eq!(reader.get("a").unwrap(), NdArray::from_vec(vec![7i32]));
}

#[test]
fn test_corrupt_shape_header_is_codec_error() {
    let tmp = TempDir::new().unwrap();
    let store = NumpyStore::new(tmp.path().join("arrays"), local());

    let header = format!(
        "{{'descr': '|u1', 'fortran_order': False, 'shape': ({}, 2), }}\n",
        usize::MAX
    );
    let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    std::fs::create_dir_all(tmp.path().join("arrays")).unwrap();
    std::fs::write(store.path("huge"), bytes).unwrap();

    let err = store.get("huge").unwrap_err();
    assert!(err.is_codec(), "{err}");
    assert!(!err.is_not_found());
}

#[test]
fn test_high_rank_array_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let store = NumpyStore::new(tmp.path().join("arrays"), local());

    let array = NdArray::new(vec![1; 22000], vec![7u8]).unwrap();
    store.insert("deep", &array).unwrap();

    let back = store.get("deep").unwrap();
    assert_eq!(back.shape().len(), 22000);
    assert_eq!(back, array);
}

#[test]
fn test_placeholder_context_cannot_back_a_store() {
    let err = AwsContext::new("bucket")
        .map(|ctx| NumpyStore::new("arrays", Arc::new(ctx)))
        .unwrap_err();
    assert!(err.is_unimplemented());
    assert!(!err.is_not_found());
}

#[test]
fn test_remove_model_keeps_predictions_on_disk() {
    let tmp = TempDir::new().unwrap();
    let models = ModelStore::<u32>::new(tmp.path().join("models"), local());
    models.insert("a", &1).unwrap();
    models.insert("b", &2).unwrap();
    let accessor = models.accessor("a").unwrap();
    accessor
        .predictions()
        .insert("train", &NdArray::from_vec(vec![0.5f64]))
        .unwrap();

    models.remove("a").unwrap();
    assert!(!models.contains("a"));
    assert!(tmp.path().join("models/a/predictions_train.npy").is_file());
    assert_eq!(accessor.predictions().keys().unwrap(), vec!["train"]);

    models.remove("b").unwrap();
    assert!(!tmp.path().join("models/b").exists());
}

#[cfg(unix)]
#[test]
fn test_unaddressable_entries_are_not_listed() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("objects");
    let store = PickleStore::<u32>::new(&dir, local());
    store.insert("a", &1).unwrap();
    std::fs::write(dir.join("a\\b"), b"2").unwrap();

    assert_consistent(&store, &["a"]);
    assert!(!store.contains("a\\b"));
}
