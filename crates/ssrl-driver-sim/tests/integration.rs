//! Integration tests for the simulated detector pipeline
//!
//! These tests drive the array detectors end to end: trigger, filesystem
//! output, read records and asset document collection.

use ndarray::{ArrayD, IxDyn};
use ssrl_core::{AssetCollector, AssetDoc, Movable, Readable, SimError, Triggerable};
use ssrl_driver_sim::*;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn ones_4x4() -> ArrayD<f64> {
    ArrayD::ones(IxDyn(&[4, 4]))
}

fn files_in(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files
}

/// Two triggers of a 4x4 detector write two files and issue two ids
#[test]
fn test_two_trigger_scenario() {
    let root = TempDir::new().unwrap();
    let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, ones_4x4)
        .with_filestore(FilestoreLayout::new(root.path()));

    let first = det.trigger().unwrap();
    assert_eq!(first.point_number, 1);
    let first_id = det.read().unwrap()["MarCCD"]
        .value
        .as_str()
        .unwrap()
        .to_string();

    let second = det.trigger().unwrap();
    assert_eq!(second.point_number, 2);
    let second_id = det.read().unwrap()["MarCCD"]
        .value
        .as_str()
        .unwrap()
        .to_string();

    assert_ne!(first_id, second_id);
    assert_eq!(det.point_number(), 2);

    let files = files_in(&root.path().join("tmp"));
    assert_eq!(files.len(), 2);
    assert!(files
        .iter()
        .all(|f| f.extension().and_then(|e| e.to_str()) == Some("tiff")));
}

/// N triggers yield exactly 2N documents across interleaved drains
#[test]
fn test_asset_doc_accounting() {
    let root = TempDir::new().unwrap();
    let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, ones_4x4)
        .with_filestore(FilestoreLayout::new(root.path()));

    let mut collected = Vec::new();
    let mut last_point = 0;
    for n in 1..=5 {
        let status = det.trigger().unwrap();
        assert_eq!(status.point_number, last_point + 1);
        last_point = status.point_number;

        if n % 2 == 0 {
            collected.extend(det.collect_asset_docs());
            assert_eq!(det.pending_asset_docs(), 0);
        }
    }
    collected.extend(det.collect_asset_docs());
    assert_eq!(det.pending_asset_docs(), 0);
    assert_eq!(collected.len(), 10);

    // resource, datum, resource, datum, ...
    for pair in collected.chunks(2) {
        match (&pair[0], &pair[1]) {
            (AssetDoc::Resource(resource), AssetDoc::Datum(datum)) => {
                assert_eq!(datum.resource, resource.uid);
                assert_eq!(resource.spec, "AD_TIFF");
                assert!(resource.directory().starts_with(root.path()));
                let path = TiffPersistence.resolve(resource, datum).unwrap();
                assert!(path.is_file(), "missing {path:?}");
            }
            other => panic!("unexpected document order: {other:?}"),
        }
    }

    let ids: HashSet<_> = collected
        .iter()
        .filter_map(|doc| match doc {
            AssetDoc::Datum(d) => Some(d.datum_id.clone()),
            AssetDoc::Resource(_) => None,
        })
        .collect();
    assert_eq!(ids.len(), 5);
}

/// Documents serialize to the tagged JSON shape
#[test]
fn test_documents_serialize() {
    let root = TempDir::new().unwrap();
    let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, ones_4x4)
        .with_filestore(FilestoreLayout::new(root.path()));
    det.trigger().unwrap();

    let docs: Vec<serde_json::Value> = det
        .collect_asset_docs()
        .map(|doc| serde_json::to_value(&doc).unwrap())
        .collect();
    assert_eq!(docs[0]["kind"], "resource");
    assert_eq!(docs[0]["doc"]["resource_path"], "tmp");
    assert_eq!(docs[0]["doc"]["path_semantics"], "windows");
    assert_eq!(docs[1]["kind"], "datum");
    assert_eq!(docs[1]["doc"]["datum_kwargs"]["point_number"], 1);
}

/// Read before trigger and missing filestore are hard failures
#[test]
fn test_precondition_failures() {
    let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, ones_4x4);
    assert!(matches!(det.read(), Err(SimError::NotTriggered { .. })));
    assert!(matches!(det.trigger(), Err(SimError::FilestoreUnset { .. })));

    let root = TempDir::new().unwrap();
    det.set_filestore(Some(FilestoreLayout::new(root.path())));
    det.trigger().unwrap();
    assert!(det.read().is_ok());
}

/// Unwritable root propagates an I/O error
#[test]
fn test_unwritable_root() {
    let root = TempDir::new().unwrap();
    let blocker = root.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();

    let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, ones_4x4)
        .with_filestore(FilestoreLayout::new(&blocker));
    assert!(matches!(det.trigger(), Err(SimError::Io(_))));
    assert_eq!(det.point_number(), 0);
}

/// Simulated image producer drives the TIFF detector
#[test]
fn test_image_producer_pipeline() {
    let root = TempDir::new().unwrap();
    let config = ImageProducerConfig {
        shape: (64, 64),
        ..Default::default()
    };
    let producer = producers::image_producer(config, Arc::new(SimRng::seeded(3)));
    let mut det = SynTiffDetector::new("MarCCD", TiffPersistence, producer)
        .with_filestore(FilestoreLayout::new(root.path()));

    det.trigger().unwrap();
    assert_eq!(det.get().unwrap().shape(), &[64, 64]);
    assert_eq!(det.describe().unwrap()["MarCCD"].shape, vec![64, 64]);
}

/// Sensor models follow shared axes
#[test]
fn test_sensors_share_axes() {
    let rng = SimRng::seeded(17);
    let stage_x = SynAxis::new("stage_x");
    let stage_y = SynAxis::new("stage_y");
    let stage_z = SynAxis::new("stage_z");
    let lrf = SynLaserRangeFinder::new(
        "lrf",
        stage_x.clone(),
        stage_y.clone(),
        SynAxis::new("plate_x"),
        SynAxis::new("plate_y"),
        &rng,
    );
    let pt_det = SynBeamStopDetector::new("ptDet", stage_z.clone(), &rng);

    stage_x.move_abs(100.0).unwrap();
    assert_eq!(lrf.get(), 10.0);
    stage_x.move_abs(0.0).unwrap();
    assert!(lrf.get() < 10.0);

    stage_z.move_abs(pt_det.height() - 20.0).unwrap();
    assert!((pt_det.get() - 1.0).abs() < 1e-6);
    stage_z.move_abs(pt_det.height() + 20.0).unwrap();
    assert!((pt_det.get() - (1.0 - pt_det.max_intensity())).abs() < 1e-6);
}

#[cfg(feature = "storage_hdf5")]
#[test]
fn test_hdf5_detector_pipeline() {
    let root = TempDir::new().unwrap();
    let rng = Arc::new(SimRng::seeded(4));
    let producer = producers::spectrum_producer(SpectrumProducerConfig::default(), rng);
    let mut det = SynHdf5Detector::new("Xspress3", Hdf5Persistence, producer)
        .with_filestore(FilestoreLayout::new(root.path()));

    det.trigger().unwrap();
    det.trigger().unwrap();

    let files = files_in(&root.path().join("tmp"));
    assert_eq!(files.len(), 2);
    assert!(files
        .iter()
        .all(|f| f.extension().and_then(|e| e.to_str()) == Some("h5")));
    assert_eq!(det.collect_asset_docs().count(), 4);
}
