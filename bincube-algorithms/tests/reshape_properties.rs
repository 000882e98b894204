#![allow(clippy::cast_precision_loss)]
use bincube_algorithms::{normalize_by_histogram, transform, Offsets, ReshapeOptions};
use bincube_core::{Axis, BinnedDataset};
use ndarray::{Array, Array1, IxDyn};
use std::collections::BTreeMap;

fn generate_dataset() -> BinnedDataset {
    let shape = [4, 6, 3, 5];
    let data = Array::from_shape_fn(IxDyn(&shape), |ix| {
        (ix[0] * 1000 + ix[1] * 100 + ix[2] * 10 + ix[3]) as f64 + 0.5
    });
    let labels = ["delayStage", "dldTime", "dldPosX", "dldPosY"];
    let axes = shape
        .iter()
        .zip(labels)
        .map(|(&n, label)| Axis::new(label, Array1::linspace(-1.0, 1.0, n)))
        .collect();
    let mut histograms = BTreeMap::new();
    histograms.insert(
        "delayStage".to_string(),
        Array1::from(vec![2.0, 8.0, 4.0, 0.0]),
    );
    BinnedDataset::new(data, axes, histograms).unwrap()
}

#[test]
fn test_identity_order_equals_normalized_only() {
    let dataset = generate_dataset();
    let options = ReshapeOptions::new().with_normalize_by("delayStage");

    let out = transform(&dataset, "texy", "texy", &options).unwrap();
    let expected = normalize_by_histogram(
        dataset.data(),
        dataset.histogram("delayStage").unwrap().view(),
    )
    .unwrap();

    assert_eq!(out.data(), &expected);
    assert_eq!(out.axes(), dataset.axes());
    assert_eq!(out.histograms(), dataset.histograms());
}

#[test]
fn test_reversal_involution() {
    let dataset = generate_dataset();
    let options = ReshapeOptions::new().with_revert("ty");

    for order_out in ["etxy", "yxet", "xtye", "texy"] {
        let there = transform(&dataset, "texy", order_out, &options).unwrap();
        let back = transform(&there, order_out, "texy", &options).unwrap();
        assert_eq!(back, dataset, "round trip through {order_out}");
    }
}

#[test]
fn test_output_order_matches_request() {
    let dataset = generate_dataset();
    let out = transform(&dataset, "texy", "yext", &ReshapeOptions::new()).unwrap();

    assert_eq!(out.shape(), &[5, 6, 3, 4]);
    let labels: Vec<&str> = out.axes().iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, ["dldPosY", "dldTime", "dldPosX", "delayStage"]);
    assert_eq!(out.data()[[4, 2, 1, 3]], dataset.data()[[3, 2, 1, 4]]);
}

#[test]
fn test_normalization_peak_frame_unchanged() {
    let dataset = generate_dataset();
    let options = ReshapeOptions::new().with_normalize_by("delayStage");
    let out = transform(&dataset, "texy", "texy", &options).unwrap();

    // Frame 1 holds the histogram maximum, so its weight is exactly 1.
    for (&a, &b) in out
        .data()
        .index_axis(ndarray::Axis(0), 1)
        .iter()
        .zip(dataset.data().index_axis(ndarray::Axis(0), 1).iter())
    {
        assert_eq!(a, b);
    }
    // Frame 0 has weight 0.25.
    assert_eq!(out.data()[[0, 1, 1, 1]], dataset.data()[[0, 1, 1, 1]] * 4.0);
    // Frame 3 has an empty histogram bin.
    assert!(out
        .data()
        .index_axis(ndarray::Axis(0), 3)
        .iter()
        .all(|&v| v == 0.0));
}

#[test]
fn test_input_not_mutated() {
    let dataset = generate_dataset();
    let snapshot = dataset.clone();
    let options = ReshapeOptions::new()
        .with_normalize_by("delayStage")
        .with_revert("te")
        .with_offsets(Offsets::default().with_time_zero(0.5).with_kx_center(1.0));

    let _ = transform(&dataset, "texy", "etxy", &options).unwrap();
    assert_eq!(dataset, snapshot);
}
