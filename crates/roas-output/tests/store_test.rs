//! Integration tests for the model store.

use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use roas_data::Channel;
use roas_model::{
    BaselineTable, GbdtConfig, GbdtModel, LinearModel, Metrics, ModelKind, RidgeConfig,
    TrainedModel,
};
use roas_output::{
    CandidateMetrics, ChannelReport, ModelMetadata, ModelStore, SkipReason, TrainingReport,
};

const FEATURES: [&str; 2] = ["cost", "clicks"];

fn data() -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((40, 2), |(i, j)| (i * (j + 1)) as f64 + 1.0);
    let y = x.column(0).mapv(|c| 1.0 + 0.05 * c);
    (x, y)
}

fn gbdt() -> TrainedModel {
    let (x, y) = data();
    let config = GbdtConfig {
        n_estimators: 10,
        ..Default::default()
    };
    GbdtModel::fit(&x, &y, &FEATURES, config).unwrap().into()
}

fn linear() -> TrainedModel {
    let (x, y) = data();
    LinearModel::fit(&x, &y, &FEATURES, RidgeConfig::default())
        .unwrap()
        .into()
}

fn metadata(kind: ModelKind) -> ModelMetadata {
    let m = |rmse: f64| Metrics {
        rmse,
        mae: rmse / 2.0,
        r2: 0.5,
    };
    ModelMetadata::new(
        Channel::GoogleAds,
        kind,
        FEATURES.iter().map(|f| f.to_string()).collect(),
        (28, 6, 6).into(),
        CandidateMetrics {
            gradient_boosted: m(0.8),
            linear: m(0.9),
            baseline: m(1.0),
        },
        vec![("cost".into(), 0.9), ("clicks".into(), 0.1)],
    )
}

#[test]
fn test_model_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let (x, _) = data();

    let model = gbdt();
    let path = store.save_model(Channel::GoogleAds, &model).unwrap().unwrap();
    assert!(path.ends_with("roas_model_google_ads.json"));

    let loaded = store.load_model(Channel::GoogleAds).unwrap().unwrap();
    assert_eq!(loaded.kind(), ModelKind::GradientBoosted);
    let TrainedModel::GradientBoosted(original) = &model else {
        unreachable!()
    };
    let TrainedModel::GradientBoosted(reloaded) = &loaded else {
        panic!("expected a gradient-boosted model");
    };
    for row in x.rows() {
        assert_relative_eq!(
            original.predict_row(row),
            reloaded.predict_row(row),
            epsilon = 1e-9
        );
    }
    assert!(store.load_model(Channel::MetaAds).unwrap().is_none());
}

#[test]
fn test_stale_artifacts_removed() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path().join("models"));
    let channel = Channel::GoogleAds;

    store.save_model(channel, &gbdt()).unwrap();
    assert!(store.gbdt_path(channel).exists());

    store.save_model(channel, &linear()).unwrap();
    assert!(!store.gbdt_path(channel).exists());
    assert!(store.linear_path(channel).exists());
    assert_eq!(
        store.load_model(channel).unwrap().unwrap().kind(),
        ModelKind::Linear
    );

    let baseline = TrainedModel::from(BaselineTable::default());
    assert!(store.save_model(channel, &baseline).unwrap().is_none());
    assert!(!store.linear_path(channel).exists());
    assert!(store.load_model(channel).unwrap().is_none());
}

#[test]
fn test_metadata_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());

    let meta = metadata(ModelKind::GradientBoosted)
        .with_model_path(Some("models/roas_model_google_ads.json".into()));
    let path = store.save_metadata(&meta).unwrap();
    assert!(path.ends_with("roas_model_google_ads.meta.json"));

    let back = store.load_metadata(Channel::GoogleAds).unwrap().unwrap();
    assert_eq!(back.model_kind, ModelKind::GradientBoosted);
    assert_eq!(back.features, meta.features);
    assert_eq!(back.feature_importance.len(), 2);
    assert_relative_eq!(back.improvement_pct, 20.0, epsilon = 1e-9);
    assert_eq!(back.model_performance(), "R² 0.500, +20.0% vs baseline");
}

#[test]
fn test_report_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());

    let mut report = TrainingReport::new(90, 52);
    report.push(ChannelReport::Trained(metadata(ModelKind::Linear)));
    report.push(ChannelReport::Skipped {
        channel: Channel::MetaAds,
        reason: SkipReason::InsufficientData,
        rows: 12,
    });
    let path = store.save_report(&report).unwrap();
    assert!(path.ends_with("training_metrics.json"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"lookback_days\": 90"));

    let back = store.load_report().unwrap().unwrap();
    assert_eq!(back.channels.len(), 2);
    assert_eq!(back.trained_count(), 1);
    assert!(
        back.channel(Channel::GoogleAds)
            .and_then(ChannelReport::metadata)
            .is_some_and(|m| m.feature_importance.is_empty())
    );
}

#[test]
fn test_corrupt_artifact_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    std::fs::write(store.gbdt_path(Channel::GoogleAds), "not json").unwrap();
    assert!(store.load_model(Channel::GoogleAds).is_err());
}
