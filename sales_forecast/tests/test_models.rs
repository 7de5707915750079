use chrono::{Datelike, Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;
use sales_forecast::data::SalesSeries;
use sales_forecast::features::FeatureSet;
use sales_forecast::models::random_forest::MAX_TREES;
use sales_forecast::models::seasonal_ets::{MAX_HISTORY_DAYS, MAX_HORIZON_DAYS};
use sales_forecast::models::{
    train_series, ForecastModel, ModelKind, RandomForest, RandomForestConfig, SeasonalEts,
    SeasonalEtsConfig, TrainedForecastModel, TrainingRequest,
};
use sales_forecast::{predict_range, ForecastError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily sales with a weekend bump and a small deterministic wiggle
fn weekly_series(days: i64) -> SalesSeries {
    let start = date(2023, 1, 2);
    let dates: Vec<NaiveDate> = (0..days).map(|i| start + Duration::days(i)).collect();
    let values = dates
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let weekend = if d.weekday().num_days_from_monday() >= 5 {
                50.0
            } else {
                0.0
            };
            100.0 + weekend + (i % 3) as f64
        })
        .collect();
    SalesSeries::from_pairs(dates, values).unwrap()
}

#[test]
fn test_random_forest_learns_weekly_pattern() {
    let series = weekly_series(70);
    let model = RandomForest::new(RandomForestConfig {
        n_trees: 20,
        ..RandomForestConfig::default()
    })
    .unwrap();
    assert_eq!(model.name(), "Random Forest (trees=20)");

    let outcome = model.train(&series).unwrap();
    assert_eq!(outcome.train_size, 56);
    assert_eq!(outcome.test_size, 14);
    assert!(outcome.metrics.mse.is_finite());
    assert!(outcome.metrics.rmse >= 0.0);

    // 2023-04-15 is a Saturday, 2023-04-12 a Wednesday
    let predictions = outcome
        .model
        .predict_dates(&[date(2023, 4, 15), date(2023, 4, 12)])
        .unwrap();
    assert_eq!(predictions.len(), 2);
    assert!(predictions.iter().all(|p| (100.0..=152.0).contains(p)));
    assert!(predictions[0] > predictions[1]);

    assert_eq!(outcome.model.kind(), ModelKind::RandomForest);
    assert_eq!(outcome.model.features(), &FeatureSet::default());
    assert!(outcome.model.predict_dates(&[]).unwrap().is_empty());
}

#[test]
fn test_random_forest_is_reproducible_with_seed() {
    let series = weekly_series(42);
    let config = RandomForestConfig {
        n_trees: 10,
        seed: 7,
        ..RandomForestConfig::default()
    };

    let first = RandomForest::new(config.clone()).unwrap().train(&series).unwrap();
    let second = RandomForest::new(config).unwrap().train(&series).unwrap();

    let dates = [date(2023, 3, 1), date(2023, 3, 4)];
    assert_eq!(
        first.model.predict_dates(&dates).unwrap(),
        second.model.predict_dates(&dates).unwrap()
    );
    assert_eq!(first.metrics, second.metrics);
}

#[test]
fn test_random_forest_without_intervals() {
    let series = weekly_series(21);
    let outcome = RandomForest::new(RandomForestConfig {
        n_trees: 5,
        ..RandomForestConfig::default()
    })
    .unwrap()
    .train(&series)
    .unwrap();

    let forecasts = outcome.model.predict_intervals(&[date(2023, 2, 1)]).unwrap();
    assert_eq!(forecasts.len(), 1);
    assert!(forecasts[0].lower.is_none());
    assert!(forecasts[0].upper.is_none());
}

#[rstest]
#[case(RandomForestConfig { n_trees: 0, ..RandomForestConfig::default() })]
#[case(RandomForestConfig { n_trees: MAX_TREES + 1, ..RandomForestConfig::default() })]
#[case(RandomForestConfig { test_ratio: 0.0, ..RandomForestConfig::default() })]
#[case(RandomForestConfig { test_ratio: 1.0, ..RandomForestConfig::default() })]
#[case(RandomForestConfig { min_samples_leaf: 0, ..RandomForestConfig::default() })]
#[case(RandomForestConfig { min_samples_split: 1, ..RandomForestConfig::default() })]
fn test_random_forest_rejects_invalid_config(#[case] config: RandomForestConfig) {
    assert!(matches!(
        RandomForest::new(config),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_seasonal_ets_forecasts_after_history() {
    let series = weekly_series(56);
    let model = SeasonalEts::new(SeasonalEtsConfig::default()).unwrap();
    let outcome = model.train(&series).unwrap();

    assert_eq!(outcome.test_size, 12);
    assert_eq!(outcome.train_size, 44);
    assert!(outcome.metrics.mae.is_finite());

    let trained = outcome.model;
    assert_eq!(trained.kind(), ModelKind::SeasonalEts);
    assert_eq!(trained.last_date(), date(2023, 2, 26));
    assert!(trained.is_seasonal());

    let dates: Vec<NaiveDate> = (1..=7).map(|i| trained.last_date() + Duration::days(i)).collect();
    let forecasts = trained.predict_intervals(&dates).unwrap();
    assert_eq!(forecasts.len(), 7);
    assert!(forecasts.iter().all(|f| f.value.is_finite()));

    let points = trained.predict_dates(&dates[3..]).unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[0], forecasts[3].value);
}

#[test]
fn test_seasonal_ets_rejects_past_dates() {
    let series = weekly_series(28);
    let trained = SeasonalEts::new(SeasonalEtsConfig::default())
        .unwrap()
        .train(&series)
        .unwrap()
        .model;

    let last = trained.last_date();
    assert!(matches!(
        trained.predict_dates(&[last]),
        Err(ForecastError::ValidationError(_))
    ));
    assert!(trained.predict_dates(&[]).unwrap().is_empty());
}

#[test]
fn test_seasonal_ets_limits_horizon() {
    let series = weekly_series(28);
    let trained = SeasonalEts::new(SeasonalEtsConfig::default())
        .unwrap()
        .train(&series)
        .unwrap()
        .model;
    let last = trained.last_date();
    assert_eq!(trained.forecast_origin(), Some(last));

    let too_far = last + Duration::days(MAX_HORIZON_DAYS as i64 + 1);
    assert!(matches!(
        trained.predict_dates(&[too_far]),
        Err(ForecastError::ValidationError(_))
    ));

    // A single far-future day passes the day count but not the horizon
    let far_future = date(9999, 12, 31);
    let result = predict_range(&trained, far_future, far_future, 366);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));

    let edge = last + Duration::days(366);
    assert!(matches!(
        predict_range(&trained, edge, edge + Duration::days(1), 366),
        Err(ForecastError::ValidationError(_))
    ));
    assert_eq!(predict_range(&trained, edge, edge, 366).unwrap().len(), 1);
}

#[test]
fn test_seasonal_ets_rejects_wide_span() {
    let start = date(1900, 1, 1);
    let end = start + Duration::days(MAX_HISTORY_DAYS as i64);
    let dates = vec![
        start,
        start + Duration::days(1),
        end - Duration::days(1),
        end,
    ];
    let series = SalesSeries::from_pairs(dates, vec![10.0, 12.0, 11.0, 13.0]).unwrap();

    let result = SeasonalEts::new(SeasonalEtsConfig::default())
        .unwrap()
        .train(&series);
    assert!(matches!(result, Err(ForecastError::DataError(_))));

    // Random forests only see the observed rows
    let request = TrainingRequest {
        n_trees: Some(5),
        test_ratio: Some(0.5),
        ..TrainingRequest::default()
    };
    assert!(train_series(&series, &request).is_ok());
}

#[test]
fn test_seasonal_ets_short_history() {
    let series = weekly_series(10);
    let trained = SeasonalEts::new(SeasonalEtsConfig::default())
        .unwrap()
        .train(&series)
        .unwrap()
        .model;
    assert!(!trained.is_seasonal());

    let series = weekly_series(3);
    assert!(matches!(
        SeasonalEts::new(SeasonalEtsConfig::default())
            .unwrap()
            .train(&series),
        Err(ForecastError::DataError(_))
    ));
}

#[rstest]
#[case(SeasonalEtsConfig { season_length: 1, ..SeasonalEtsConfig::default() })]
#[case(SeasonalEtsConfig { season_length: 400, ..SeasonalEtsConfig::default() })]
#[case(SeasonalEtsConfig { test_ratio: 1.5, ..SeasonalEtsConfig::default() })]
#[case(SeasonalEtsConfig { confidence_level: 1.0, ..SeasonalEtsConfig::default() })]
fn test_seasonal_ets_rejects_invalid_config(#[case] config: SeasonalEtsConfig) {
    assert!(matches!(
        SeasonalEts::new(config),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[rstest]
#[case("random_forest", ModelKind::RandomForest)]
#[case("RF", ModelKind::RandomForest)]
#[case("seasonal_ets", ModelKind::SeasonalEts)]
#[case(" ets ", ModelKind::SeasonalEts)]
fn test_model_kind_from_str(#[case] text: &str, #[case] expected: ModelKind) {
    assert_eq!(text.parse::<ModelKind>().unwrap(), expected);
}

#[test]
fn test_model_kind_unknown() {
    assert!(matches!(
        "prophet".parse::<ModelKind>(),
        Err(ForecastError::ValidationError(_))
    ));
    assert_eq!(ModelKind::default(), ModelKind::RandomForest);
    assert_eq!(ModelKind::SeasonalEts.to_string(), "seasonal_ets");
}

#[test]
fn test_train_series_dispatches_on_kind() {
    let series = weekly_series(35);

    let request = TrainingRequest {
        n_trees: Some(10),
        ..TrainingRequest::default()
    };
    let report = train_series(&series, &request).unwrap();
    assert_eq!(report.model.kind(), ModelKind::RandomForest);
    assert_eq!(report.observations, 35);
    assert_eq!(report.first_date, date(2023, 1, 2));
    assert_eq!(report.last_date, date(2023, 2, 5));
    assert_eq!(report.train_size + report.test_size, 35);

    let request = TrainingRequest {
        kind: ModelKind::SeasonalEts,
        season_length: Some(7),
        ..TrainingRequest::default()
    };
    let report = train_series(&series, &request).unwrap();
    assert_eq!(report.model.kind(), ModelKind::SeasonalEts);
    assert!(report.model.name().starts_with("Seasonal ETS"));

    let request = TrainingRequest {
        test_ratio: Some(0.0),
        ..TrainingRequest::default()
    };
    assert!(train_series(&series, &request).is_err());
}
