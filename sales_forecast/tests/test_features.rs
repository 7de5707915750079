use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sales_forecast::features::{date_range, CalendarFeature, FeatureSet};
use sales_forecast::ForecastError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_default_features_match_calendar() {
    let features = FeatureSet::default();
    assert_eq!(
        features.features(),
        &[
            CalendarFeature::DayOfWeek,
            CalendarFeature::DayOfMonth,
            CalendarFeature::Month
        ]
    );

    // 2023-01-02 is a Monday
    assert_eq!(features.row(date(2023, 1, 2)), vec![0.0, 2.0, 1.0]);
    // 2024-01-06 is a Saturday
    assert_eq!(features.row(date(2024, 1, 6)), vec![5.0, 6.0, 1.0]);
}

#[rstest]
#[case(CalendarFeature::Year, 2023.0)]
#[case(CalendarFeature::DayOfYear, 1.0)]
#[case(CalendarFeature::WeekOfYear, 52.0)]
#[case(CalendarFeature::IsWeekend, 1.0)]
#[case(CalendarFeature::DayOfWeek, 6.0)]
fn test_feature_values_on_new_year(#[case] feature: CalendarFeature, #[case] expected: f64) {
    // 2023-01-01 is a Sunday in ISO week 52 of 2022
    assert_eq!(feature.value(date(2023, 1, 1)), expected);
}

#[test]
fn test_parse_feature_list() {
    let features = FeatureSet::parse_list("day_of_week, month ,is_weekend").unwrap();
    assert_eq!(
        features.features(),
        &[
            CalendarFeature::DayOfWeek,
            CalendarFeature::Month,
            CalendarFeature::IsWeekend
        ]
    );
    assert_eq!(features.len(), 3);

    assert!(matches!(
        FeatureSet::parse_list("day_of_week,hour"),
        Err(ForecastError::ValidationError(_))
    ));
    assert!(FeatureSet::parse_list("").is_err());
    assert!(FeatureSet::parse_list("month,month").is_err());
}

#[test]
fn test_feature_names_round_trip() {
    for feature in CalendarFeature::ALL {
        let parsed: CalendarFeature = feature.to_string().parse().unwrap();
        assert_eq!(parsed, feature);

        let json = serde_json::to_string(&feature).unwrap();
        assert_eq!(json, format!("\"{}\"", feature.as_str()));
    }
}

#[test]
fn test_matrix_shape() {
    let features = FeatureSet::default();
    let dates = date_range(date(2023, 1, 30), date(2023, 2, 2)).unwrap();
    let matrix = features.matrix(&dates);

    assert_eq!(matrix.len(), 4);
    assert!(matrix.iter().all(|row| row.len() == 3));
    assert_eq!(matrix[2], vec![2.0, 1.0, 2.0]);
}

#[test]
fn test_date_range() {
    let range = date_range(date(2023, 2, 27), date(2023, 3, 1)).unwrap();
    assert_eq!(range, vec![date(2023, 2, 27), date(2023, 2, 28), date(2023, 3, 1)]);

    assert_eq!(date_range(date(2023, 1, 1), date(2023, 1, 1)).unwrap().len(), 1);
    assert!(matches!(
        date_range(date(2023, 1, 2), date(2023, 1, 1)),
        Err(ForecastError::ValidationError(_))
    ));
}
