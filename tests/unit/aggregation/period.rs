use chrono::NaiveDate;
use scm_pulse::aggregation::period::BucketId;
use scm_pulse::aggregation::Period;
use scm_pulse::error::AggregationError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parses_known_period_names() {
    assert_eq!("weekly".parse::<Period>().unwrap(), Period::Weekly);
    assert_eq!("Monthly".parse::<Period>().unwrap(), Period::Monthly);
    assert_eq!(" quarter ".parse::<Period>().unwrap(), Period::Quarterly);
    assert_eq!("annual".parse::<Period>().unwrap(), Period::Yearly);
    assert_eq!("day".parse::<Period>().unwrap(), Period::Daily);
}

#[test]
fn rejects_unknown_period_names() {
    let err = "fortnightly".parse::<Period>().unwrap_err();
    assert_eq!(err, AggregationError::UnsupportedPeriod("fortnightly".to_string()));
    assert!(err.to_string().contains("fortnightly"));
}

#[test]
fn display_round_trips_through_from_str() {
    for period in Period::all() {
        assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
    }
}

#[test]
fn monthly_label_keeps_the_year() {
    let jan_23 = Period::Monthly.bucket_of(date(2023, 1, 15));
    let jan_24 = Period::Monthly.bucket_of(date(2024, 1, 15));

    assert_ne!(jan_23, jan_24);
    assert_eq!(jan_23.label(), "Jan '23");
    assert_eq!(jan_24.label(), "Jan '24");
    assert_eq!(jan_24.key(), "2024-01");
    assert_eq!(jan_24.start(), date(2024, 1, 1));
}

#[test]
fn quarter_is_derived_from_zero_based_month() {
    assert_eq!(
        Period::Quarterly.bucket_of(date(2023, 3, 31)),
        BucketId::Quarter { year: 2023, quarter: 1 }
    );
    let q2 = Period::Quarterly.bucket_of(date(2023, 4, 1));
    assert_eq!(q2, BucketId::Quarter { year: 2023, quarter: 2 });
    assert_eq!(q2.label(), "Q2 '23");
    assert_eq!(q2.key(), "2023-Q2");
    assert_eq!(q2.start(), date(2023, 4, 1));
}

#[test]
fn weekly_uses_iso_week_year() {
    // Sunday 2021-01-03 belongs to the last ISO week of 2020
    let week = Period::Weekly.bucket_of(date(2021, 1, 3));
    assert_eq!(week, BucketId::Week { year: 2020, week: 53 });
    assert_eq!(week.label(), "W53");
    assert_eq!(week.key(), "2020-W53");
    assert_eq!(week.start(), date(2020, 12, 28));

    // Monday 2024-12-30 is already week 1 of 2025
    let week = Period::Weekly.bucket_of(date(2024, 12, 30));
    assert_eq!(week.key(), "2025-W01");
}

#[test]
fn daily_and_yearly_keys() {
    let day = Period::Daily.bucket_of(date(2024, 2, 29));
    assert_eq!(day.label(), "2024-02-29");
    assert_eq!(day.key(), "2024-02-29");

    let year = Period::Yearly.bucket_of(date(2024, 2, 29));
    assert_eq!(year.label(), "2024");
    assert_eq!(year.start(), date(2024, 1, 1));
}

#[test]
fn bucket_ids_order_chronologically_across_years() {
    let mut ids = vec![
        Period::Monthly.bucket_of(date(2024, 1, 1)),
        Period::Monthly.bucket_of(date(2023, 12, 1)),
        Period::Monthly.bucket_of(date(2023, 2, 1)),
    ];
    ids.sort();
    let keys: Vec<String> = ids.iter().map(|id| id.key()).collect();
    assert_eq!(keys, vec!["2023-02", "2023-12", "2024-01"]);
}
