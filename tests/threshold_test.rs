use rand::Rng;
use resistance_monitor::threshold::{TukeyFence, quantile};
use resistance_monitor::{
    MicRecord, QuantileMethod, SurveillanceConfig, ThresholdConfig, ThresholdStatus,
    WeeklyTable, build_alert_table, evaluate_thresholds, run_tables,
};

const METHODS: [QuantileMethod; 5] = [
    QuantileMethod::Linear,
    QuantileMethod::Lower,
    QuantileMethod::Higher,
    QuantileMethod::Midpoint,
    QuantileMethod::NearestRank,
];

fn random_weeks(rng: &mut impl Rng, n: usize) -> Vec<Option<f64>> {
    (0..n)
        .map(|_| {
            if rng.random_bool(0.1) {
                None
            } else {
                Some(rng.random_range(0.0..100.0))
            }
        })
        .collect()
}

#[test]
fn test_fence_never_decreases_with_q3() {
    let mut rng = rand::rng();
    for _ in 0..500 {
        let q1: f64 = rng.random_range(0.0..50.0);
        let q3: f64 = q1 + rng.random_range(0.0..50.0);
        let larger_q3 = q3 + rng.random_range(0.0..50.0);

        let fence = TukeyFence::from_quartiles(q1, q3, 1.5);
        let wider = TukeyFence::from_quartiles(q1, larger_q3, 1.5);
        assert!(wider.iqr >= fence.iqr);
        assert!(wider.fence >= fence.fence);
    }
}

#[test]
fn test_quartiles_are_ordered_for_every_method() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let n = rng.random_range(1..60);
        let mut values: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..100.0)).collect();
        values.sort_by(f64::total_cmp);

        for method in METHODS {
            let q1 = quantile(&values, 0.25, method).unwrap();
            let q3 = quantile(&values, 0.75, method).unwrap();
            assert!(values[0] <= q1 && q1 <= q3 && q3 <= values[n - 1]);
        }
    }
}

#[test]
fn test_flags_match_fence_and_alerts_match_flags() {
    let mut rng = rand::rng();
    for _ in 0..100 {
        let n = rng.random_range(1..=53);
        let weeks: Vec<u32> = (1..=n as u32).collect();
        let table = WeeklyTable::new("Semaine", weeks)
            .unwrap()
            .with_column("%R AMX", random_weeks(&mut rng, n))
            .unwrap()
            .with_column("%R CTX", random_weeks(&mut rng, n))
            .unwrap();
        let config = ThresholdConfig {
            metric_rules: Vec::new(),
            ..Default::default()
        };

        let outcome = evaluate_thresholds(&table, &config).unwrap();
        let alerts = build_alert_table(&outcome.table, &outcome.thresholds);

        for threshold in &outcome.thresholds {
            let flags = &outcome.table.flag(&threshold.metric).unwrap().values;
            let values = table.column(&threshold.metric).unwrap();

            for (row, (flag, value)) in flags.iter().zip(values).enumerate() {
                if value.is_none() {
                    assert!(!flag, "null value flagged");
                }
                if threshold.status == ThresholdStatus::Degenerate {
                    assert!(!flag, "degenerate threshold flagged");
                }
                let week = table.weeks()[row];
                let alerted = alerts
                    .iter()
                    .any(|a| a.metric == threshold.metric && a.week == week);
                assert_eq!(*flag, alerted);
            }
        }

        let order: Vec<(u32, &str)> = alerts.iter().map(|a| (a.week, a.metric.as_str())).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }
}

#[test]
fn test_degenerate_below_minimum_observations() {
    let table = WeeklyTable::new("Semaine", vec![1, 2, 3, 4, 5])
        .unwrap()
        .with_column("%R AMX", vec![Some(1.0), None, Some(2.0), None, Some(99.0)])
        .unwrap();
    let outcome = evaluate_thresholds(&table, &ThresholdConfig::default()).unwrap();
    let amx = &outcome.thresholds[0];

    assert_eq!(amx.status, ThresholdStatus::Degenerate);
    assert_eq!(amx.observations, 3);
    assert!(amx.fence.unwrap() >= 99.0);
    assert!(amx.description.contains("only 3 weekly values"));
    assert!(outcome.table.flag("%R AMX").unwrap().values.iter().all(|f| !f));
}

#[test]
fn test_random_runs_are_idempotent() {
    let mut rng = rand::rng();
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let config = SurveillanceConfig::default();

    for _ in 0..20 {
        let table = WeeklyTable::new("Semaine", (1..=52).collect())
            .unwrap()
            .with_column("%R AMX", random_weeks(&mut rng, 52))
            .unwrap()
            .with_column("%R VA", random_weeks(&mut rng, 52))
            .unwrap()
            .with_column("R VA", (0..52).map(|_| Some(f64::from(rng.random_range(0..2u8)))).collect())
            .unwrap();
        let records: Vec<MicRecord> = (0..200)
            .map(|_| {
                let date = start + chrono::Days::new(rng.random_range(0..366));
                let mic = format!("{}", rng.random_range(0..8u8));
                MicRecord::new(Some(date)).with_concentration("CMI VA", &mic)
            })
            .collect();

        let first = run_tables(&table, Some(&records), &config).unwrap();
        let second = run_tables(&table, Some(&records), &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(
            first.to_record_batches().unwrap().weekly,
            second.to_record_batches().unwrap().weekly
        );
    }
}
