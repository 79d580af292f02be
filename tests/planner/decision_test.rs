#[cfg(test)]
mod tests {
    use aqp::model::Stat;
    use aqp::planner::{decide, Decision, Thresholds};

    fn stat(population: u64, target: f64, avg: f64) -> Stat {
        Stat {
            database: "tpcds".to_string(),
            query_name: "store_sales__ss_store_sk".to_string(),
            population_size: population,
            target_sample_size: target,
            avg_group_size: avg,
            ..Default::default()
        }
    }

    #[test]
    fn test_uniform_for_large_groups() {
        assert_eq!(
            decide(&stat(50_000_000, 0.0, 200_000.0), &Thresholds::default()),
            Decision::Uniform { ratio: 0.5 }
        );
    }

    #[test]
    fn test_stratified_for_small_groups() {
        assert_eq!(
            decide(&stat(1_000_000, 50_000.0, 500.0), &Thresholds::default()),
            Decision::Stratified { ratio: 0.05 }
        );
    }

    #[test]
    fn test_no_viable_sample() {
        assert_eq!(
            decide(&stat(1_000_000, 900_000.0, 500.0), &Thresholds::default()),
            Decision::NoViableSample { ratio: 0.9 }
        );
    }

    #[test]
    fn test_thresholds_from_settings() {
        let settings = aqp::config::Settings::default();
        let thresholds = Thresholds::from(&settings.sampling);
        assert_eq!(thresholds, Thresholds::default());

        let strict = Thresholds {
            uniform_threshold: 1_000.0,
            ..thresholds
        };
        assert_eq!(
            decide(&stat(1_000_000, 50_000.0, 500.0), &strict),
            Decision::Stratified { ratio: 0.05 }
        );
        assert_eq!(
            decide(&stat(1_000_000, 50_000.0, 4_000.0), &strict),
            Decision::Uniform { ratio: 0.25 }
        );
    }
}
