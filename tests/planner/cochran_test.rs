#[cfg(test)]
mod tests {
    use aqp::model::{DEFAULT_E, DEFAULT_Z};
    use aqp::planner::{s0, target_group_sample_size};

    #[test]
    fn test_target_never_exceeds_group() {
        for (z, e) in [(DEFAULT_Z, DEFAULT_E), (1.96, 0.05), (1.645, 0.1)] {
            let mut g = 1.0;
            while g < 1e10 {
                assert!(target_group_sample_size(g, z, e) <= g * (1.0 + 1e-12));
                g *= 1.7;
            }
        }
    }

    #[test]
    fn test_target_non_decreasing() {
        let mut prev = 0.0;
        for g in 1..50_000u32 {
            let t = target_group_sample_size(f64::from(g), 1.96, 0.05);
            assert!(t >= prev, "target decreased at g = {}", g);
            prev = t;
        }
    }

    #[test]
    fn test_target_approaches_s0() {
        let s0 = s0(1.96, 0.05);
        assert!((s0 - 384.16).abs() < 1e-9);
        let huge = target_group_sample_size(1e15, 1.96, 0.05);
        assert!((huge - s0).abs() < 1e-3);
    }
}
