#[cfg(test)]
mod tests {
    use aqp::model::{ColumnPair, Query, Sample};

    fn query(qcs: &[&str]) -> Query {
        Query::new("1", qcs.iter().copied(), ["store_sales"], Vec::<ColumnPair>::new())
    }

    #[test]
    fn test_name_is_idempotent() {
        let a = Sample::stratified("tpcds", &query(&["d_year", "i_brand"]), "store_sales", 2.576, 0.01);
        let b = Sample::stratified("tpcds", &query(&["i_brand", "d_year"]), "store_sales", 2.576, 0.01);
        assert_eq!(a.name(), b.name());
        assert_eq!(a.name(), a.name());
    }

    #[test]
    fn test_every_parameter_changes_the_name() {
        let q = query(&["d_year"]);
        let base = Sample::stratified("tpcds", &q, "store_sales", 2.576, 0.01).name();

        assert_ne!(base, Sample::stratified("tpcds", &q, "store_sales", 1.96, 0.01).name());
        assert_ne!(base, Sample::stratified("tpcds", &q, "store_sales", 2.576, 0.05).name());
        assert_ne!(base, Sample::stratified("tpcds", &q, "web_sales", 2.576, 0.01).name());
        assert_ne!(
            base,
            Sample::stratified("tpcds", &query(&["d_moy"]), "store_sales", 2.576, 0.01).name()
        );
        assert_ne!(
            Sample::uniform("tpcds", &q, "store_sales", 0.5).name(),
            Sample::uniform("tpcds", &q, "store_sales", 0.25).name()
        );
        assert_ne!(
            Sample::stratified2("tpcds", "store_sales", ["store_sales"], ["d_year"], 10).name(),
            Sample::stratified2("tpcds", "store_sales", ["store_sales"], ["d_year"], 20).name()
        );
    }

    #[test]
    fn test_name_formats() {
        let q = query(&["d_year", "i_brand"]);
        assert_eq!(
            Sample::uniform("tpcds", &q, "store_sales", 0.5).name(),
            "store_sales__uf_0_5000"
        );
        assert_eq!(
            Sample::stratified("tpcds", &q, "store_sales", 2.576, 0.01).name(),
            "store_sales__st_2_5760_0_0100__d_year_i_brand"
        );
        assert_eq!(
            Sample::stratified2("tpcds", "store_sales", ["store_sales"], ["d_year"], 100).name(),
            "store_sales__st2_100__d_year"
        );
    }
}
