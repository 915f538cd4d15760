use equa_bench_model::DimensionFilter;
use rusqlite::types::Value;

/// Append AND-equality predicates for every filter constraint.
///
/// Column names come from the `Dimension` enum, never from request input, so
/// the interpolation is closed over the fixed schema.
pub(crate) fn push_filter_clauses(
    filter: &DimensionFilter,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    for (dimension, value) in filter.iter() {
        sql.push_str(" AND ");
        sql.push_str(dimension.column());
        sql.push_str(" = ?");
        params.push(Value::Text(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equa_bench_model::Dimension;

    #[test]
    fn clauses_follow_filter_order() {
        let filter = DimensionFilter::new()
            .with(Dimension::Sector, "tech")
            .with(Dimension::Region, "emea");
        let mut sql = String::from("SELECT COUNT(*) FROM data_points WHERE benchmark_id = ?");
        let mut params = vec![Value::Text("bm".to_string())];
        push_filter_clauses(&filter, &mut sql, &mut params);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM data_points WHERE benchmark_id = ? AND region = ? AND sector = ?"
        );
        assert_eq!(params.len(), 3);
    }
}
