use super::*;
use crate::{
    config::Strategy,
    db::{
        column::ColumnType,
        dialect::Dialect,
        expr::{Condition, Expr},
        session::StatementKind,
        staging::StagingState,
    },
    error::{ConfigError, ErrorClass, UsageError, ValueSetError},
    test_support::RecordingSession,
    value::ValueKind,
};
use proptest::prelude::*;

fn id() -> Column {
    Column::new("orders", "id", ColumnType::BigInt)
}

fn chunk_config(threshold: usize, chunk_size: usize) -> Config {
    Config::new(Strategy::Chunk)
        .with_threshold(threshold)
        .with_chunk_size(chunk_size)
}

fn groups(expr: &Expr) -> Vec<(usize, bool)> {
    let children = match expr {
        Expr::Or(children) | Expr::And(children) => children.clone(),
        other => vec![other.clone()],
    };

    children
        .iter()
        .map(|child| match child {
            Expr::InList {
                values, negated, ..
            } => (values.len(), *negated),
            other => panic!("expected literal group, got {other:?}"),
        })
        .collect()
}

//
// Normalizer
//

#[test]
fn normalize_keeps_first_occurrence_order() {
    let set = ValueSet::normalize(&id(), [3, 1, 3, 2, 1].into_iter().map(Value::from)).unwrap();

    assert_eq!(
        set.as_slice(),
        &[Value::Int(3), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn normalize_unifies_numeric_variants() {
    let column = Column::new("m", "score", ColumnType::Double);
    let set = ValueSet::normalize(
        &column,
        [Value::Int(1), Value::Uint(1), Value::Float(1.0), Value::Float(1.5)],
    )
    .unwrap();

    assert_eq!(set.len(), 2);
}

#[test]
fn normalize_rejects_null_nan_and_kind_mismatch() {
    let null = ValueSet::normalize(&id(), [Value::Int(1), Value::Null]);
    assert_eq!(null, Err(ValueSetError::Null { index: 1 }));

    let nan = ValueSet::normalize(&id(), [Value::Float(f64::NAN)]);
    assert_eq!(nan, Err(ValueSetError::NotANumber { index: 0 }));

    let text = ValueSet::normalize(&id(), [Value::Int(1), Value::from("x")]);
    assert_eq!(
        text,
        Err(ValueSetError::KindMismatch {
            index: 1,
            column: "orders.id".to_string(),
            expected: ValueKind::Numeric,
            found: ValueKind::Text,
        })
    );
}

#[test]
fn normalize_rejects_values_an_integer_column_cannot_hold() {
    let fraction = ValueSet::normalize(&id(), [Value::Int(1), Value::Float(1.5)]);
    assert_eq!(
        fraction,
        Err(ValueSetError::Incompatible {
            index: 1,
            column: "orders.id".to_string(),
            ty: ColumnType::BigInt,
            value: "1.5".to_string(),
        })
    );

    let wide = ValueSet::normalize(&id(), [Value::Uint(u64::MAX)]);
    assert!(matches!(wide, Err(ValueSetError::Incompatible { index: 0, .. })));

    let small = Column::new("t", "flag", ColumnType::SmallInt);
    let over = ValueSet::normalize(&small, [Value::Int(40_000)]);
    assert!(matches!(over, Err(ValueSetError::Incompatible { index: 0, .. })));

    let huge = ValueSet::normalize(&id(), [Value::Float(1e300)]);
    assert!(matches!(huge, Err(ValueSetError::Incompatible { index: 0, .. })));
}

#[test]
fn normalize_admits_integral_values_in_range() {
    let set = ValueSet::normalize(
        &id(),
        [
            Value::Float(2.0),
            Value::Uint(3),
            Value::Int(i64::MIN),
            Value::Uint(9_223_372_036_854_775_807),
        ],
    )
    .unwrap();

    assert_eq!(set.len(), 4);
}

#[test]
fn normalize_rejects_timestamp_for_date_column() {
    let day = Column::new("orders", "placed_on", ColumnType::Date);
    let ts = Value::Timestamp(time::OffsetDateTime::UNIX_EPOCH);

    let err = ValueSet::normalize(&day, [Value::Date(time::Date::MIN), ts]).unwrap_err();
    assert!(matches!(
        err,
        ValueSetError::Incompatible { index: 1, ty: ColumnType::Date, .. }
    ));

    let stamp = Column::new("orders", "placed_at", ColumnType::TimestampTz);
    let err = ValueSet::normalize(&stamp, [Value::Date(time::Date::MIN)]).unwrap_err();
    assert!(matches!(err, ValueSetError::Incompatible { index: 0, .. }));
}

#[test]
fn normalize_rejects_integers_a_double_cannot_hold_exactly() {
    let column = Column::new("m", "score", ColumnType::Double);

    assert!(ValueSet::normalize(&column, [Value::Int(1 << 53)]).is_ok());
    assert!(matches!(
        ValueSet::normalize(&column, [Value::Int((1 << 53) + 1)]),
        Err(ValueSetError::Incompatible { index: 0, .. })
    ));
}

//
// Selector
//

#[test]
fn empty_set_skips_strategy_selection() {
    let broken = chunk_config(0, 0);

    assert_eq!(select(&broken, 0), Ok(StrategyDecision::Empty));
}

#[test]
fn threshold_forces_simple_for_every_strategy() {
    for strategy in [Strategy::Simple, Strategy::Chunk, Strategy::TempTable] {
        let config = Config::new(strategy).with_threshold(100);

        assert_eq!(select(&config, 1), Ok(StrategyDecision::Simple));
        assert_eq!(select(&config, 100), Ok(StrategyDecision::Simple));
    }
}

#[test]
fn above_threshold_uses_configured_strategy() {
    let config = chunk_config(10, 4);
    assert_eq!(
        select(&config, 11),
        Ok(StrategyDecision::Chunk { chunk_size: 4 })
    );

    let config = Config::new(Strategy::TempTable)
        .with_threshold(10)
        .with_insert_batch_size(7);
    assert_eq!(
        select(&config, 11),
        Ok(StrategyDecision::TempTable {
            insert_batch_size: 7
        })
    );

    let config = Config::new(Strategy::Simple).with_threshold(0);
    assert_eq!(select(&config, 5000), Ok(StrategyDecision::Simple));
}

#[test]
fn zero_sizes_fail_when_their_strategy_is_selected() {
    assert_eq!(select(&chunk_config(0, 0), 1), Err(ConfigError::ChunkSizeZero));

    let temp = Config::new(Strategy::TempTable)
        .with_threshold(0)
        .with_insert_batch_size(0);
    assert_eq!(select(&temp, 1), Err(ConfigError::InsertBatchSizeZero));

    // below the threshold the broken parameter is never consulted
    assert_eq!(select(&chunk_config(10, 0), 5), Ok(StrategyDecision::Simple));
}

//
// Chunk planner
//

#[test]
fn thousand_values_in_chunks_of_five_hundred() {
    let optimizer = Optimizer::new(chunk_config(10, 500));

    let plan = optimizer.optimize_in(&id(), 1..=1000i64).unwrap();
    let expr = plan.to_expression().unwrap();
    assert!(matches!(expr, Expr::Or(_)));
    assert_eq!(groups(&expr), vec![(500, false), (500, false)]);

    let plan = optimizer.optimize_not_in(&id(), 1..=1000i64).unwrap();
    let expr = plan.to_expression().unwrap();
    assert!(matches!(expr, Expr::And(_)));
    assert_eq!(groups(&expr), vec![(500, true), (500, true)]);
}

#[test]
fn chunk_groups_preserve_input_order() {
    let expr = chunk::plan_chunks(&id(), &[5, 4, 3, 2, 1].map(Value::from), 2, false);

    assert_eq!(
        expr.to_string(),
        r#"(("orders"."id" IN (5, 4)) OR ("orders"."id" IN (3, 2)) OR ("orders"."id" IN (1)))"#
    );
}

#[test]
fn single_chunk_matches_simple_output() {
    let values: Vec<Value> = (1..=20i64).map(Value::from).collect();

    let chunked = chunk::plan_chunks(&id(), &values, 50, true);
    let simple = emit::in_list(id(), values, true);

    assert_eq!(chunked, simple);
}

proptest! {
    #[test]
    fn chunk_partition_covers_values_in_order(
        values in prop::collection::vec(any::<i64>(), 1..200),
        chunk_size in 1usize..40,
    ) {
        let values: Vec<Value> = values.into_iter().map(Value::from).collect();
        let expr = chunk::plan_chunks(&id(), &values, chunk_size, false);

        let flattened: Vec<Value> = match &expr {
            Expr::Or(children) => children
                .iter()
                .flat_map(|child| match child {
                    Expr::InList { values, .. } => values.clone(),
                    _ => Vec::new(),
                })
                .collect(),
            Expr::InList { values, .. } => values.clone(),
            _ => Vec::new(),
        };
        let sizes = groups(&expr);

        prop_assert_eq!(&flattened, &values);
        prop_assert_eq!(sizes.len(), chunk::group_count(values.len(), chunk_size));
        prop_assert!(sizes.iter().all(|(len, _)| *len <= chunk_size && *len > 0));
    }

    #[test]
    fn normalized_sets_have_no_semantic_duplicates(
        values in prop::collection::vec(-20i64..20, 0..100),
    ) {
        let set = ValueSet::normalize(&id(), values.iter().copied().map(Value::from)).unwrap();
        let mut unique = values.clone();
        unique.sort_unstable();
        unique.dedup();

        prop_assert_eq!(set.len(), unique.len());
    }
}

//
// Facade and plan
//

#[test]
fn empty_list_folds_to_constants_without_io() {
    let optimizer = Optimizer::new(Config::new(Strategy::TempTable).with_threshold(0));
    let session = RecordingSession::postgres();

    let plan = optimizer.optimize_in(&id(), Vec::<i64>::new()).unwrap();
    assert_eq!(plan.strategy(), None);
    assert_eq!(plan.to_expression().unwrap(), Expr::Const(false));

    let plan = optimizer.optimize_not_in(&id(), Vec::<i64>::new()).unwrap();
    let (expr, cleanup) = plan.execute(&session).unwrap();
    assert_eq!(expr, Expr::Const(true));
    assert_eq!(cleanup.state(), StagingState::Inert);
    assert!(session.statements().is_empty());
}

#[test]
fn large_threshold_overrides_temp_table() {
    let optimizer = Optimizer::new(Config::new(Strategy::TempTable).with_threshold(100_000));
    let session = RecordingSession::postgres();

    let plan = optimizer.optimize_in(&id(), 1..=1000i64).unwrap();
    assert_eq!(plan.strategy(), Some(Strategy::Simple));

    let (expr, _cleanup) = plan.execute(&session).unwrap();
    let Expr::InList { values, negated, .. } = &expr else {
        panic!("expected a literal IN list, got {expr:?}");
    };
    assert_eq!(values.len(), 1000);
    assert!(!negated);
    assert!(session.statements().is_empty());
}

#[test]
fn to_expression_is_repeatable() {
    let optimizer = Optimizer::new(chunk_config(3, 2));
    let plan = optimizer.optimize_in(&id(), [1, 2, 3, 4, 5]).unwrap();

    let first = plan.to_expression().unwrap();
    let second = plan.to_expression().unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.to_sql(Dialect::Postgres),
        second.to_sql(Dialect::Postgres)
    );
}

#[test]
fn temp_table_plan_needs_execution_for_an_expression() {
    let optimizer = Optimizer::new(Config::new(Strategy::TempTable).with_threshold(1));
    let plan = optimizer.optimize_in(&id(), [1, 2]).unwrap();

    let err = plan.to_expression().unwrap_err();
    assert_eq!(err.class(), ErrorClass::Usage);
    assert!(matches!(
        err,
        OptimizeError::Usage(UsageError::NotMaterialized { ref column }) if column == "orders.id"
    ));
}

#[test]
fn config_errors_surface_before_any_statement() {
    let optimizer = Optimizer::new(
        Config::new(Strategy::TempTable)
            .with_threshold(1)
            .with_table_name_prefix("bad-prefix"),
    );

    let err = optimizer.optimize_in(&id(), [1, 2]).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Config);
    assert!(matches!(
        err,
        OptimizeError::Config(ConfigError::InvalidPrefix { .. })
    ));
}

#[test]
fn try_new_validates_eagerly() {
    assert!(Optimizer::try_new(chunk_config(10, 0)).is_err());
    assert!(Optimizer::try_new(chunk_config(10, 5)).is_ok());
}

#[test]
fn explain_summarizes_each_strategy() {
    let chunked = Optimizer::new(chunk_config(10, 500))
        .optimize_in(&id(), 1..=1000i64)
        .unwrap();
    assert_eq!(chunked.explain().groups, 2);
    assert_eq!(
        chunked.explain().to_string(),
        "IN over 1000 values: chunk (2 groups)"
    );

    let staged = Optimizer::new(
        Config::new(Strategy::TempTable)
            .with_threshold(500)
            .with_insert_batch_size(1000),
    )
    .optimize_not_in(&id(), 1..=10_000i64)
    .unwrap();
    assert_eq!(staged.explain().insert_batches, 10);
    assert_eq!(
        staged.explain().to_string(),
        "NOT IN over 10000 values: temp table (10 insert batches)"
    );

    let empty = Optimizer::default()
        .optimize_not_in(&id(), Vec::<i64>::new())
        .unwrap();
    assert_eq!(
        empty.explain().to_string(),
        "NOT IN over 0 values: constant TRUE"
    );
}

#[test]
fn execute_scoped_cleans_up_after_closure() {
    let optimizer = Optimizer::new(Config::new(Strategy::TempTable).with_threshold(1));
    let session = RecordingSession::postgres();

    let sql = optimizer
        .optimize_in(&id(), [1, 2, 3])
        .unwrap()
        .execute_scoped(&session, |expr| expr.to_sql(Dialect::Postgres).sql)
        .unwrap();

    assert!(sql.contains(r#""orders"."id" IN (SELECT "value" FROM "tmp_in_"#));
    assert_eq!(
        session.kinds(),
        vec![
            StatementKind::CreateTable,
            StatementKind::Insert,
            StatementKind::CreateIndex,
            StatementKind::DropTable,
        ]
    );
}

#[test]
fn optimizer_and_plan_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Optimizer>();
    assert_send_sync::<Plan>();
}

#[test]
fn metrics_sink_receives_planning_events() {
    use crate::obs::{MetricsEvent, MetricsSink, PlanKind, metrics_report, metrics_reset_all};
    use std::sync::Mutex;

    struct CaptureSink(Mutex<Vec<MetricsEvent>>);

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    let sink: &'static CaptureSink = Box::leak(Box::new(CaptureSink(Mutex::new(Vec::new()))));
    metrics_reset_all();

    let optimizer = Optimizer::new(chunk_config(1, 2)).metrics_sink(sink);
    optimizer.optimize_in(&id(), [1, 2, 3]).unwrap();

    assert_eq!(
        *sink.0.lock().unwrap(),
        vec![MetricsEvent::Planned {
            kind: PlanKind::Chunk,
            values: 3
        }]
    );
    assert_eq!(metrics_report().ops.plan_chunk, 0);
}
