// Operator Construction
//
// Turns a finished plan into the operator tree the engine drives. The plan
// is consumed: each node's bound expressions and layouts move into the
// operator that will evaluate them. Construction cannot fail; everything
// that could go wrong structurally was rejected while planning.

use crate::query::executor::operators::{
    AggregateOperator, BoxedOperator, FilterOperator, HashJoinOperator, LimitOperator,
    NestedLoopJoinOperator, ProjectOperator, ScanOperator, SortOperator,
};
use crate::query::planner::plan::Plan;

pub fn build(plan: Plan) -> BoxedOperator {
    match plan {
        Plan::Scan { table, .. } => Box::new(ScanOperator::new(table)),
        Plan::Filter { input, predicate, layout } => {
            Box::new(FilterOperator::new(build(*input), predicate, layout))
        }
        Plan::Project { input, expressions, layout } => {
            Box::new(ProjectOperator::new(build(*input), expressions, layout))
        }
        Plan::NestedLoopJoin { left, right, condition, layout } => Box::new(
            NestedLoopJoinOperator::new(build(*left), build(*right), condition, layout),
        ),
        Plan::HashJoin {
            left,
            right,
            build_left,
            left_key,
            left_layout,
            right_key,
            right_layout,
        } => Box::new(HashJoinOperator::new(
            build(*left),
            build(*right),
            build_left,
            left_key,
            left_layout,
            right_key,
            right_layout,
        )),
        Plan::Aggregate { input, group_exprs, aggregates, output, layout } => Box::new(
            AggregateOperator::new(build(*input), group_exprs, aggregates, output, layout),
        ),
        Plan::Sort { input, keys } => Box::new(SortOperator::new(build(*input), keys)),
        Plan::Limit { input, count } => Box::new(LimitOperator::new(build(*input), count)),
    }
}
