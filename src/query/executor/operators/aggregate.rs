// Aggregation Operator
//
// Groups input rows by a key tuple and folds aggregate functions over each
// group. The operator is blocking: it drains its input during init() and
// then replays one finished row per group, in first-seen group order.
//
// Nulls never contribute to an aggregate: count(expr) skips them, sum and
// avg ignore them, min and max pass over them. Grouping, by contrast,
// treats nulls as equal, so all null keys form one group.

use crate::catalog::DataType;
use crate::query::executor::eval;
use crate::query::executor::operators::{BoxedOperator, Operator};
use crate::query::executor::result::{GroupKey, QueryError, QueryResult, Row, Value};
use crate::query::planner::bound::{BoundExpr, RowLayout};
use linked_hash_map::LinkedHashMap;
use std::cmp::Ordering;
use std::fmt;

/// The aggregate functions the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Look a function up by its call name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunction::Count),
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Static output kind: count is always an integer, avg always a float,
    /// the rest keep their argument's kind.
    pub fn result_kind(&self, argument: Option<DataType>) -> DataType {
        match self {
            AggregateFunction::Count => DataType::Int,
            AggregateFunction::Avg => DataType::Float,
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                argument.unwrap_or(DataType::Int)
            }
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One aggregate to compute: the function plus its argument expression.
/// A missing argument is the bare row count, count(*).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    pub argument: Option<BoundExpr>,
}

impl fmt::Display for AggregateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{}({})", self.function, argument),
            None => write!(f, "{}(*)", self.function),
        }
    }
}

/// Where each output column of the aggregation comes from: a group-key
/// position or an aggregate position. The select list drives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOutput {
    Key(usize),
    Aggregate(usize),
}

/// Running state of one aggregate within one group.
struct Accumulator {
    function: AggregateFunction,
    count: i64,
    sum: Option<Value>,
    extreme: Option<Value>,
}

impl Accumulator {
    fn new(function: AggregateFunction) -> Self {
        Accumulator {
            function,
            count: 0,
            sum: None,
            extreme: None,
        }
    }

    /// Fold one row's contribution in. `None` stands for the argument-less
    /// count(*), which counts rows unconditionally.
    fn update(&mut self, value: Option<Value>) -> QueryResult<()> {
        let value = match value {
            None => {
                self.count += 1;
                return Ok(());
            }
            Some(Value::Null) => return Ok(()),
            Some(value) => value,
        };
        self.count += 1;
        match self.function {
            AggregateFunction::Count => Ok(()),
            AggregateFunction::Sum | AggregateFunction::Avg => self.add(value),
            AggregateFunction::Min => self.keep_extreme(value, Ordering::Less),
            AggregateFunction::Max => self.keep_extreme(value, Ordering::Greater),
        }
    }

    /// Integer sums stay integers and overflow loudly; the first float
    /// contribution promotes the whole sum to float.
    fn add(&mut self, value: Value) -> QueryResult<()> {
        if !matches!(value, Value::Integer(_) | Value::Float(_)) {
            return Err(QueryError::type_mismatch_single(
                self.function.name(),
                &value,
            ));
        }
        let current = self.sum.take().unwrap_or(Value::Integer(0));
        let next = match (current, value) {
            (Value::Integer(a), Value::Integer(b)) => a
                .checked_add(b)
                .map(Value::Integer)
                .ok_or_else(|| QueryError::NumericOverflow(self.function.name().into()))?,
            (Value::Integer(a), Value::Float(b)) => Value::Float(a as f64 + b),
            (Value::Float(a), Value::Integer(b)) => Value::Float(a + b as f64),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (other, _) => {
                return Err(QueryError::Internal(format!(
                    "sum accumulator holds a {} value",
                    other.kind_name()
                )))
            }
        };
        self.sum = Some(next);
        Ok(())
    }

    fn keep_extreme(&mut self, value: Value, want: Ordering) -> QueryResult<()> {
        match self.extreme.take() {
            None => self.extreme = Some(value),
            Some(current) => {
                let ordering = value.compare(&current).ok_or_else(|| {
                    QueryError::type_mismatch(self.function.name(), &value, &current)
                })?;
                self.extreme = Some(if ordering == want { value } else { current });
            }
        }
        Ok(())
    }

    /// Final value for this aggregate. Groups exist only for rows that
    /// were seen, so an all-null input yields count 0 and null elsewhere.
    fn finish(&self) -> Value {
        match self.function {
            AggregateFunction::Count => Value::Integer(self.count),
            AggregateFunction::Sum => self.sum.clone().unwrap_or(Value::Null),
            AggregateFunction::Avg => match self.sum.as_ref().and_then(Value::as_f64) {
                Some(total) if self.count > 0 => Value::Float(total / self.count as f64),
                _ => Value::Null,
            },
            AggregateFunction::Min | AggregateFunction::Max => {
                self.extreme.clone().unwrap_or(Value::Null)
            }
        }
    }
}

struct Group {
    key_values: Vec<Value>,
    accumulators: Vec<Accumulator>,
}

pub struct AggregateOperator {
    input: BoxedOperator,
    group_exprs: Vec<BoundExpr>,
    aggregates: Vec<AggregateSpec>,
    output: Vec<AggregateOutput>,
    layout: RowLayout,
    results: Option<std::vec::IntoIter<Row>>,
    initialized: bool,
}

impl AggregateOperator {
    pub fn new(
        input: BoxedOperator,
        group_exprs: Vec<BoundExpr>,
        aggregates: Vec<AggregateSpec>,
        output: Vec<AggregateOutput>,
        layout: RowLayout,
    ) -> Self {
        AggregateOperator {
            input,
            group_exprs,
            aggregates,
            output,
            layout,
            results: None,
            initialized: false,
        }
    }

    fn fresh_accumulators(&self) -> Vec<Accumulator> {
        self.aggregates
            .iter()
            .map(|spec| Accumulator::new(spec.function))
            .collect()
    }
}

impl Operator for AggregateOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.init()?;
        // first-seen group order is the output order
        let mut groups: LinkedHashMap<Vec<GroupKey>, Group> = LinkedHashMap::new();
        while let Some(row) = self.input.next()? {
            let mut key_values = Vec::with_capacity(self.group_exprs.len());
            for expr in &self.group_exprs {
                key_values.push(eval::evaluate(expr, &self.layout, &row)?);
            }
            let key: Vec<GroupKey> = key_values.iter().map(Value::group_key).collect();
            let accumulators = self.fresh_accumulators();
            let group = groups.entry(key).or_insert_with(move || Group {
                key_values,
                accumulators,
            });
            for (accumulator, spec) in group.accumulators.iter_mut().zip(&self.aggregates) {
                let value = match &spec.argument {
                    Some(expr) => Some(eval::evaluate(expr, &self.layout, &row)?),
                    None => None,
                };
                accumulator.update(value)?;
            }
        }
        // with no group keys the aggregation always produces one row,
        // even over an empty input
        if groups.is_empty() && self.group_exprs.is_empty() {
            groups.insert(
                Vec::new(),
                Group {
                    key_values: Vec::new(),
                    accumulators: self.fresh_accumulators(),
                },
            );
        }
        let mut rows = Vec::with_capacity(groups.len());
        for (_, group) in groups {
            let mut values = Vec::with_capacity(self.output.len());
            for output in &self.output {
                values.push(match output {
                    AggregateOutput::Key(index) => {
                        group.key_values.get(*index).cloned().unwrap_or(Value::Null)
                    }
                    AggregateOutput::Aggregate(index) => group
                        .accumulators
                        .get(*index)
                        .map(|acc| acc.finish())
                        .unwrap_or(Value::Null),
                });
            }
            rows.push(Row::new(values));
        }
        self.results = Some(rows.into_iter());
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            return Err(QueryError::Internal(
                "aggregate operator used before init".into(),
            ));
        }
        Ok(self.results.as_mut().and_then(|rows| rows.next()))
    }

    fn close(&mut self) -> QueryResult<()> {
        self.results = None;
        self.initialized = false;
        self.input.close()
    }
}
