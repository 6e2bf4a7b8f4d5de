// Join Operators Module
//
// Two row-combining strategies over the same pull interface: a nested
// loop join that evaluates an arbitrary condition per pair, and a hash
// join for equality conditions. Both emit rows in left-row-major order,
// so swapping one for the other never changes the output sequence.

pub use self::hash::HashJoinOperator;
pub use self::nested_loop::NestedLoopJoinOperator;

pub mod hash;
pub mod nested_loop;
