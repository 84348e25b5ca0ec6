//! Data structures for multi-task network inference

mod expression;
mod task;

pub use expression::ExpressionMatrix;
pub use task::{GeneFitInput, TaskData, TaskDataset, TaskInput};
