//! Per-task z-scoring of design and response columns

use ndarray::{ArrayViewMut1, Axis};

use crate::data::TaskData;

/// Center and scale one column in place to zero mean and unit (population) variance.
///
/// A constant column is left identically zero. The standard deviation counts
/// as zero when it is within rounding error of the column's magnitude, so a
/// column like `[0.1, 0.1, 0.1]` whose computed mean is off in the last bit is
/// still treated as constant.
pub fn standardize_column(mut column: ArrayViewMut1<f64>) {
    let n = column.len();
    if n == 0 {
        return;
    }
    let mean = column.sum() / n as f64;
    let var = column.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    let sd = var.sqrt();

    let scale_floor = 10.0 * f64::EPSILON * mean.abs().max(1.0);

    if sd > scale_floor && sd.is_finite() {
        column.mapv_inplace(|v| (v - mean) / sd);
    } else {
        column.fill(0.0);
    }
}

/// Standardize every design column and the response of a single task
pub fn standardize_task(task: &mut TaskData) {
    for column in task.design_mut().axis_iter_mut(Axis(1)) {
        standardize_column(column);
    }
    standardize_column(task.response_mut().view_mut());
}

/// Standardize each task independently, returning new task data.
pub fn standardize_tasks(tasks: &[TaskData]) -> Vec<TaskData> {
    tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            standardize_task(&mut task);
            task
        })
        .collect()
}
