//! Building per-gene fit inputs from the full per-task datasets

use log::{info, warn};

use crate::data::{GeneFitInput, TaskDataset, TaskInput};
use crate::error::{MtlError, Result};

/// Build one `GeneFitInput` per target gene that can be fit.
///
/// The candidate regulators of a gene are `regulators` without the gene itself,
/// in the given order. Tasks whose response lacks the gene are left out, and a
/// gene present in fewer than two tasks is skipped. Every candidate regulator
/// must be present in the design of every task the gene is fit in.
pub fn assemble_gene_inputs(
    datasets: &[TaskDataset],
    targets: &[String],
    regulators: &[String],
) -> Result<Vec<GeneFitInput>> {
    if datasets.is_empty() {
        return Err(MtlError::EmptyData {
            reason: "no task datasets".to_string(),
        });
    }

    let mut inputs = Vec::with_capacity(targets.len());
    let mut skipped = 0usize;

    for gene in targets {
        let candidates: Vec<String> = regulators.iter().filter(|tf| *tf != gene).cloned().collect();

        let tasks = datasets
            .iter()
            .enumerate()
            .filter(|(_, dataset)| dataset.has_gene(gene))
            .map(|(task_index, dataset)| {
                Ok(TaskInput {
                    task_index,
                    data: dataset.task_data(gene, &candidates)?,
                })
            })
            .collect::<Result<Vec<TaskInput>>>()?;

        if tasks.len() > 1 {
            inputs.push(GeneFitInput::new(gene.clone(), candidates, tasks));
        } else {
            warn!("Skipping gene {}: present in {} task(s), at least 2 required", gene, tasks.len());
            skipped += 1;
        }
    }

    info!("Assembled {} gene fits ({} genes skipped)", inputs.len(), skipped);
    Ok(inputs)
}
