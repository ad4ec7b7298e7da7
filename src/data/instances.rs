use crate::error::{LcsError, Result};
use serde::{Deserialize, Serialize};

/// Training matrix: one row per sample, attribute columns followed by label columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceMatrix {
    rows: Vec<Vec<f64>>,
    number_of_labels: usize,
}

impl InstanceMatrix {
    pub fn new(rows: Vec<Vec<f64>>, number_of_labels: usize) -> Result<Self> {
        if number_of_labels == 0 {
            return Err(LcsError::Data(
                "An instance matrix needs at least one label column".to_string(),
            ));
        }
        if let Some(first) = rows.first() {
            let width = first.len();
            if width <= number_of_labels {
                return Err(LcsError::Data(format!(
                    "Rows have {} columns, not enough for {} labels plus attributes",
                    width, number_of_labels
                )));
            }
            if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
                return Err(LcsError::Data(format!(
                    "Row {} has {} columns, expected {}",
                    index,
                    row.len(),
                    width
                )));
            }
        }
        Ok(Self {
            rows,
            number_of_labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn number_of_labels(&self) -> usize {
        self.number_of_labels
    }

    pub fn number_of_attributes(&self) -> usize {
        self.rows
            .first()
            .map(|r| r.len() - self.number_of_labels)
            .unwrap_or(0)
    }

    /// Label values of one row, each read as present when non-zero.
    pub fn labels_of(&self, index: usize) -> Vec<bool> {
        let row = &self.rows[index];
        row[row.len() - self.number_of_labels..]
            .iter()
            .map(|v| *v != 0.0)
            .collect()
    }
}
