use super::instances::InstanceMatrix;
use super::representation::{AttributeRepresentation, AttributeSpec};
use crate::config::RepresentationConfig;
use crate::error::{LcsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// JSON training file: attribute layout, label names and the value rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub attributes: Vec<AttributeSpec>,
    pub labels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn representation(&self, config: &RepresentationConfig) -> Result<AttributeRepresentation> {
        AttributeRepresentation::new(&self.attributes, self.labels.clone(), config)
    }

    pub fn instances(&self) -> Result<InstanceMatrix> {
        let instances = InstanceMatrix::new(self.rows.clone(), self.labels.len())?;
        if !instances.is_empty() && instances.number_of_attributes() != self.attributes.len() {
            return Err(LcsError::Data(format!(
                "Rows carry {} attribute columns but {} attributes are declared",
                instances.number_of_attributes(),
                self.attributes.len()
            )));
        }
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::representation::Representation;

    #[test]
    fn test_parse_dataset() {
        let dataset = Dataset::from_json(
            r#"{
                "attributes": [
                    {"type": "boolean", "name": "windy"},
                    {"type": "interval", "name": "temp", "min": 0.0, "max": 40.0}
                ],
                "labels": ["play", "swim"],
                "rows": [[1.0, 21.5, 1.0, 0.0], [0.0, 30.0, 1.0, 1.0]]
            }"#,
        )
        .unwrap();
        let repr = dataset.representation(&RepresentationConfig::default()).unwrap();
        assert_eq!(repr.number_of_labels(), 2);
        let instances = dataset.instances().unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances.labels_of(1), vec![true, true]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let dataset = Dataset {
            attributes: vec![AttributeSpec::Boolean { name: "a".into() }],
            labels: vec!["l".into()],
            rows: vec![vec![1.0, 0.0], vec![1.0]],
        };
        assert!(dataset.instances().is_err());
    }

    #[test]
    fn test_missing_attribute_columns_rejected() {
        let dataset = Dataset {
            attributes: vec![
                AttributeSpec::Boolean { name: "a".into() },
                AttributeSpec::Boolean { name: "b".into() },
            ],
            labels: vec!["l".into()],
            rows: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        assert!(matches!(dataset.instances(), Err(LcsError::Data(_))));
    }
}
