//! Reference data store.
//!
//! Loads the four CSV tables once at startup and answers read-only
//! lookups: symptom severity weights, disease descriptions, disease
//! precautions, and the encoded disease dataset that backs the
//! nearest-neighbour classifier. Nothing here is mutated after `load`.
//!
//! Every cell goes through `normalize_cell` (whitespace trim) before use.
//! Lookups are exact string matches against the normalized keys.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classifier::FeatureVector;
use crate::config::{ServiceConfig, DESCRIPTION_NOT_AVAILABLE};

/// Dataset symptom labels with stray internal spaces. The severity join
/// runs first; these labels only apply to cells it left unmatched, which
/// are pinned to zero weight without an unmatched-label warning. Do not
/// grow this list; fix the source data instead.
pub const MALFORMED_SYMPTOM_LABELS: [&str; 3] = [
    "dischromic _patches",
    "spotting_ urination",
    "foul_smell_of urine",
];

const COL_SYMPTOM: &str = "Symptom";
const COL_WEIGHT: &str = "weight";
const COL_DISEASE: &str = "Disease";
const COL_DESCRIPTION: &str = "Description";

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} is missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{} has invalid weight '{value}' for symptom '{symptom}'", .path.display())]
    InvalidWeight {
        path: PathBuf,
        symptom: String,
        value: String,
    },

    #[error("{} contains no usable rows", .path.display())]
    Empty { path: PathBuf },
}

/// One row of the disease dataset after severity encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseRecord {
    pub disease: String,
    pub features: FeatureVector,
}

/// Single normalization step applied to every cell of every table.
pub fn normalize_cell(raw: &str) -> &str {
    raw.trim()
}

// ═══════════════════════════════════════════════════════════
// CSV plumbing
// ═══════════════════════════════════════════════════════════

struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self, DataLoadError> {
        let read_err = |source: csv::Error| DataLoadError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_path(path)
            .map_err(read_err)?;

        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    fn column(&self, name: &'static str) -> Result<usize, DataLoadError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                path: self.path.clone(),
                column: name,
            })
    }

    /// Every column except `key`, in header order.
    fn other_columns(&self, key: usize) -> Vec<usize> {
        (0..self.headers.len()).filter(|&i| i != key).collect()
    }
}

fn cell(row: &csv::StringRecord, idx: usize) -> String {
    normalize_cell(row.get(idx).unwrap_or("")).to_string()
}

// ═══════════════════════════════════════════════════════════
// ReferenceData
// ═══════════════════════════════════════════════════════════

/// Immutable lookup tables shared by every prediction request.
#[derive(Debug, Default)]
pub struct ReferenceData {
    symptoms: Vec<String>,
    severity: HashMap<String, f32>,
    descriptions: HashMap<String, String>,
    precautions: HashMap<String, Vec<String>>,
    disease_labels: Vec<String>,
    records: Vec<DiseaseRecord>,
}

impl ReferenceData {
    /// Load all four tables using the paths from `config`.
    pub fn load_from_config(config: &ServiceConfig) -> Result<Self, DataLoadError> {
        Self::load(
            &config.dataset_path,
            &config.severity_path,
            &config.description_path,
            &config.precaution_path,
        )
    }

    /// Parse the four CSV sources and build the lookup tables.
    pub fn load(
        dataset_path: &Path,
        severity_path: &Path,
        description_path: &Path,
        precaution_path: &Path,
    ) -> Result<Self, DataLoadError> {
        let dataset = Table::read(dataset_path)?;
        let severity = Table::read(severity_path)?;
        let descriptions = Table::read(description_path)?;
        let precautions = Table::read(precaution_path)?;

        // Severity: Symptom, weight
        let symptom_col = severity.column(COL_SYMPTOM)?;
        let weight_col = severity.column(COL_WEIGHT)?;
        let mut severity_rows = Vec::with_capacity(severity.rows.len());
        for row in &severity.rows {
            let symptom = cell(row, symptom_col);
            if symptom.is_empty() {
                continue;
            }
            let raw = cell(row, weight_col);
            let weight = raw
                .parse::<f32>()
                .ok()
                .filter(|w| w.is_finite())
                .ok_or_else(|| DataLoadError::InvalidWeight {
                    path: severity.path.clone(),
                    symptom: symptom.clone(),
                    value: raw.clone(),
                })?;
            severity_rows.push((symptom, weight));
        }
        if severity_rows.is_empty() {
            return Err(DataLoadError::Empty {
                path: severity.path.clone(),
            });
        }

        // Descriptions: Disease, Description
        let disease_col = descriptions.column(COL_DISEASE)?;
        let description_col = descriptions.column(COL_DESCRIPTION)?;
        let description_rows = descriptions
            .rows
            .iter()
            .map(|row| (cell(row, disease_col), cell(row, description_col)))
            .collect::<Vec<_>>();

        // Precautions: Disease, then every other column is a slot
        let disease_col = precautions.column(COL_DISEASE)?;
        let slots = precautions.other_columns(disease_col);
        let precaution_rows = precautions
            .rows
            .iter()
            .map(|row| {
                let items = slots.iter().map(|&i| cell(row, i)).collect::<Vec<_>>();
                (cell(row, disease_col), items)
            })
            .collect::<Vec<_>>();

        // Dataset: Disease, then every other column is a symptom slot
        let disease_col = dataset.column(COL_DISEASE)?;
        let slots = dataset.other_columns(disease_col);
        let dataset_rows = dataset
            .rows
            .iter()
            .map(|row| {
                let cells = slots.iter().map(|&i| cell(row, i)).collect::<Vec<_>>();
                (cell(row, disease_col), cells)
            })
            .collect::<Vec<_>>();
        if dataset_rows.is_empty() {
            return Err(DataLoadError::Empty {
                path: dataset.path.clone(),
            });
        }

        let data = Self::from_tables(
            severity_rows,
            description_rows,
            precaution_rows,
            dataset_rows,
        );

        tracing::info!(
            records = data.records.len(),
            symptoms = data.symptoms.len(),
            diseases = data.disease_labels.len(),
            descriptions = data.descriptions.len(),
            precautions = data.precautions.len(),
            "Reference data loaded"
        );

        Ok(data)
    }

    /// Build the store from in-memory rows. Applies the same normalization,
    /// deduplication and dataset encoding as `load`.
    ///
    /// Duplicate keys keep their first occurrence.
    pub fn from_tables<S, D, P, R>(severity: S, descriptions: D, precautions: P, dataset: R) -> Self
    where
        S: IntoIterator<Item = (String, f32)>,
        D: IntoIterator<Item = (String, String)>,
        P: IntoIterator<Item = (String, Vec<String>)>,
        R: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut data = Self::default();

        for (symptom, weight) in severity {
            let symptom = normalize_cell(&symptom).to_string();
            if symptom.is_empty() {
                continue;
            }
            if data.severity.contains_key(&symptom) {
                tracing::warn!(%symptom, weight, "Duplicate severity entry ignored");
                continue;
            }
            data.symptoms.push(symptom.clone());
            data.severity.insert(symptom, weight);
        }

        for (disease, description) in descriptions {
            let disease = normalize_cell(&disease).to_string();
            if disease.is_empty() {
                continue;
            }
            data.descriptions
                .entry(disease)
                .or_insert_with(|| normalize_cell(&description).to_string());
        }

        for (disease, items) in precautions {
            let disease = normalize_cell(&disease).to_string();
            if disease.is_empty() {
                continue;
            }
            let items = items
                .iter()
                .map(|p| normalize_cell(p))
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            data.precautions.entry(disease).or_insert(items);
        }

        let mut seen = HashSet::new();
        let mut unmatched: HashSet<String> = HashSet::new();
        for (disease, cells) in dataset {
            let disease = normalize_cell(&disease).to_string();
            if disease.is_empty() {
                tracing::warn!("Dataset row without disease label skipped");
                continue;
            }
            let weights = cells
                .iter()
                .map(|c| {
                    let c = normalize_cell(c);
                    if !c.is_empty()
                        && !data.severity.contains_key(c)
                        && !MALFORMED_SYMPTOM_LABELS.contains(&c)
                    {
                        unmatched.insert(c.to_string());
                    }
                    data.encode_cell(c)
                })
                .collect::<Vec<_>>();
            if seen.insert(disease.clone()) {
                data.disease_labels.push(disease.clone());
            }
            data.records.push(DiseaseRecord {
                disease,
                features: FeatureVector::from_weights(weights),
            });
        }
        for label in &unmatched {
            tracing::warn!(%label, "Dataset symptom has no severity entry, encoded as 0");
        }

        data
    }

    /// All known symptom names, first-seen order from the severity table.
    pub fn symptoms_list(&self) -> &[String] {
        &self.symptoms
    }

    /// Exact-match severity weight; unknown symptoms weigh 0.
    pub fn severity_weight(&self, symptom: &str) -> f32 {
        self.severity.get(symptom).copied().unwrap_or(0.0)
    }

    /// Description for a disease label, or the "not available" placeholder.
    pub fn description(&self, disease: &str) -> &str {
        self.descriptions
            .get(disease)
            .map(String::as_str)
            .unwrap_or(DESCRIPTION_NOT_AVAILABLE)
    }

    /// Ordered precautions for a disease label; empty when unknown.
    pub fn precautions(&self, disease: &str) -> &[String] {
        self.precautions
            .get(disease)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Unique disease labels in dataset order.
    pub fn disease_labels(&self) -> &[String] {
        &self.disease_labels
    }

    /// Encoded dataset rows.
    pub fn records(&self) -> &[DiseaseRecord] {
        &self.records
    }

    /// Dataset cell → weight: the exact severity weight when the join
    /// matches, otherwise 0 (blank, malformed or unknown labels).
    pub fn encode_cell(&self, raw: &str) -> f32 {
        let value = normalize_cell(raw);
        if value.is_empty() {
            return 0.0;
        }
        self.severity.get(value).copied().unwrap_or(0.0)
    }
}
