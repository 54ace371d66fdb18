use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DEFAULT_DATASET_FILE;
use crate::data::filter::{run_query, Query, QueryError, QueryOutcome, Rank, ResultTable};
use crate::data::loader::load_dataset;
use crate::data::model::{CellValue, Dataset, Schema};
use crate::export::ExportFormat;

// ---------------------------------------------------------------------------
// Filter dimensions offered by the form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Branch,
    District,
    Region,
    Year,
}

impl FilterDimension {
    pub fn label(self) -> &'static str {
        match self {
            FilterDimension::Branch => "Branch(es)",
            FilterDimension::District => "District(s)",
            FilterDimension::Region => "Region(s)",
            FilterDimension::Year => "Year(s) of Estab",
        }
    }

    /// Dimensions the schema supports; region only with a region column.
    pub fn available(schema: &Schema) -> Vec<FilterDimension> {
        let mut dims = vec![FilterDimension::Branch, FilterDimension::District];
        if schema.has_region {
            dims.push(FilterDimension::Region);
        }
        dims.push(FilterDimension::Year);
        dims
    }

    pub fn options(self, schema: &Schema) -> &BTreeSet<CellValue> {
        match self {
            FilterDimension::Branch => &schema.branch_codes,
            FilterDimension::District => &schema.district_codes,
            FilterDimension::Region => &schema.region_codes,
            FilterDimension::Year => &schema.year_codes,
        }
    }
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

/// What the user has typed and ticked; nothing is validated until submit.
#[derive(Debug, Clone, Default)]
pub struct PredictionForm {
    pub cutoff_key: Option<String>,
    pub rank_input: String,
    pub branches: BTreeSet<CellValue>,
    pub districts: BTreeSet<CellValue>,
    pub regions: BTreeSet<CellValue>,
    pub years: BTreeSet<CellValue>,
}

impl PredictionForm {
    pub fn selection_mut(&mut self, dim: FilterDimension) -> &mut BTreeSet<CellValue> {
        match dim {
            FilterDimension::Branch => &mut self.branches,
            FilterDimension::District => &mut self.districts,
            FilterDimension::Region => &mut self.regions,
            FilterDimension::Year => &mut self.years,
        }
    }

    /// Validate the inputs into a query. The rank is checked first so bad
    /// input never reaches the filter.
    pub fn to_query(&self, schema: &Schema) -> Result<Query, QueryError> {
        let rank = Rank::parse(&self.rank_input)?;
        let key = self.cutoff_key.as_deref().unwrap_or_default();
        let cutoff = schema
            .cutoff_column(key)
            .cloned()
            .ok_or_else(|| QueryError::UnknownCutoffColumn(key.to_string()))?;

        let mut query = Query::new(cutoff, rank);
        query.branches = self.branches.clone();
        query.districts = self.districts.clone();
        query.years = self.years.clone();
        if schema.has_region {
            query.regions = self.regions.clone();
        }
        Ok(query)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file loads).
    pub dataset: Option<Dataset>,

    pub form: PredictionForm,

    /// Outcome of the last submission (None before the first one).
    pub outcome: Option<Result<QueryOutcome, QueryError>>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    /// State after trying the default dataset in the working directory.
    pub fn with_default_dataset() -> Self {
        let mut state = AppState::default();
        let path = Path::new(DEFAULT_DATASET_FILE);
        if path.exists() {
            state.load_path(path);
        } else {
            log::warn!("Default dataset {DEFAULT_DATASET_FILE} not found");
            state.status_message = Some(format!(
                "{DEFAULT_DATASET_FILE} not found; use File → Open dataset…"
            ));
        }
        state
    }

    /// Load a file, replacing the current dataset on success.
    pub fn load_path(&mut self, path: &Path) {
        match load_dataset(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the form.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.form = PredictionForm {
            cutoff_key: dataset
                .schema
                .cutoff_columns
                .first()
                .map(|c| c.as_str().to_string()),
            ..PredictionForm::default()
        };
        self.outcome = None;
        self.status_message = None;
        self.dataset = Some(dataset);
    }

    /// Validate the form and run the query as one step.
    pub fn submit(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let outcome = self
            .form
            .to_query(&dataset.schema)
            .and_then(|query| run_query(&dataset.table, &dataset.schema, &query));
        if let Err(e) = &outcome {
            log::warn!("Rejected submission: {e}");
        }
        self.outcome = Some(outcome);
    }

    /// The current non-empty result, if any.
    pub fn result(&self) -> Option<&ResultTable> {
        match &self.outcome {
            Some(Ok(QueryOutcome::Matches(result))) => Some(result),
            _ => None,
        }
    }

    pub fn toggle_selection(&mut self, dim: FilterDimension, value: &CellValue) {
        let selected = self.form.selection_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
    }

    /// Write the current result to `path` in the given format.
    pub fn export_to(&self, format: ExportFormat, path: &Path) -> Result<()> {
        let result = self.result().context("no results to export")?;
        let bytes = format.render(result)?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!(
            "Exported {} rows as {} to {}",
            result.len(),
            format.mime_type(),
            path.display()
        );
        Ok(())
    }
}
