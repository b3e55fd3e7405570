//! The set of charts listed in `chartlimits.csv`.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::chart::Chart;
use crate::error::ChartError;
use crate::geo::LatLonEnvelope;
use crate::overrides::ChartOverrides;
use crate::Result;

/// All charts that could be built from a chart list.
#[derive(Debug, Default)]
pub struct ChartCatalog {
    charts: Vec<Chart>,
}

impl ChartCatalog {
    /// Loads `chartlimits.csv`, one descriptor line per chart.
    ///
    /// Lines that fail to parse are logged and skipped.
    pub fn load<P: AsRef<Path>>(path: P, overrides: &ChartOverrides) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_lines(&text, overrides);
        info!(path = %path.display(), charts = catalog.len(), "loaded chart list");
        Ok(catalog)
    }

    /// Builds charts from descriptor lines; blank lines and `#` comments are
    /// ignored.
    pub fn from_lines(text: &str, overrides: &ChartOverrides) -> Self {
        let mut charts = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Chart::from_line(line, overrides) {
                Ok(chart) => charts.push(chart),
                Err(e) => warn!(line = number + 1, error = %e, "skipping chart"),
            }
        }
        Self { charts }
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chart> {
        self.charts.iter()
    }

    /// Finds a chart by full name (`New York SEC 92`) or by name without
    /// revision (`New York SEC`).
    pub fn get(&self, name: &str) -> Result<&Chart> {
        self.charts
            .iter()
            .find(|c| c.full_name() == name)
            .or_else(|| self.charts.iter().find(|c| c.descriptor().name == name))
            .ok_or_else(|| ChartError::UnknownChart(name.to_string()))
    }

    /// Charts whose charted area overlaps the viewport, ordered by their
    /// auto-ordering hint (charts without one last).
    pub fn contributing(&self, viewport: &LatLonEnvelope) -> Vec<&Chart> {
        let mut found: Vec<&Chart> = self
            .charts
            .iter()
            .filter(|c| c.contributes_to(viewport))
            .collect();
        found.sort_by_key(|c| c.bounds().auto_order.unwrap_or(i32::MAX));
        found
    }
}
