//! Chart descriptor lines.
//!
//! One line of `chartlimits.csv` describes one chart: projection fields
//! followed by `width,height,effectiveDate,expirationDate,"Name Revision"`.

use chrono::NaiveDate;

use crate::error::ChartError;
use crate::projection::{Projection, ProjectionParams};
use crate::Result;

/// Expiration dates at or beyond this value mean the chart never expires.
const INDEFINITE_DATE: u32 = 9999_0000;

/// Everything known about a chart from its descriptor line.
#[derive(Debug, Clone)]
pub struct ChartDescriptor {
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
    /// First day the chart is valid, if published.
    pub effective: Option<NaiveDate>,
    /// Last day the chart is valid, `None` when indefinite.
    pub expiration: Option<NaiveDate>,
    /// Name including revision, e.g. `New York SEC 92`.
    pub full_name: String,
    /// Name without revision, e.g. `New York SEC`.
    pub name: String,
    /// Revision, e.g. `92`.
    pub revision: String,
    /// Projection parameters as read from the line.
    pub params: ProjectionParams,
}

impl ChartDescriptor {
    /// Parses one descriptor line.
    pub fn parse(line: &str) -> Result<Self> {
        let (params, suffix) = ProjectionParams::parse(line)?;
        let fields = split_quoted(&suffix)?;
        if fields.len() < 5 {
            return Err(ChartError::MalformedDescriptor(line.to_string()));
        }

        let width = parse_dimension("width", &fields[0])?;
        let height = parse_dimension("height", &fields[1])?;
        let effective = parse_date("effective date", &fields[2])?;
        let expiration = parse_date("expiration date", &fields[3])?;

        let full_name = fields[4].trim().to_string();
        let (name, revision) = full_name
            .rsplit_once(' ')
            .map(|(n, r)| (n.trim_end().to_string(), r.to_string()))
            .filter(|(n, r)| !n.is_empty() && !r.is_empty())
            .ok_or_else(|| {
                ChartError::MalformedDescriptor(format!("chart name '{full_name}' has no revision"))
            })?;

        Ok(Self {
            width,
            height,
            effective,
            expiration,
            full_name,
            name,
            revision,
            params,
        })
    }

    /// Builds the projection for this chart.
    pub fn projection(&self) -> Result<Projection> {
        self.params.build(self.width, self.height, &self.full_name)
    }

    /// Whether the chart's expiration date is before `today`.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiration.is_some_and(|end| end < today)
    }

    /// Full name with spaces replaced, as used for directory names.
    pub fn file_stem(&self) -> String {
        self.full_name.replace(' ', "_")
    }

    /// Name without revision with spaces replaced, as used for manifests.
    pub fn name_stem(&self) -> String {
        self.name.replace(' ', "_")
    }
}

/// Splits a comma-separated line honoring double quotes and backslash
/// escapes.
pub(crate) fn split_quoted(line: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .double_quote(false)
        .escape(Some(b'\\'))
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Vec::new());
    }
    Ok(record.iter().map(str::to_string).collect())
}

fn parse_dimension(field: &'static str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ChartError::InvalidField {
            field,
            value: raw.to_string(),
        })
}

/// Parses a `yyyymmdd` date; zero and the far-future sentinel yield `None`.
fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>> {
    let invalid = || ChartError::InvalidField {
        field,
        value: raw.to_string(),
    };
    let value: u32 = raw.trim().parse().map_err(|_| invalid())?;
    if value == 0 || value >= INDEFINITE_DATE {
        return Ok(None);
    }
    NaiveDate::from_ymd_opt((value / 10000) as i32, value / 100 % 100, value % 100)
        .map(Some)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_box_descriptor() {
        let d = ChartDescriptor::parse("box:45,-72,44,-70,2000,1500,20240101,20240701,Test Box 7")
            .unwrap();
        assert_eq!((d.width, d.height), (2000, 1500));
        assert_eq!(d.effective, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(d.expiration, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(d.full_name, "Test Box 7");
        assert_eq!(d.name, "Test Box");
        assert_eq!(d.revision, "7");
        assert_eq!(d.file_stem(), "Test_Box_7");
        assert_eq!(d.name_stem(), "Test_Box");
    }

    #[test]
    fn test_quoted_name_with_comma() {
        let d = ChartDescriptor::parse(r#"box:45,-72,44,-70,2000,1500,0,0,"Anchorage, AK TAC 12""#)
            .unwrap();
        assert_eq!(d.name, "Anchorage, AK TAC");
        assert_eq!(d.revision, "12");
        assert_eq!(d.effective, None);
        assert_eq!(d.expiration, None);
    }

    #[test]
    fn test_indefinite_sentinel() {
        let d = ChartDescriptor::parse(
            "psp:88,-36,80,24,4337,87,5737,199,1118,4690,8090,5279,9254,6693,19690603,99999999,ONC A-1 19690603",
        )
        .unwrap();
        assert_eq!(d.effective, NaiveDate::from_ymd_opt(1969, 6, 3));
        assert_eq!(d.expiration, None);
        assert_eq!(d.name, "ONC A-1");
        assert!(!d.is_expired_on(NaiveDate::from_ymd_opt(2100, 1, 1).unwrap()));
    }

    #[test]
    fn test_expiry() {
        let d = ChartDescriptor::parse("box:45,-72,44,-70,20,15,20240101,20240701,Old Box 1").unwrap();
        assert!(!d.is_expired_on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert!(d.is_expired_on(NaiveDate::from_ymd_opt(2024, 7, 2).unwrap()));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(ChartDescriptor::parse("box:45,-72,44,-70,2000,1500,0,0").is_err());
        assert!(ChartDescriptor::parse("box:45,-72,44,-70,2000,1500,0,0,NoRevision").is_err());
        assert!(ChartDescriptor::parse("box:45,-72,44,-70,0,1500,0,0,Zero Width").is_err());
        assert!(ChartDescriptor::parse("box:45,-72,44,-70,20,15,20241345,0,Bad Date").is_err());
    }
}
