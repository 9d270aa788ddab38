//! Feature schema and the forecast feature table handed to the model

use super::DailyConditions;
use crate::AqiCastError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, unique feature names a model consumes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema; names must be non-empty and unique
    pub fn new<I, S>(names: I) -> Result<Self, AqiCastError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(AqiCastError::schema_mismatch("feature schema is empty"));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(AqiCastError::schema_mismatch("feature name cannot be blank"));
            }
            if !seen.insert(name.as_str()) {
                return Err(AqiCastError::schema_mismatch(format!(
                    "duplicate feature '{name}'"
                )));
            }
        }
        Ok(Self { names })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Names in `self` that `other` lacks
    #[must_use]
    pub fn missing_from<'a>(&'a self, other: &FeatureSchema) -> Vec<&'a str> {
        self.names
            .iter()
            .filter(|n| other.index_of(n).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Describe how `actual` differs from `self`
    #[must_use]
    pub fn describe_mismatch(&self, actual: &FeatureSchema) -> String {
        let missing = self.missing_from(actual);
        let extra = actual.missing_from(self);
        if missing.is_empty() && extra.is_empty() {
            return format!(
                "column order differs: expected [{}], got [{}]",
                self.names.join(", "),
                actual.names.join(", ")
            );
        }
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing columns [{}]", missing.join(", ")));
        }
        if !extra.is_empty() {
            parts.push(format!("unexpected columns [{}]", extra.join(", ")));
        }
        parts.join("; ")
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = AqiCastError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names
    }
}

/// One model input row for a single forecast day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastFeatureRow {
    /// Days after the issue date (1 for tomorrow)
    pub day_offset: u32,
    /// Target date of this row
    pub date: NaiveDate,
    /// Feature values in schema order
    pub values: Vec<f64>,
    /// Weather echoed next to the prediction
    pub conditions: DailyConditions,
}

/// Ordered feature rows, one per forecast day, sharing one schema
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastTable {
    schema: FeatureSchema,
    issued_on: NaiveDate,
    rows: Vec<ForecastFeatureRow>,
}

impl ForecastTable {
    /// Assemble a table; rows must be consecutive days starting at
    /// `issued_on + 1` and carry one value per schema column
    pub fn new(
        schema: FeatureSchema,
        issued_on: NaiveDate,
        rows: Vec<ForecastFeatureRow>,
    ) -> Result<Self, AqiCastError> {
        for (index, row) in rows.iter().enumerate() {
            let expected_offset = u32::try_from(index + 1)
                .map_err(|_| AqiCastError::feature_build("too many forecast rows"))?;
            if row.day_offset != expected_offset {
                return Err(AqiCastError::feature_build(format!(
                    "row {index} has day offset {}, expected {expected_offset}",
                    row.day_offset
                )));
            }
            if row.date != issued_on + chrono::Days::new(u64::from(expected_offset)) {
                return Err(AqiCastError::feature_build(format!(
                    "row {index} is dated {}, expected {issued_on} + {expected_offset} days",
                    row.date
                )));
            }
            if row.values.len() != schema.len() {
                return Err(AqiCastError::feature_build(format!(
                    "row {index} has {} values for {} columns",
                    row.values.len(),
                    schema.len()
                )));
            }
        }
        Ok(Self {
            schema,
            issued_on,
            rows,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Date the forecast was built on ("today")
    #[must_use]
    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    #[must_use]
    pub fn rows(&self) -> &[ForecastFeatureRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove a column from the schema and every row
    #[cfg(test)]
    pub fn drop_column(&mut self, name: &str) -> Result<(), AqiCastError> {
        let index = self.schema.index_of(name).ok_or_else(|| {
            AqiCastError::schema_mismatch(format!("no column named '{name}'"))
        })?;
        let mut names = self.schema.names().to_vec();
        names.remove(index);
        self.schema = FeatureSchema::new(names)?;
        for row in &mut self.rows {
            row.values.remove(index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions() -> DailyConditions {
        DailyConditions {
            temperature: 10.0,
            humidity: 50.0,
            wind_speed: 2.0,
        }
    }

    fn row(day_offset: u32, values: Vec<f64>) -> ForecastFeatureRow {
        ForecastFeatureRow {
            day_offset,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Days::new(u64::from(day_offset)),
            values,
            conditions: conditions(),
        }
    }

    #[test]
    fn test_schema_rejects_duplicates_and_empty() {
        assert!(FeatureSchema::new(Vec::<String>::new()).is_err());
        assert!(FeatureSchema::new(["a", "b", "a"]).is_err());
        assert!(FeatureSchema::new(["a", " "]).is_err());
        assert_eq!(FeatureSchema::new(["a", "b"]).unwrap().len(), 2);
    }

    #[test]
    fn test_schema_mismatch_description() {
        let expected = FeatureSchema::new(["temperature", "humidity"]).unwrap();
        let actual = FeatureSchema::new(["temperature", "pressure"]).unwrap();
        let message = expected.describe_mismatch(&actual);
        assert!(message.contains("missing columns [humidity]"));
        assert!(message.contains("unexpected columns [pressure]"));

        let reordered = FeatureSchema::new(["humidity", "temperature"]).unwrap();
        assert!(expected.describe_mismatch(&reordered).contains("order differs"));
    }

    #[test]
    fn test_schema_serde_validates() {
        let schema: FeatureSchema = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(schema.names(), ["a", "b"]);
        assert!(serde_json::from_str::<FeatureSchema>(r#"["a", "a"]"#).is_err());
    }

    #[test]
    fn test_table_validates_rows() {
        let schema = FeatureSchema::new(["a", "b"]).unwrap();
        let issued_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let table = ForecastTable::new(
            schema.clone(),
            issued_on,
            vec![row(1, vec![1.0, 2.0]), row(2, vec![3.0, 4.0])],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].values, vec![3.0, 4.0]);

        let wrong_width = ForecastTable::new(schema.clone(), issued_on, vec![row(1, vec![1.0])]);
        assert!(matches!(wrong_width, Err(AqiCastError::FeatureBuild { .. })));

        let out_of_order = ForecastTable::new(schema, issued_on, vec![row(2, vec![1.0, 2.0])]);
        assert!(matches!(out_of_order, Err(AqiCastError::FeatureBuild { .. })));
    }

    #[test]
    fn test_drop_column() {
        let schema = FeatureSchema::new(["a", "b", "c"]).unwrap();
        let issued_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut table =
            ForecastTable::new(schema, issued_on, vec![row(1, vec![1.0, 2.0, 3.0])]).unwrap();

        table.drop_column("b").unwrap();
        assert_eq!(table.schema().names(), ["a", "c"]);
        assert_eq!(table.rows()[0].values, vec![1.0, 3.0]);
        assert!(table.drop_column("b").is_err());
    }
}
