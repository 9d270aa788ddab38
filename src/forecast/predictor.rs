//! Applies a loaded model to a forecast feature table

use chrono::Days;
use tracing::debug;

use super::model::Model;
use crate::AqiCastError;
use crate::models::{ForecastTable, PredictionRow};

/// Predict AQI for every row of `features`, in row order.
///
/// Row `i` is dated `issued_on + (i + 1)` days. Nothing is returned unless
/// every row is predicted.
pub fn predict(model: &Model, features: &ForecastTable) -> Result<Vec<PredictionRow>, AqiCastError> {
    let expected = model.feature_schema();
    if features.schema() != expected {
        return Err(AqiCastError::schema_mismatch(
            expected.describe_mismatch(features.schema()),
        ));
    }

    let issued_on = features.issued_on();
    let mut predictions = Vec::with_capacity(features.len());
    for (index, row) in features.rows().iter().enumerate() {
        if row.values.len() != expected.len() {
            return Err(AqiCastError::schema_mismatch(format!(
                "row {index} has {} values, model expects {}",
                row.values.len(),
                expected.len()
            )));
        }
        let date = issued_on + Days::new(index as u64 + 1);
        let predicted_aqi = model.predict_row(&row.values);
        debug!("Predicted AQI {predicted_aqi:.1} for {date}");
        predictions.push(PredictionRow::new(predicted_aqi, row.conditions, date));
    }
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::model::Estimator;
    use crate::models::{DailyConditions, FeatureSchema, ForecastFeatureRow};
    use chrono::NaiveDate;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["temperature", "humidity", "wind_speed"]).unwrap()
    }

    fn linear_model() -> Model {
        Model::new(
            "linear",
            schema(),
            Estimator::Linear {
                intercept: 20.0,
                coefficients: vec![1.0, 0.5, -2.0],
            },
        )
        .unwrap()
    }

    fn table() -> ForecastTable {
        let issued_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = (1..=3)
            .map(|offset| {
                let t = f64::from(offset);
                ForecastFeatureRow {
                    day_offset: offset,
                    date: issued_on + Days::new(u64::from(offset)),
                    values: vec![t, 10.0 * t, 1.0],
                    conditions: DailyConditions {
                        temperature: t,
                        humidity: 10.0 * t,
                        wind_speed: 1.0,
                    },
                }
            })
            .collect();
        ForecastTable::new(schema(), issued_on, rows).unwrap()
    }

    #[test]
    fn test_predictions_follow_row_order_and_dates() {
        let predictions = predict(&linear_model(), &table()).unwrap();

        assert_eq!(predictions.len(), 3);
        let dates: Vec<String> = predictions.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-03", "2024-01-04"]);

        // 20 + t + 5t - 2
        let aqi: Vec<f64> = predictions.iter().map(|p| p.predicted_aqi).collect();
        assert_eq!(aqi, vec![24.0, 30.0, 36.0]);
        assert_eq!(predictions[1].temperature, 2.0);
        assert_eq!(predictions[1].humidity, 20.0);
        assert_eq!(predictions[1].wind_speed, 1.0);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let mut table = table();
        table.drop_column("humidity").unwrap();

        let err = predict(&linear_model(), &table).unwrap_err();
        assert!(matches!(err, AqiCastError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("missing columns [humidity]"));
    }

    #[test]
    fn test_reordered_columns_are_schema_mismatch() {
        let model = Model::new(
            "linear",
            FeatureSchema::new(["humidity", "temperature", "wind_speed"]).unwrap(),
            Estimator::Linear {
                intercept: 0.0,
                coefficients: vec![1.0, 1.0, 1.0],
            },
        )
        .unwrap();
        let err = predict(&model, &table()).unwrap_err();
        assert!(matches!(err, AqiCastError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_empty_table_predicts_nothing() {
        let issued_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let table = ForecastTable::new(schema(), issued_on, Vec::new()).unwrap();
        assert!(predict(&linear_model(), &table).unwrap().is_empty());
    }
}
