use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Raw prediction request, one field per column of the daily rental dataset.
///
/// Integer fields are read as `i64` so out-of-range values (e.g. `season = 5`)
/// reach the validator instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub season: i64,      // 1=spring, 2=summer, 3=fall, 4=winter
    pub yr: i64,          // 0=2011, 1=2012
    pub mnth: i64,        // 1..=12
    pub holiday: i64,     // 0/1
    pub weekday: i64,     // 0=Sunday .. 6=Saturday
    pub workingday: i64,  // 0/1
    pub weathersit: i64,  // 1=clear, 2=mist, 3=light rain/snow, 4=heavy rain/snow
    pub temp: f64,        // normalized [0,1]
    pub atemp: f64,       // normalized feeling temperature [0,1]
    pub hum: f64,         // normalized humidity [0,1]
    pub windspeed: f64,   // normalized [0,1]
    pub day_of_year: i64, // 1..=366
    pub month: i64,       // 1..=12
    pub day_of_week: i64, // 0..=6
}

/// A request that passed validation. Only `validation::validate` builds one,
/// and the wrapped record cannot be mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRequest(RentalRequest);

impl ValidRequest {
    pub(crate) fn new_unchecked(req: RentalRequest) -> Self {
        Self(req)
    }

    pub fn into_inner(self) -> RentalRequest {
        self.0
    }
}

impl Deref for ValidRequest {
    type Target = RentalRequest;

    fn deref(&self) -> &RentalRequest {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_rentals: u64,
    pub confidence: f64,
    pub message: String,
}

impl PredictionResponse {
    pub fn new(predicted_rentals: u64, confidence: f64) -> Self {
        Self {
            predicted_rentals,
            confidence,
            message: format!(
                "Predicted {} bike rentals for the given conditions",
                predicted_rentals
            ),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootInfo {
    pub message: String,
    pub version: String,
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    pub scaler_loaded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointDoc {
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocsInfo {
    pub message: String,
    pub endpoints: Vec<EndpointDoc>,
}
