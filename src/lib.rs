//! Daily bike-rental demand prediction service.
//!
//! A request is validated, expanded into the 21-column engineered feature
//! vector, scaled and run through the trained regressor; a rule-based
//! confidence score is attached to the clamped rental count.

pub mod config;
pub mod confidence;
pub mod error;
pub mod features;
pub mod model;
pub mod routes;
pub mod types;
pub mod validation;

pub use error::{ApiError, PredictionError, ValidationError};
pub use features::{build_features, FeatureVector, FEATURE_NAMES};
pub use model::{ModelArtifacts, Predictor, Regressor, Scaler};
pub use routes::{router, AppState};
pub use types::{PredictionResponse, RentalRequest, ValidRequest};
