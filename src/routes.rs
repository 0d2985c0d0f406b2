use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::{path::Path, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    confidence::confidence,
    error::ApiError,
    features::{build_features, FeatureVector},
    model::{self, ModelArtifacts, Predictor},
    types::{DocsInfo, EndpointDoc, HealthStatus, PredictionResponse, RentalRequest, RootInfo},
};

// ---------- Server state ----------

/// Read-only context shared by every request. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    predictor: Option<Arc<Predictor>>,
    model_loaded: bool,
    scaler_loaded: bool,
    log_predictions: bool,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Some(Arc::new(predictor)),
            model_loaded: true,
            scaler_loaded: true,
            log_predictions: false,
        }
    }

    /// Every `/predict` call answers 503.
    pub fn unavailable(model_loaded: bool, scaler_loaded: bool) -> Self {
        Self {
            predictor: None,
            model_loaded,
            scaler_loaded,
            log_predictions: false,
        }
    }

    pub fn with_prediction_logging(mut self, on: bool) -> Self {
        self.log_predictions = on;
        self
    }

    /// Loads each artifact independently so health can report the model
    /// (regressor plus column list) and the scaler separately. Failures are
    /// logged, never fatal.
    pub fn from_artifact_dir(dir: &Path) -> Self {
        tracing::info!("loading model artifacts from {}", dir.display());

        let regressor = model::load_regressor(&dir.join(model::MODEL_FILE))
            .map_err(|e| tracing::error!("error loading model: {:#}", e))
            .ok();
        let scaler = model::load_scaler(&dir.join(model::SCALER_FILE))
            .map_err(|e| tracing::error!("error loading scaler: {:#}", e))
            .ok();
        let columns = model::load_feature_columns(&dir.join(model::FEATURES_FILE))
            .map_err(|e| tracing::error!("error loading feature columns: {:#}", e))
            .ok();

        // the model is unusable without its column order
        let model_loaded = regressor.is_some() && columns.is_some();
        let scaler_loaded = scaler.is_some();
        let (Some(regressor), Some(scaler), Some(feature_columns)) = (regressor, scaler, columns) else {
            return Self::unavailable(model_loaded, scaler_loaded);
        };

        match Predictor::new(ModelArtifacts { regressor, scaler, feature_columns }) {
            Ok(p) => {
                tracing::info!("loaded model; feat_list[{}]: {:?}", p.columns().len(), p.columns());
                Self::new(p)
            }
            Err(e) => {
                // loaded but unusable; report as not loaded
                tracing::error!("model artifacts are inconsistent: {:#}", e);
                Self::unavailable(false, false)
            }
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    pub fn scaler_loaded(&self) -> bool {
        self.scaler_loaded
    }

    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }
}

// ---------- Handlers ----------

async fn root(State(state): State<AppState>) -> Json<RootInfo> {
    Json(RootInfo {
        message: "Bike Sharing Demand Prediction API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        model_loaded: state.model_loaded(),
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        model_loaded: state.model_loaded(),
        scaler_loaded: state.scaler_loaded(),
    })
}

async fn docs() -> Json<DocsInfo> {
    let ep = |method: &str, path: &str, description: &str| EndpointDoc {
        method: method.to_string(),
        path: path.to_string(),
        description: description.to_string(),
    };
    Json(DocsInfo {
        message: "Visit /docs for API documentation".to_string(),
        endpoints: vec![
            ep("GET", "/", "service info and model status"),
            ep("GET", "/health", "health check with artifact load status"),
            ep("POST", "/predict", "predict daily bike rentals from weather and calendar fields"),
            ep("GET", "/docs", "this listing"),
        ],
    })
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RentalRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
    let req = req.validate()?;

    let predictor = state.predictor.as_ref().ok_or(ApiError::ModelUnavailable)?;

    let fv = build_features(&req);
    if state.log_predictions {
        log_features(&fv);
    }

    let predicted_rentals = predictor.predict(&fv)?;
    let confidence = confidence(&req);
    if state.log_predictions {
        tracing::info!(predicted_rentals, confidence, model = predictor.model_name(), "prediction served");
    } else {
        tracing::debug!(predicted_rentals, confidence, "prediction served");
    }

    Ok(Json(PredictionResponse::new(predicted_rentals, confidence)))
}

// Summary of the engineered row, to spot requests that reach the model as all-zeros
fn log_features(fv: &FeatureVector) {
    let v = fv.as_slice();
    let n = v.len() as f64;
    let nz = v.iter().filter(|x| **x != 0.0).count();
    let mean = v.iter().sum::<f64>() / n;
    let std = (v.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n).sqrt();
    let sample: Vec<String> = fv
        .iter_named()
        .take(6)
        .map(|(name, x)| format!("{}={:.3}", name, x))
        .collect();
    tracing::info!(
        "features in_dim={} nonzero={} mean={:.3} std={:.3} sample=[{}]",
        v.len(), nz, mean, std, sample.join(", ")
    );
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/docs", get(docs))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
