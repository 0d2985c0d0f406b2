use crate::types::ValidRequest;

pub const N_RAW: usize = 14;
pub const N_FEATURES: usize = 21;

/// Column order of the engineered feature vector. Trained artifacts refer to
/// columns by these names.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "season",
    "yr",
    "mnth",
    "holiday",
    "weekday",
    "workingday",
    "weathersit",
    "temp",
    "atemp",
    "hum",
    "windspeed",
    "day_of_year",
    "month",
    "day_of_week",
    "temp_humidity",
    "temp_windspeed",
    "weather_temp",
    "spring_temp",
    "summer_temp",
    "fall_temp",
    "winter_temp",
];

pub const SEASON_CODES: [(i64, &str); 4] = [
    (1, "spring_temp"),
    (2, "summer_temp"),
    (3, "fall_temp"),
    (4, "winter_temp"),
];

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// The 14 raw request fields followed by 7 derived terms, in
/// [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.0[i])
    }

    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

pub fn build_features(req: &ValidRequest) -> FeatureVector {
    let [spring, summer, fall, winter] =
        SEASON_CODES.map(|(code, _)| if req.season == code { req.temp } else { 0.0 });

    FeatureVector([
        req.season as f64,
        req.yr as f64,
        req.mnth as f64,
        req.holiday as f64,
        req.weekday as f64,
        req.workingday as f64,
        req.weathersit as f64,
        req.temp,
        req.atemp,
        req.hum,
        req.windspeed,
        req.day_of_year as f64,
        req.month as f64,
        req.day_of_week as f64,
        // interactions
        req.temp * req.hum,
        req.temp * req.windspeed,
        req.weathersit as f64 * req.temp,
        spring,
        summer,
        fall,
        winter,
    ])
}
