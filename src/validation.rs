//! Range and consistency checks for incoming rental requests.
//!
//! Every field is checked on its own first. The two calendar invariants
//! (holiday vs. working day, working day vs. weekday) only run when the
//! fields they compare are themselves in range, so one bad value yields
//! one violation rather than a cascade.

use crate::error::{FieldViolation, ValidationError};
use crate::types::{RentalRequest, ValidRequest};

struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    fn int(&mut self, field: &'static str, value: i64, lo: i64, hi: i64) -> bool {
        if (lo..=hi).contains(&value) {
            return true;
        }
        self.violations.push(FieldViolation {
            field,
            message: format!("must be between {} and {} (got {})", lo, hi, value),
        });
        false
    }

    fn unit(&mut self, field: &'static str, value: f64) -> bool {
        // NaN fails the range test as well
        if (0.0..=1.0).contains(&value) {
            return true;
        }
        self.violations.push(FieldViolation {
            field,
            message: format!("must be between 0 and 1 (got {})", value),
        });
        false
    }

    fn reject(&mut self, field: &'static str, message: &str) {
        self.violations.push(FieldViolation {
            field,
            message: message.to_string(),
        });
    }
}

pub fn validate(req: RentalRequest) -> Result<ValidRequest, ValidationError> {
    let mut c = Checker { violations: Vec::new() };

    c.int("season", req.season, 1, 4);
    c.int("yr", req.yr, 0, 1);
    c.int("mnth", req.mnth, 1, 12);
    let holiday_ok = c.int("holiday", req.holiday, 0, 1);
    let weekday_ok = c.int("weekday", req.weekday, 0, 6);
    let workingday_ok = c.int("workingday", req.workingday, 0, 1);

    if weekday_ok && workingday_ok {
        let weekend = req.weekday == 0 || req.weekday == 6;
        if req.workingday == 1 && weekend {
            c.reject("weekday", "working day cannot be 1 on weekends (weekday 0 or 6)");
        } else if req.workingday == 0 && !weekend {
            c.reject("weekday", "working day cannot be 0 on weekdays (weekday 1-5)");
        }
    }
    if holiday_ok && workingday_ok && req.holiday == 1 && req.workingday == 1 {
        c.reject("workingday", "working day cannot be 1 when holiday is 1");
    }

    c.int("weathersit", req.weathersit, 1, 4);
    c.unit("temp", req.temp);
    c.unit("atemp", req.atemp);
    c.unit("hum", req.hum);
    c.unit("windspeed", req.windspeed);
    c.int("day_of_year", req.day_of_year, 1, 366);
    c.int("month", req.month, 1, 12);
    c.int("day_of_week", req.day_of_week, 0, 6);

    if c.violations.is_empty() {
        Ok(ValidRequest::new_unchecked(req))
    } else {
        Err(ValidationError { violations: c.violations })
    }
}

impl RentalRequest {
    pub fn validate(self) -> Result<ValidRequest, ValidationError> {
        validate(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn summer_monday() -> RentalRequest {
        RentalRequest {
            season: 2,
            yr: 1,
            mnth: 6,
            holiday: 0,
            weekday: 1,
            workingday: 1,
            weathersit: 1,
            temp: 0.5,
            atemp: 0.5,
            hum: 0.6,
            windspeed: 0.2,
            day_of_year: 150,
            month: 6,
            day_of_week: 1,
        }
    }

    #[test]
    fn accepts_reference_request() {
        let valid = summer_monday().validate().unwrap();
        assert_eq!(valid.season, 2);
        assert_eq!(valid.into_inner(), summer_monday());
    }

    #[test]
    fn holiday_on_working_day_rejected_for_any_weekday() {
        for weekday in 0..=6 {
            for weathersit in 1..=4 {
                let req = RentalRequest {
                    holiday: 1,
                    workingday: 1,
                    weekday,
                    weathersit,
                    temp: 0.1 * weathersit as f64,
                    ..summer_monday()
                };
                let err = req.validate().unwrap_err();
                assert!(err.mentions("workingday"), "weekday={} {:?}", weekday, err);
            }
        }
    }

    #[test]
    fn working_sunday_rejected() {
        let req = RentalRequest { workingday: 1, weekday: 0, ..summer_monday() };
        let err = req.validate().unwrap_err();
        assert_eq!(err.fields(), vec!["weekday"]);
    }

    #[test]
    fn non_working_weekday_rejected() {
        let req = RentalRequest { workingday: 0, weekday: 3, ..summer_monday() };
        assert!(req.validate().unwrap_err().mentions("weekday"));
    }

    #[test]
    fn holiday_weekend_accepted() {
        let req = RentalRequest {
            season: 1,
            mnth: 4,
            holiday: 1,
            weekday: 6,
            workingday: 0,
            day_of_year: 100,
            month: 4,
            day_of_week: 6,
            ..summer_monday()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn season_out_of_range_named() {
        let req = RentalRequest { season: 5, ..summer_monday() };
        let err = req.validate().unwrap_err();
        assert_eq!(err.fields(), vec!["season"]);
        assert!(err.violations[0].message.contains("got 5"));
    }

    #[test]
    fn collects_every_violation_in_order() {
        let req = RentalRequest {
            season: 0,
            temp: 1.5,
            hum: -0.1,
            day_of_year: 367,
            day_of_week: 7,
            ..summer_monday()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.fields(), vec!["season", "temp", "hum", "day_of_year", "day_of_week"]);
    }

    #[test]
    fn cross_checks_skip_out_of_range_inputs() {
        // weekday 9 is already invalid; no second weekday complaint
        let req = RentalRequest { weekday: 9, ..summer_monday() };
        assert_eq!(req.validate().unwrap_err().fields(), vec!["weekday"]);

        let req = RentalRequest { holiday: 1, workingday: 2, ..summer_monday() };
        assert_eq!(req.validate().unwrap_err().fields(), vec!["workingday"]);
    }

    #[test]
    fn nan_rejected() {
        let req = RentalRequest { windspeed: f64::NAN, ..summer_monday() };
        assert!(req.validate().unwrap_err().mentions("windspeed"));
    }

    #[test]
    fn unit_bounds_inclusive() {
        let req = RentalRequest { temp: 0.0, atemp: 1.0, hum: 1.0, windspeed: 0.0, ..summer_monday() };
        assert!(req.validate().is_ok());
    }
}
