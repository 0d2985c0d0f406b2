use crate::types::ValidRequest;

pub const BASE: f64 = 0.8;
pub const MIN: f64 = 0.5;
pub const MAX: f64 = 0.95;

/// Rule-based confidence from weather and temperature. It ignores the model
/// output entirely.
pub fn confidence(req: &ValidRequest) -> f64 {
    score(req.weathersit, req.temp)
}

pub fn score(weathersit: i64, temp: f64) -> f64 {
    let mut c = BASE;

    if weathersit == 1 {
        c += 0.1;
    } else if weathersit >= 3 {
        c -= 0.2;
    }

    if (0.3..=0.7).contains(&temp) {
        c += 0.1;
    } else if temp < 0.2 || temp > 0.8 {
        c -= 0.1;
    }

    round2(c.clamp(MIN, MAX))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_and_comfortable_hits_upper_clamp() {
        assert_eq!(score(1, 0.5), 0.95);
    }

    #[test]
    fn heavy_rain_and_heat_hits_lower_clamp() {
        assert_eq!(score(4, 0.9), 0.5);
    }

    #[test]
    fn table() {
        let cases = [
            (2, 0.5, 0.9),
            (2, 0.25, 0.8),
            (2, 0.75, 0.8),
            (2, 0.1, 0.7),
            (1, 0.1, 0.8),
            (1, 0.25, 0.9),
            (3, 0.5, 0.7),
            (3, 0.25, 0.6),
            (3, 0.85, 0.5),
            (4, 0.3, 0.7),
            (4, 0.7, 0.7),
        ];
        for (w, t, expected) in cases {
            assert_eq!(score(w, t), expected, "weathersit={} temp={}", w, t);
        }
    }

    #[test]
    fn band_edges() {
        // 0.2 and 0.8 are neither comfortable nor extreme
        assert_eq!(score(2, 0.2), 0.8);
        assert_eq!(score(2, 0.8), 0.8);
        assert_eq!(score(2, 0.3), 0.9);
        assert_eq!(score(2, 0.7), 0.9);
        assert_eq!(score(2, 0.0), 0.7);
        assert_eq!(score(2, 1.0), 0.7);
    }

    #[test]
    fn always_bounded_and_two_decimals() {
        for w in 1..=4 {
            for step in 0..=100 {
                let c = score(w, step as f64 / 100.0);
                assert!((MIN..=MAX).contains(&c), "{}", c);
                assert_eq!(round2(c), c);
            }
        }
    }
}
