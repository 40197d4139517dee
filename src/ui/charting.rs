use quik::metrics::WpmSample;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(samples: &[WpmSample]) -> (f64, f64) {
    let mut highest_wpm = 0.0;
    for sample in samples {
        if sample.wpm > highest_wpm {
            highest_wpm = sample.wpm;
        }
    }

    let mut overall_duration = match samples.last() {
        Some(sample) => sample.t,
        None => 1.0,
    };
    if overall_duration < 1.0 {
        overall_duration = 1.0;
    }

    (overall_duration, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 1.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_compute_chart_params_from_samples() {
        let samples = vec![
            WpmSample { t: 1.0, wpm: 20.0 },
            WpmSample { t: 2.0, wpm: 35.4 },
            WpmSample { t: 3.0, wpm: 30.0 },
        ];
        let (x, y) = compute_chart_params(&samples);
        assert_eq!(x, 3.0);
        assert_eq!(y, 35.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
