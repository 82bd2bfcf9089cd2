use serde::Serialize;

/// `m:ss`, the way the player's time readout shows positions. Anything that
/// is not a finite, non-negative number reads as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Fraction of the video played, in `0.0..=1.0`. Zero while the duration is
/// unknown.
pub fn progress_fraction(position: f64, duration: f64) -> f64 {
    if !position.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    (position / duration).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedPreset {
    pub value: f64,
    pub label: String,
}

pub fn speed_presets(rates: &[f64]) -> Vec<SpeedPreset> {
    rates
        .iter()
        .map(|&value| SpeedPreset {
            value,
            label: format!("{}x", value),
        })
        .collect()
}
