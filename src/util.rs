use std::time::{Duration, Instant};

/// Formats a duration as `HH:MM:SS.mmm`.
pub fn format_hms(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

pub fn print_hms(start: &Instant) {
    println!("Elapsed: {}", format_hms(start.elapsed()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_millis(0)), "00:00:00.000");
        assert_eq!(format_hms(Duration::from_millis(3_723_045)), "01:02:03.045");
    }
}
