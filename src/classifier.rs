//! Splits uploads into regular videos and Shorts.
//!
//! Durations come from the Data API in batches of [`PAGE_SIZE`]. Anything the
//! API cannot answer for falls back to title keywords.

use tracing::{debug, warn};

use crate::catalog::VideoItem;
use crate::youtube::{PAGE_SIZE, VideoPlatform};

/// Uploads at or below this many seconds are Shorts.
pub const SHORT_MAX_SECONDS: f64 = 65.0;
const SHORT_KEYWORDS: [&str; 3] = ["#shorts", "#short", "short:"];

/// Result of a classification pass. Both lists keep the input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub regular: Vec<VideoItem>,
    pub shorts: Vec<VideoItem>,
}

impl Classification {
    fn push(&mut self, item: &VideoItem, is_short: bool) {
        if is_short {
            self.shorts.push(item.clone());
        } else {
            self.regular.push(item.clone());
        }
    }
}

pub fn classify(platform: &dyn VideoPlatform, items: &[VideoItem]) -> Classification {
    let mut result = Classification::default();

    for (index, batch) in items.chunks(PAGE_SIZE).enumerate() {
        let ids: Vec<String> = batch.iter().map(|item| item.video_id.clone()).collect();
        match platform.durations(&ids) {
            Ok(durations) => {
                for item in batch {
                    let seconds = durations
                        .get(&item.video_id)
                        .and_then(|raw| parse_iso8601_duration(raw));
                    let is_short = match seconds {
                        Some(seconds) => seconds <= SHORT_MAX_SECONDS,
                        None => {
                            debug!(video_id = %item.video_id, "no usable duration, using title");
                            is_short_by_title(&item.title)
                        }
                    };
                    result.push(item, is_short);
                }
            }
            Err(err) => {
                warn!(batch = index, "duration lookup failed, classifying by title: {err}");
                for item in batch {
                    result.push(item, is_short_by_title(&item.title));
                }
            }
        }
    }

    result
}

pub fn is_short_by_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    SHORT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Parses `PnWnDTnHnMnS` durations into seconds. Year and month components
/// have no fixed length and are rejected.
pub fn parse_iso8601_duration(value: &str) -> Option<f64> {
    let rest = value.trim().strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, Some(time))
        }
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return None;
    }

    let mut total = 0.0;
    total += sum_components(date_part, &[('W', 604_800.0), ('D', 86_400.0)])?;
    if let Some(time) = time_part {
        total += sum_components(time, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)])?;
    }
    Some(total)
}

/// Adds up `<number><unit>` pairs. Units must appear in the given order and
/// at most once.
fn sum_components(part: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next_unit = 0;

    for ch in part.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            number.push(if ch == ',' { '.' } else { ch });
            continue;
        }
        let offset = units[next_unit..].iter().position(|(unit, _)| *unit == ch)?;
        if number.is_empty() {
            return None;
        }
        let amount: f64 = number.parse().ok()?;
        total += amount * units[next_unit + offset].1;
        next_unit += offset + 1;
        number.clear();
    }

    if number.is_empty() { Some(total) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePlatform, video};

    fn ids(items: &[VideoItem]) -> Vec<&str> {
        items.iter().map(|item| item.video_id.as_str()).collect()
    }

    #[test]
    fn threshold_is_inclusive_at_65_seconds() {
        let platform = FakePlatform::default()
            .with_duration("edge", "PT1M5S")
            .with_duration("over", "PT1M6S");
        let items = vec![video("edge", "2024-01-02"), video("over", "2024-01-01")];

        let result = classify(&platform, &items);
        assert_eq!(ids(&result.shorts), vec!["edge"]);
        assert_eq!(ids(&result.regular), vec!["over"]);
    }

    #[test]
    fn failed_batch_falls_back_to_title_keywords() {
        let platform = FakePlatform::default().failing_durations();
        let mut tagged = video("tagged", "2024-01-02");
        tagged.title = "Best moment #Shorts".into();
        let plain = video("plain", "2024-01-01");

        let result = classify(&platform, &[tagged, plain]);
        assert_eq!(ids(&result.shorts), vec!["tagged"]);
        assert_eq!(ids(&result.regular), vec!["plain"]);
    }

    #[test]
    fn unknown_ids_use_title_and_output_partitions_input() {
        // "gone" is missing from the duration response, "weird" has an
        // unparseable duration.
        let platform = FakePlatform::default()
            .with_duration("long", "PT10M")
            .with_duration("weird", "P1M");
        let mut gone = video("gone", "2024-01-03");
        gone.title = "SHORT: quick tip".into();
        let items = vec![gone, video("long", "2024-01-02"), video("weird", "2024-01-01")];

        let result = classify(&platform, &items);
        assert_eq!(ids(&result.shorts), vec!["gone"]);
        assert_eq!(ids(&result.regular), vec!["long", "weird"]);
        assert_eq!(result.shorts.len() + result.regular.len(), items.len());
    }

    #[test]
    fn batches_hold_at_most_fifty_ids() {
        let platform = FakePlatform::default();
        let items: Vec<VideoItem> = (0..120)
            .map(|n| video(&format!("v{n:03}"), "2024-01-01"))
            .collect();

        let result = classify(&platform, &items);
        assert_eq!(platform.duration_batches(), vec![50, 50, 20]);
        // No durations known and no keywords: everything is regular.
        assert_eq!(result.regular.len(), 120);
        assert_eq!(result.regular[0].video_id, "v000");
    }

    #[test]
    fn title_keywords_are_case_insensitive() {
        assert!(is_short_by_title("Cooking #SHORT"));
        assert!(is_short_by_title("short: the recap"));
        assert!(!is_short_by_title("Shortcuts for beginners"));
    }

    #[test]
    fn parses_iso8601_durations() {
        assert_eq!(parse_iso8601_duration("PT0S"), Some(0.0));
        assert_eq!(parse_iso8601_duration("PT1M5S"), Some(65.0));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723.0));
        assert_eq!(parse_iso8601_duration("P1DT2H"), Some(93_600.0));
        assert_eq!(parse_iso8601_duration("P0D"), Some(0.0));
        assert_eq!(parse_iso8601_duration("P1W"), Some(604_800.0));
        assert_eq!(parse_iso8601_duration("PT65.5S"), Some(65.5));
    }

    #[test]
    fn rejects_malformed_durations() {
        for raw in ["", "P", "PT", "1M5S", "PT5", "PTM", "PT5S1M", "P1M", "P1Y", "PT1M1M"] {
            assert_eq!(parse_iso8601_duration(raw), None, "{raw}");
        }
    }
}
