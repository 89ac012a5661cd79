//! Spoken descriptions of perception results

use super::DirectedDetection;
use crate::Error;
use crate::vision::Direction;

const NOTHING_SEEN: &str = "I don't see anything right now.";

/// Describe detections grouped by direction
///
/// Directions are spoken left to right; labels within a direction keep the
/// order in which they were first detected.
#[must_use]
pub fn spoken_summary(detections: &[DirectedDetection]) -> String {
    let mut groups = Vec::new();

    for direction in [Direction::Left, Direction::Center, Direction::Right] {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for d in detections.iter().filter(|d| d.direction == direction) {
            let label = d.detection.label.as_str();
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }

        if counts.is_empty() {
            continue;
        }

        let items: Vec<String> = counts
            .into_iter()
            .map(|(label, n)| quantify(label, n))
            .collect();
        groups.push(format!("{} {}", join(&items), direction.phrase()));
    }

    if groups.is_empty() {
        return NOTHING_SEEN.to_string();
    }

    format!("I see {}.", join(&groups))
}

/// Spoken notice for a failed perception query
#[must_use]
pub const fn failure_notice(error: &Error) -> &'static str {
    match error {
        Error::NotConfigured => "The camera isn't set up yet.",
        Error::StreamUnavailable { .. } => "I can't reach the camera.",
        Error::TimedOut(_) => "The camera took too long to respond.",
        _ => "Something went wrong while looking around.",
    }
}

fn quantify(label: &str, count: usize) -> String {
    if count == 1 {
        format!("{} {label}", article(label))
    } else {
        format!("{count} {}", plural(label))
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn plural(label: &str) -> String {
    match label {
        "person" => return "people".to_string(),
        "mouse" => return "mice".to_string(),
        "knife" => return "knives".to_string(),
        "skis" => return "pairs of skis".to_string(),
        _ => {}
    }

    if label.ends_with('s')
        || label.ends_with('x')
        || label.ends_with("ch")
        || label.ends_with("sh")
    {
        format!("{label}es")
    } else {
        format!("{label}s")
    }
}

fn join(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{BoundingBox, Detection};

    fn at(label: &str, direction: Direction) -> DirectedDetection {
        DirectedDetection {
            detection: Detection::new(label, 0.9, BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            direction,
        }
    }

    #[test]
    fn nothing_detected() {
        assert_eq!(spoken_summary(&[]), "I don't see anything right now.");
    }

    #[test]
    fn groups_by_direction_left_to_right() {
        let dets = [
            at("chair", Direction::Center),
            at("person", Direction::Left),
            at("chair", Direction::Center),
        ];
        assert_eq!(
            spoken_summary(&dets),
            "I see a person on your left and 2 chairs ahead of you."
        );
    }

    #[test]
    fn lists_several_labels_in_one_band() {
        let dets = [
            at("cup", Direction::Right),
            at("orange", Direction::Right),
            at("bus", Direction::Right),
            at("bus", Direction::Right),
        ];
        assert_eq!(
            spoken_summary(&dets),
            "I see a cup, an orange and 2 buses on your right."
        );
    }

    #[test]
    fn irregular_plurals() {
        assert_eq!(quantify("person", 3), "3 people");
        assert_eq!(quantify("knife", 2), "2 knives");
        assert_eq!(quantify("bench", 2), "2 benches");
    }

    #[test]
    fn failure_notices() {
        assert_eq!(
            failure_notice(&Error::NotConfigured),
            "The camera isn't set up yet."
        );
        assert_eq!(
            failure_notice(&Error::stream("http://cam", "refused")),
            "I can't reach the camera."
        );
        assert_eq!(
            failure_notice(&Error::TimedOut(std::time::Duration::from_secs(10))),
            "The camera took too long to respond."
        );
    }
}
