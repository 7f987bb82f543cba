//! Narrative Composer.
//!
//! Builds one deterministic paragraph per snapshot. Every lookup miss falls
//! through to a generic clause, so composition never fails and never returns
//! an empty string.

use crate::inference::ProbableActivity;
use crate::{HandActivity, HeadOrientation, PersonSignal, Posture, Snapshot};

pub const NO_PERSON_CLAUSE: &str = "No person detected in the scene.";
pub const EMPTY_SCENE_CLAUSE: &str = "Scene without detectable activity.";
pub const UNIDENTIFIED_CLAUSE: &str = "performing unidentified activity.";

/// Compose the narrative for one snapshot.
pub fn compose_narrative(snapshot: &Snapshot) -> String {
    let mut clauses = Vec::new();

    if snapshot.persons.is_empty() {
        clauses.push(NO_PERSON_CLAUSE.to_string());
    } else {
        clauses.push(format!(
            "Detected {} person(s) in the scene.",
            snapshot.persons.len()
        ));
        for (index, signal) in snapshot
            .person_signals
            .iter()
            .take(snapshot.persons.len())
            .enumerate()
        {
            clauses.push(format!("Person {}: {}", index + 1, describe_person(signal)));
        }
    }

    if let Some(objects) = object_clause(snapshot) {
        clauses.push(objects);
    }

    if !snapshot.interactions.is_empty() {
        clauses.push(format!(
            "Detected {} interaction(s) between people and objects.",
            snapshot.interactions.len()
        ));
    }

    if snapshot.is_empty() {
        clauses.push(EMPTY_SCENE_CLAUSE.to_string());
    }

    clauses.join(" ")
}

/// One person's clause: a table action with qualifiers, or the generic fallback.
pub fn describe_person(signal: &PersonSignal) -> String {
    let action = action_phrase(signal.probable_activity, signal.hand_activity)
        .or_else(|| action_phrase(signal.probable_activity, HandActivity::HandsIdle));

    match action {
        Some(action) => {
            let qualifiers: Vec<&str> = [
                posture_qualifier(signal.posture),
                head_qualifier(signal.head_orientation),
            ]
            .into_iter()
            .flatten()
            .collect();
            if qualifiers.is_empty() {
                format!("{}.", action)
            } else {
                format!("{}, {}.", action, qualifiers.join(", "))
            }
        }
        None => generic_clause(signal.posture, signal.hand_activity),
    }
}

fn action_phrase(activity: ProbableActivity, hand: HandActivity) -> Option<&'static str> {
    use HandActivity as H;
    use ProbableActivity as A;

    let phrase = match (activity, hand) {
        (A::WorkingAtComputer, H::Typing) => "is typing at the computer",
        (A::WorkingAtComputer, H::HandsInLap) => "is reading on the computer screen",
        (A::WorkingAtComputer, H::Gesturing) => "is interacting with the computer",
        (A::WorkingAtComputer, H::Pointing) => "is pointing at something on the screen",
        (A::WorkingAtComputer, H::HoldingObject) => "is using the mouse or another device",

        (A::ConversingOrPresenting, H::Gesturing) => "is gesturing during a conversation",
        (A::ConversingOrPresenting, H::Pointing) => "is pointing during a presentation",
        (A::ConversingOrPresenting, H::HandsIdle) => "is talking or listening",
        (A::ConversingOrPresenting, H::HoldingObject) => "is holding something while talking",

        (A::ReadingOrWriting, H::Typing) => "is writing or typing",
        (A::ReadingOrWriting, H::HandsInLap) => "is reading a document",
        (A::ReadingOrWriting, H::HoldingObject) => "is writing by hand",
        (A::ReadingOrWriting, H::HandsIdle) => "is concentrating on reading",

        (A::ObservingOrWaiting, H::HandsInLap) => "is watching attentively",
        (A::ObservingOrWaiting, H::HandsIdle) => "is waiting or resting",
        (A::ObservingOrWaiting, H::Gesturing) => "is moving around restlessly",
        (A::ObservingOrWaiting, H::Pointing) => "is indicating something",

        _ => return None,
    };
    Some(phrase)
}

fn posture_qualifier(posture: Posture) -> Option<&'static str> {
    match posture {
        Posture::StandingErect | Posture::StandingRelaxed => Some("while standing"),
        Posture::Seated => Some("while seated"),
        _ => None,
    }
}

fn head_qualifier(head: HeadOrientation) -> Option<&'static str> {
    match head {
        HeadOrientation::LookingRight => Some("looking right"),
        HeadOrientation::LookingLeft => Some("looking left"),
        HeadOrientation::LookingUp => Some("with head raised"),
        HeadOrientation::LookingDown => Some("with head lowered"),
        HeadOrientation::LookingForward | HeadOrientation::Neutral => None,
    }
}

fn generic_clause(posture: Posture, hand: HandActivity) -> String {
    let posture_part = match posture {
        Posture::StandingErect | Posture::StandingRelaxed => Some("is standing"),
        Posture::Seated => Some("is seated"),
        Posture::CrouchedOrLying => Some("is crouched or lying"),
        Posture::Unknown => None,
    };
    let hand_part = match hand {
        HandActivity::Typing => Some("with hands typing"),
        HandActivity::Gesturing => Some("gesturing"),
        HandActivity::Pointing => Some("pointing"),
        HandActivity::HandsInLap => Some("with hands in lap"),
        HandActivity::HandsIdle => Some("with hands idle"),
        HandActivity::HoldingObject => Some("holding an object"),
        HandActivity::Unknown => None,
    };

    let parts: Vec<&str> = [posture_part, hand_part].into_iter().flatten().collect();
    if parts.is_empty() {
        UNIDENTIFIED_CLAUSE.to_string()
    } else {
        format!("{}.", parts.join(", "))
    }
}

/// "Objects identified: 1 laptop, 2 cups." in first-seen order.
fn object_clause(snapshot: &Snapshot) -> Option<String> {
    if snapshot.objects.is_empty() {
        return None;
    }
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for object in &snapshot.objects {
        match counts.iter_mut().find(|(kind, _)| *kind == object.kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((object.kind.as_str(), 1)),
        }
    }
    let parts: Vec<String> = counts
        .iter()
        .map(|(kind, count)| {
            if *count == 1 {
                format!("1 {}", kind)
            } else {
                format!("{} {}s", count, kind)
            }
        })
        .collect();
    Some(format!("Objects identified: {}.", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundingBox, Detection, Interaction};
    use chrono::Local;

    fn signal(
        posture: Posture,
        hand: HandActivity,
        head: HeadOrientation,
        activity: ProbableActivity,
    ) -> PersonSignal {
        PersonSignal {
            person_id: "person_0".to_string(),
            posture,
            head_orientation: head,
            hand_activity: hand,
            probable_activity: activity,
            confidence: 0.9,
        }
    }

    fn detection(id: &str, kind: &str) -> Detection {
        Detection {
            id: id.to_string(),
            kind: kind.to_string(),
            confidence: 0.9,
            bounding_box: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            captured_at: Local::now(),
        }
    }

    #[test]
    fn empty_snapshot_uses_fixed_clauses() {
        let narrative = compose_narrative(&Snapshot::empty(Local::now()));
        assert_eq!(
            narrative,
            "No person detected in the scene. Scene without detectable activity."
        );
    }

    #[test]
    fn objects_only_scene() {
        let mut snapshot = Snapshot::empty(Local::now());
        snapshot.objects = vec![
            detection("laptop_0", "laptop"),
            detection("cup_1", "cup"),
            detection("cup_2", "cup"),
        ];
        assert_eq!(
            compose_narrative(&snapshot),
            "No person detected in the scene. Objects identified: 1 laptop, 2 cups."
        );
    }

    #[test]
    fn table_action_with_qualifiers() {
        let s = signal(
            Posture::Seated,
            HandActivity::Typing,
            HeadOrientation::LookingRight,
            ProbableActivity::WorkingAtComputer,
        );
        assert_eq!(
            describe_person(&s),
            "is typing at the computer, while seated, looking right."
        );
    }

    #[test]
    fn hand_miss_falls_back_to_idle_entry() {
        let s = signal(
            Posture::StandingRelaxed,
            HandActivity::Typing,
            HeadOrientation::LookingForward,
            ProbableActivity::ObservingOrWaiting,
        );
        assert_eq!(describe_person(&s), "is waiting or resting, while standing.");
    }

    #[test]
    fn generic_clause_when_pair_unknown() {
        let s = signal(
            Posture::Seated,
            HandActivity::HandsIdle,
            HeadOrientation::LookingUp,
            ProbableActivity::ListeningOrThinking,
        );
        assert_eq!(describe_person(&s), "is seated, with hands idle.");

        let unknown = signal(
            Posture::Unknown,
            HandActivity::Unknown,
            HeadOrientation::Neutral,
            ProbableActivity::GeneralActivity,
        );
        assert_eq!(describe_person(&unknown), UNIDENTIFIED_CLAUSE);
    }

    #[test]
    fn full_scene_joins_clauses() {
        let mut snapshot = Snapshot::empty(Local::now());
        snapshot.persons = vec![detection("person_0", "person")];
        snapshot.objects = vec![detection("laptop_1", "laptop")];
        snapshot.person_signals = vec![signal(
            Posture::Seated,
            HandActivity::Typing,
            HeadOrientation::LookingForward,
            ProbableActivity::WorkingAtComputer,
        )];
        snapshot.interactions = vec![Interaction {
            person_id: "person_0".to_string(),
            object_id: "laptop_1".to_string(),
            object_kind: "laptop".to_string(),
            distance: 0.0,
        }];
        assert_eq!(
            compose_narrative(&snapshot),
            "Detected 1 person(s) in the scene. \
             Person 1: is typing at the computer, while seated. \
             Objects identified: 1 laptop. \
             Detected 1 interaction(s) between people and objects."
        );
    }
}
