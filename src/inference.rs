//! Activity Inference Engine.
//!
//! A total decision table over `(Posture, HandActivity, HeadOrientation)`. Arms
//! are evaluated top to bottom; the final arm is the general fallback, so every
//! triple resolves to exactly one activity.

use serde::{Deserialize, Serialize};

use crate::{HandActivity, HeadOrientation, Posture};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbableActivity {
    WorkingAtComputer,
    UsingMobileDevice,
    ConversingOrPresenting,
    ExplainingSomething,
    PointingOrTeaching,
    WatchingScreen,
    ReadingOrWriting,
    ListeningOrThinking,
    ObservingOrWaiting,
    WalkingOrMoving,
    StandingActive,
    ManipulatingObjectOnFloor,
    RestingOrRelaxing,
    ActivelyInteracting,
    FocusedOnTask,
    GeneralActivity,
}

impl ProbableActivity {
    pub const ALL: [ProbableActivity; 16] = [
        ProbableActivity::WorkingAtComputer,
        ProbableActivity::UsingMobileDevice,
        ProbableActivity::ConversingOrPresenting,
        ProbableActivity::ExplainingSomething,
        ProbableActivity::PointingOrTeaching,
        ProbableActivity::WatchingScreen,
        ProbableActivity::ReadingOrWriting,
        ProbableActivity::ListeningOrThinking,
        ProbableActivity::ObservingOrWaiting,
        ProbableActivity::WalkingOrMoving,
        ProbableActivity::StandingActive,
        ProbableActivity::ManipulatingObjectOnFloor,
        ProbableActivity::RestingOrRelaxing,
        ProbableActivity::ActivelyInteracting,
        ProbableActivity::FocusedOnTask,
        ProbableActivity::GeneralActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbableActivity::WorkingAtComputer => "working-at-computer",
            ProbableActivity::UsingMobileDevice => "using-mobile-device",
            ProbableActivity::ConversingOrPresenting => "conversing-or-presenting",
            ProbableActivity::ExplainingSomething => "explaining-something",
            ProbableActivity::PointingOrTeaching => "pointing-or-teaching",
            ProbableActivity::WatchingScreen => "watching-screen",
            ProbableActivity::ReadingOrWriting => "reading-or-writing",
            ProbableActivity::ListeningOrThinking => "listening-or-thinking",
            ProbableActivity::ObservingOrWaiting => "observing-or-waiting",
            ProbableActivity::WalkingOrMoving => "walking-or-moving",
            ProbableActivity::StandingActive => "standing-active",
            ProbableActivity::ManipulatingObjectOnFloor => "manipulating-object-on-floor",
            ProbableActivity::RestingOrRelaxing => "resting-or-relaxing",
            ProbableActivity::ActivelyInteracting => "actively-interacting",
            ProbableActivity::FocusedOnTask => "focused-on-task",
            ProbableActivity::GeneralActivity => "general-activity",
        }
    }

    /// Human-readable phrase used in narratives.
    pub fn description(&self) -> &'static str {
        match self {
            ProbableActivity::WorkingAtComputer => "working at the computer",
            ProbableActivity::UsingMobileDevice => "using a mobile device",
            ProbableActivity::ConversingOrPresenting => "conversing or presenting",
            ProbableActivity::ExplainingSomething => "explaining something",
            ProbableActivity::PointingOrTeaching => "pointing or teaching",
            ProbableActivity::WatchingScreen => "watching a screen",
            ProbableActivity::ReadingOrWriting => "reading or writing",
            ProbableActivity::ListeningOrThinking => "listening or thinking",
            ProbableActivity::ObservingOrWaiting => "observing or waiting",
            ProbableActivity::WalkingOrMoving => "walking or moving around",
            ProbableActivity::StandingActive => "standing and active",
            ProbableActivity::ManipulatingObjectOnFloor => "handling an object on the floor",
            ProbableActivity::RestingOrRelaxing => "resting or relaxing",
            ProbableActivity::ActivelyInteracting => "actively interacting",
            ProbableActivity::FocusedOnTask => "focused on a task",
            ProbableActivity::GeneralActivity => "in general activity",
        }
    }

    /// Person-level activity signal summed into a snapshot's total activity.
    pub fn intensity(&self) -> f64 {
        match self {
            ProbableActivity::ActivelyInteracting
            | ProbableActivity::ConversingOrPresenting
            | ProbableActivity::PointingOrTeaching
            | ProbableActivity::WalkingOrMoving
            | ProbableActivity::ManipulatingObjectOnFloor => 1.0,
            ProbableActivity::WorkingAtComputer
            | ProbableActivity::UsingMobileDevice
            | ProbableActivity::ExplainingSomething
            | ProbableActivity::StandingActive => 0.75,
            ProbableActivity::WatchingScreen
            | ProbableActivity::ReadingOrWriting
            | ProbableActivity::ObservingOrWaiting
            | ProbableActivity::FocusedOnTask
            | ProbableActivity::GeneralActivity => 0.5,
            ProbableActivity::ListeningOrThinking | ProbableActivity::RestingOrRelaxing => 0.25,
        }
    }
}

/// Map one person's signals to a probable activity.
pub fn infer_activity(
    posture: Posture,
    hand: HandActivity,
    head: HeadOrientation,
) -> ProbableActivity {
    use HandActivity as H;
    use HeadOrientation as O;
    use Posture as P;
    use ProbableActivity as A;

    match (posture, hand, head) {
        (P::Seated, H::Typing, _) => A::WorkingAtComputer,
        (_, H::Typing, _) => A::UsingMobileDevice,
        (_, H::Gesturing, O::LookingForward | O::LookingLeft | O::LookingRight) => {
            A::ConversingOrPresenting
        }
        (_, H::Gesturing, _) => A::ExplainingSomething,
        (_, H::Pointing, _) => A::PointingOrTeaching,

        (P::Seated, H::HandsInLap | H::HandsIdle, O::LookingForward) => A::WatchingScreen,
        (P::Seated, H::HandsInLap | H::HandsIdle, O::LookingDown) => A::ReadingOrWriting,
        (P::Seated, H::HandsInLap | H::HandsIdle, _) => A::ListeningOrThinking,

        (P::StandingErect | P::StandingRelaxed, H::HandsIdle, O::LookingForward) => {
            A::ObservingOrWaiting
        }
        (P::StandingErect | P::StandingRelaxed, H::HandsIdle, _) => A::WalkingOrMoving,
        (P::StandingErect | P::StandingRelaxed, _, _) => A::StandingActive,

        (P::CrouchedOrLying, H::HoldingObject, _) => A::ManipulatingObjectOnFloor,
        (P::CrouchedOrLying, _, _) => A::RestingOrRelaxing,

        (
            _,
            H::HandsInLap | H::HoldingObject,
            O::LookingLeft | O::LookingRight | O::LookingForward,
        ) => A::ActivelyInteracting,
        (_, _, O::LookingDown) => A::FocusedOnTask,
        _ => A::GeneralActivity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total_and_deterministic() {
        let mut seen = std::collections::HashSet::new();
        for posture in Posture::ALL {
            for hand in HandActivity::ALL {
                for head in HeadOrientation::ALL {
                    let first = infer_activity(posture, hand, head);
                    assert_eq!(first, infer_activity(posture, hand, head));
                    assert!(ProbableActivity::ALL.contains(&first));
                    seen.insert(first);
                }
            }
        }
        assert_eq!(seen.len(), ProbableActivity::ALL.len());
    }

    #[test]
    fn primary_rules() {
        use HandActivity as H;
        use HeadOrientation as O;
        use Posture as P;
        use ProbableActivity as A;

        assert_eq!(infer_activity(P::Seated, H::Typing, O::LookingUp), A::WorkingAtComputer);
        assert_eq!(
            infer_activity(P::StandingErect, H::Typing, O::LookingUp),
            A::UsingMobileDevice
        );
        assert_eq!(
            infer_activity(P::StandingErect, H::Gesturing, O::LookingRight),
            A::ConversingOrPresenting
        );
        assert_eq!(
            infer_activity(P::StandingErect, H::Gesturing, O::LookingDown),
            A::ExplainingSomething
        );
        assert_eq!(
            infer_activity(P::StandingRelaxed, H::Pointing, O::LookingUp),
            A::PointingOrTeaching
        );
        assert_eq!(
            infer_activity(P::Seated, H::HandsInLap, O::LookingForward),
            A::WatchingScreen
        );
        assert_eq!(
            infer_activity(P::Seated, H::HandsIdle, O::LookingDown),
            A::ReadingOrWriting
        );
        assert_eq!(
            infer_activity(P::StandingRelaxed, H::HandsIdle, O::LookingForward),
            A::ObservingOrWaiting
        );
        assert_eq!(
            infer_activity(P::CrouchedOrLying, H::HoldingObject, O::LookingDown),
            A::ManipulatingObjectOnFloor
        );
    }

    #[test]
    fn fallback_rules() {
        use HandActivity as H;
        use HeadOrientation as O;
        use Posture as P;
        use ProbableActivity as A;

        assert_eq!(
            infer_activity(P::Unknown, H::HoldingObject, O::LookingLeft),
            A::ActivelyInteracting
        );
        assert_eq!(
            infer_activity(P::Unknown, H::Unknown, O::LookingDown),
            A::FocusedOnTask
        );
        assert_eq!(
            infer_activity(P::Unknown, H::Unknown, O::LookingForward),
            A::GeneralActivity
        );
        assert_eq!(
            infer_activity(P::Unknown, H::HandsIdle, O::Neutral),
            A::GeneralActivity
        );
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for activity in ProbableActivity::ALL {
            let json = serde_json::to_string(&activity).unwrap();
            assert_eq!(json, format!("\"{}\"", activity.as_str()));
        }
    }
}
