//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::Score;
use crate::quiz::{QuizEvent, Session, Stage};
use crate::reward::{RewardPolicy, RewardTier};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// Current view without changing anything.
    State,
    Start,
    SelectPrimary {
        option: String,
    },
    SelectSecondary {
        option: String,
    },
    Advance,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Quiz {
        view: QuizView,
    },
    Error {
        message: String,
    },
}

/// Position within the quiz, shown on every in-progress view.
#[derive(Debug, Serialize, PartialEq)]
pub struct Progress {
    /// 1-based question number.
    pub number: usize,
    pub total: usize,
    pub score: Score,
    pub fraction: f32,
}

/// Read-only snapshot of a session for rendering. Correct answers are only revealed
/// through explanations after grading.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum QuizView {
    Idle,
    Primary {
        progress: Progress,
        question: String,
        options: Vec<String>,
    },
    Secondary {
        progress: Progress,
        message: String,
        explanation: String,
        question: String,
        options: Vec<String>,
    },
    Advance {
        progress: Progress,
        primary_correct: bool,
        secondary_correct: Option<bool>,
        message: String,
        explanation: String,
        is_last: bool,
    },
    Finished {
        score: Score,
        total: usize,
        /// "Final Score: 8.5 / 10"
        summary: String,
        reward: RewardTier,
        message: String,
    },
}

/// Project a session into its view.
pub fn to_view(session: &Session, policy: &RewardPolicy) -> QuizView {
    let Session::Active { questions, state } = session else {
        return QuizView::Idle;
    };
    let q = &questions[state.index];
    let progress = Progress {
        number: state.index + 1,
        total: questions.len(),
        score: state.score,
        fraction: (state.index + 1) as f32 / questions.len() as f32,
    };

    match state.stage {
        Stage::Primary => QuizView::Primary {
            progress,
            question: q.question.clone(),
            options: q.options.clone(),
        },
        Stage::Secondary => QuizView::Secondary {
            progress,
            message: "That was incorrect. Here's a chance to recover half a point:".into(),
            explanation: state.pending_explanation.clone(),
            question: q.secondary_question.clone(),
            options: q.secondary_options.clone(),
        },
        Stage::Advance => {
            let primary_correct = state.last_primary_correct == Some(true);
            let (message, explanation) = if primary_correct {
                ("Correct! Great job!", &state.pending_explanation)
            } else if state.last_secondary_correct == Some(true) {
                ("Good recovery! You earned 0.5 points.", &state.pending_secondary_explanation)
            } else {
                ("That was also incorrect.", &state.pending_secondary_explanation)
            };
            QuizView::Advance {
                progress,
                primary_correct,
                secondary_correct: state.last_secondary_correct,
                message: message.into(),
                explanation: explanation.clone(),
                is_last: state.index + 1 == questions.len(),
            }
        }
        Stage::Finished => {
            let reward = policy.resolve(state.score, questions.len());
            let message = match reward.units() {
                0 => "Sorry, you didn't score high enough to earn time. You can try again.".to_string(),
                n => format!(
                    "Congratulations! You've earned {} minutes of screen time. Please show this screen to your parent to claim your time!",
                    n
                ),
            };
            let summary = format!("Final Score: {} / {}", state.score, questions.len());
            QuizView::Finished { score: state.score, total: questions.len(), summary, reward, message }
        }
    }
}

/// Map a WebSocket message to a quiz event, if it is one.
pub fn to_event(msg: &ClientWsMessage) -> Option<QuizEvent> {
    match msg {
        ClientWsMessage::SelectPrimary { option } => Some(QuizEvent::SelectPrimary(option.clone())),
        ClientWsMessage::SelectSecondary { option } => Some(QuizEvent::SelectSecondary(option.clone())),
        ClientWsMessage::Advance => Some(QuizEvent::Advance),
        _ => None,
    }
}

//
// HTTP request/response DTOs
//

/// Today's challenge as configured by the parent.
#[derive(Debug, Serialize)]
pub struct ChallengeOut {
    pub video_id: String,
    pub video_url: String,
    pub title: String,
    pub key_concept: String,
    pub child_name: String,
}

#[derive(Debug, Deserialize)]
pub struct OptionIn {
    pub option: String,
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub view: QuizView,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub generation_enabled: bool,
}
