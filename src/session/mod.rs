//! Practice session state machine
//!
//! One turn runs `ListeningForTap → Recording → Thinking → Speaking →
//! ListeningForTap`; mood is set independently whenever the tutor answers.

mod driver;
mod lesson;
mod machine;
mod state;

pub use driver::{SessionEvent, run};
pub use lesson::LessonPlan;
pub use machine::{Session, SessionConfig};
pub use state::{CorrectionView, FeedbackView, Mood, Phase, PhonemeView};
