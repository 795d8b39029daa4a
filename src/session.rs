//! Conversation session state.
//!
//! Holds everything a chat client renders: the transcript, the active
//! mentor, challenge progress, and loaded curriculum context. Transitions
//! are pure methods on [`SessionState`]; the async drivers at the bottom
//! ([`send_message`], [`submit_work`], [`load_curriculum`]) wire those
//! transitions to a [`Relay`] and own the busy-flag discipline, so the whole
//! flow is testable against a stub relay.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::curriculum;
use crate::mentor::{Mentor, MentorRegistry};
use crate::relay::Relay;

/// Fallback assistant entry when a chat request fails.
pub const FALLBACK_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Fallback assistant entry when a review request fails.
pub const REVIEW_ERROR_MESSAGE: &str =
    "Sorry, I couldn't review your work just now. Please submit it again.";

/// Scripted introduction when the challenge starts (phase 1).
pub const PHASE_1_INTRO: &str =
    "Welcome to the e-commerce analysis challenge! Phase 1 is data cleaning: take the raw \
     sales export, handle the missing emails and ages, remove duplicate transactions, and \
     standardize the date formats. Upload your cleaned workbook when you're ready for review.";

/// Scripted introduction appended when phase 2 begins.
pub const PHASE_2_INTRO: &str =
    "Phase 1 complete - nice work! Phase 2 is analysis: build pivot tables over the cleaned \
     data, calculate average order value and revenue trends, and identify your top products \
     and customers. Upload your analysis workbook for review when it's ready.";

/// Scripted introduction appended when phase 3 begins.
pub const PHASE_3_INTRO: &str =
    "Phase 2 complete! The final phase is visualization: turn your analysis into charts and \
     an executive-ready dashboard that communicates the key insights clearly. Upload the \
     finished workbook for your final review.";

/// Scripted message appended when phase 3 is approved.
pub const CHALLENGE_COMPLETE: &str =
    "Congratulations - you've completed all three phases of the e-commerce analysis \
     challenge! You cleaned the data, analyzed it, and presented it like a pro.";

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the transcript. Append-only within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
}

/// Progress through the scripted three-phase challenge.
///
/// Phase numbers only move forward: `complete` marks the active phase done
/// and advances by exactly one, capping at phase 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeState {
    /// Active phase (1..=3), or `None` before the challenge starts.
    pub active_phase: Option<u8>,
    /// Completion flag per phase number.
    pub completed: [bool; 3],
}

impl ChallengeState {
    /// Whether all three phases are complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.iter().all(|&done| done)
    }
}

/// Loaded curriculum context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub title: String,
    pub content: String,
}

/// Serializable state of one chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub mentor: Mentor,
    pub transcript: Vec<ChatEntry>,
    pub challenge: ChallengeState,
    pub curriculum: Option<Curriculum>,
    /// A request is in flight; further submissions are disabled.
    pub busy: bool,
    /// The in-flight request is a work review.
    pub reviewing: bool,
}

impl SessionState {
    /// Start a session with the given mentor, transcript seeded with their
    /// welcome message.
    #[must_use]
    pub fn new(mentor: &Mentor) -> Self {
        Self {
            mentor: mentor.clone(),
            transcript: vec![ChatEntry {
                role: Role::Assistant,
                content: mentor.welcome_message.clone(),
            }],
            challenge: ChallengeState::default(),
            curriculum: None,
            busy: false,
            reviewing: false,
        }
    }

    /// Switch to another mentor: transcript resets to their welcome message
    /// and challenge progress is cleared. Curriculum context survives the
    /// switch (it is loaded once per session).
    pub fn switch_mentor(&mut self, registry: &MentorRegistry, id: &str) {
        let mentor = registry.resolve(Some(id));
        self.mentor = mentor.clone();
        self.transcript = vec![ChatEntry {
            role: Role::Assistant,
            content: mentor.welcome_message.clone(),
        }];
        self.challenge = ChallengeState::default();
        self.busy = false;
        self.reviewing = false;
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatEntry {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatEntry {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// The message actually sent to the relay: the raw text, or the
    /// curriculum excerpt prepended when a curriculum is loaded.
    #[must_use]
    pub fn augmented_message(&self, text: &str) -> String {
        self.curriculum.as_ref().map_or_else(
            || text.to_string(),
            |c| {
                format!(
                    "Using this curriculum as context:\n\n{}\n\n---\n\nStudent question: {text}",
                    curriculum::excerpt(&c.content, curriculum::EXCERPT_CHARS)
                )
            },
        )
    }

    /// Begin the challenge: transcript resets to the phase-1 script, the
    /// active phase becomes 1, and all completion flags clear.
    pub fn start_challenge(&mut self) {
        self.transcript = vec![ChatEntry {
            role: Role::Assistant,
            content: PHASE_1_INTRO.to_string(),
        }];
        self.challenge = ChallengeState {
            active_phase: Some(1),
            completed: [false; 3],
        };
    }

    /// Mark phase `n` complete after an approved review.
    ///
    /// Phases 1 and 2 advance to the next phase and append its scripted
    /// introduction; phase 3 appends the completion message and the
    /// challenge ends. Out-of-range phases are ignored.
    pub fn complete_phase(&mut self, n: u8) {
        if !(1..=3).contains(&n) {
            return;
        }
        self.challenge.completed[usize::from(n) - 1] = true;

        match n {
            1 => {
                self.challenge.active_phase = Some(2);
                self.push_assistant(PHASE_2_INTRO);
            }
            2 => {
                self.challenge.active_phase = Some(3);
                self.push_assistant(PHASE_3_INTRO);
            }
            _ => self.push_assistant(CHALLENGE_COMPLETE),
        }
    }

    /// Store curriculum context and replace the transcript with a scripted
    /// acknowledgment referencing its title.
    pub fn set_curriculum(&mut self, title: String, content: String) {
        let ack = format!(
            "I've loaded \"{title}\" as our curriculum. I'll keep it in mind while we work - \
             ask me anything and I'll relate my guidance back to it where I can."
        );
        self.curriculum = Some(Curriculum { title, content });
        self.transcript = vec![ChatEntry {
            role: Role::Assistant,
            content: ack,
        }];
    }
}

/// Send a user message through the relay.
///
/// Blank input is a no-op (nothing appended, relay not called). Otherwise
/// this appends the user entry, raises the busy flag, and appends either the
/// mentor's reply or the fallback error entry. The busy flag is cleared on
/// every path. Returns whether a message was actually sent.
pub async fn send_message<R: Relay>(state: &mut SessionState, relay: &R, text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    state.push_user(text);
    state.busy = true;

    let outgoing = state.augmented_message(text);
    match relay.chat(&outgoing, &state.mentor.id).await {
        Ok(reply) => state.push_assistant(reply.response),
        Err(e) => {
            tracing::warn!("Chat request failed: {e:#}");
            state.push_assistant(FALLBACK_ERROR_MESSAGE);
        }
    }

    state.busy = false;
    true
}

/// Submit a work file for review of the active challenge phase.
///
/// Appends the generated review to the transcript and, when the review is
/// approved, completes the active phase (advancing to the next one or
/// finishing the challenge). Review failures degrade to a fallback entry.
/// Busy and reviewing flags clear on every path.
pub async fn submit_work<R: Relay>(state: &mut SessionState, relay: &R, file: &Path) -> Result<()> {
    let Some(phase) = state.challenge.active_phase else {
        bail!("No challenge in progress - use /challenge to start one");
    };
    if state.challenge.is_complete() {
        bail!("Challenge already complete - nothing left to submit");
    }

    state.busy = true;
    state.reviewing = true;

    let result = relay
        .review_work(file, phase, "excel", &state.mentor.id)
        .await;

    match result {
        Ok(reply) => {
            state.push_assistant(reply.review);
            if reply.approved {
                state.complete_phase(phase);
            }
        }
        Err(e) => {
            tracing::warn!("Review request failed: {e:#}");
            state.push_assistant(REVIEW_ERROR_MESSAGE);
        }
    }

    state.busy = false;
    state.reviewing = false;
    Ok(())
}

/// Load a markdown curriculum through the relay.
///
/// Non-markdown filenames are rejected before any relay call. On success the
/// transcript is replaced with the acknowledgment and the title is returned.
pub async fn load_curriculum<R: Relay>(
    state: &mut SessionState,
    relay: &R,
    file: &Path,
) -> Result<String> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Curriculum path has no filename")?;

    if !curriculum::is_markdown(filename) {
        bail!("Curriculum must be a markdown file (.md)");
    }

    state.busy = true;
    let result = relay.upload_curriculum(file, &state.mentor.id).await;
    state.busy = false;

    let reply = result?;
    let title = reply.title.clone();
    state.set_curriculum(reply.title, reply.content);
    Ok(title)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::relay::{ChatReply, CurriculumReply, ReviewReply};

    /// Stub relay with canned outcomes and a call log.
    #[derive(Default)]
    struct StubRelay {
        chat_response: Option<String>,
        review_text: String,
        review_approved: bool,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl StubRelay {
        fn answering(text: &str) -> Self {
            Self {
                chat_response: Some(text.to_string()),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn reviewing(text: &str, approved: bool) -> Self {
            Self {
                review_text: text.to_string(),
                review_approved: approved,
                ..Self::default()
            }
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Relay for StubRelay {
        async fn chat(&self, message: &str, mentor_id: &str) -> Result<ChatReply> {
            self.log(format!("chat:{mentor_id}:{message}"));
            if self.fail {
                bail!("stub failure");
            }
            Ok(ChatReply {
                mentor: mentor_id.to_string(),
                response: self.chat_response.clone().unwrap_or_default(),
            })
        }

        async fn review_work(
            &self,
            _file: &Path,
            phase: u8,
            challenge_type: &str,
            mentor_id: &str,
        ) -> Result<ReviewReply> {
            self.log(format!("review:{mentor_id}:{challenge_type}:{phase}"));
            if self.fail {
                bail!("stub failure");
            }
            Ok(ReviewReply {
                success: true,
                review: self.review_text.clone(),
                approved: self.review_approved,
                phase,
            })
        }

        async fn upload_curriculum(
            &self,
            _file: &Path,
            mentor_id: &str,
        ) -> Result<CurriculumReply> {
            self.log(format!("curriculum:{mentor_id}"));
            if self.fail {
                bail!("stub failure");
            }
            Ok(CurriculumReply {
                success: true,
                title: "My Title".to_string(),
                content: "# My Title\n\nLesson one.".to_string(),
            })
        }
    }

    fn session() -> SessionState {
        let registry = MentorRegistry::built_in();
        SessionState::new(registry.resolve(None))
    }

    #[test]
    fn new_session_starts_with_welcome() {
        let state = session();
        assert_eq!(state.transcript.len(), 1);
        assert!(state.transcript[0].content.contains("Sarah Chen"));
        assert_eq!(state.transcript[0].role, Role::Assistant);
    }

    #[test]
    fn switching_mentor_resets_to_their_welcome() {
        let registry = MentorRegistry::built_in();
        let mut state = session();
        state.push_user("hello");
        state.start_challenge();

        state.switch_mentor(&registry, "marcus");

        assert_eq!(state.transcript.len(), 1);
        assert!(state.transcript[0].content.contains("Marcus Rodriguez"));
        assert!(state.challenge.active_phase.is_none());
    }

    #[tokio::test]
    async fn blank_messages_never_reach_the_relay() {
        let relay = StubRelay::answering("hi");
        let mut state = session();

        assert!(!send_message(&mut state, &relay, "").await);
        assert!(!send_message(&mut state, &relay, "   ").await);

        assert_eq!(state.transcript.len(), 1);
        assert_eq!(relay.call_count(), 0);
    }

    #[tokio::test]
    async fn successful_chat_appends_two_entries() {
        let relay = StubRelay::answering("Use VLOOKUP for that.");
        let mut state = session();

        assert!(send_message(&mut state, &relay, "How do I look up a value?").await);

        assert_eq!(state.transcript.len(), 3);
        assert_eq!(state.transcript[1].role, Role::User);
        assert_eq!(state.transcript[2].content, "Use VLOOKUP for that.");
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn failed_chat_appends_fallback_and_clears_busy() {
        let relay = StubRelay::failing();
        let mut state = session();

        send_message(&mut state, &relay, "anyone there?").await;

        assert_eq!(state.transcript.len(), 3);
        assert_eq!(state.transcript[2].content, FALLBACK_ERROR_MESSAGE);
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn end_to_end_marcus_scenario() {
        let registry = MentorRegistry::built_in();
        let relay = StubRelay::answering("Use an index...");
        let mut state = session();

        state.switch_mentor(&registry, "marcus");
        assert_eq!(
            state.transcript[0].content,
            registry.get("marcus").unwrap().welcome_message
        );

        send_message(&mut state, &relay, "How do I optimize a JOIN?").await;

        let calls = relay.calls.lock().unwrap();
        assert_eq!(calls[0], "chat:marcus:How do I optimize a JOIN?");
        drop(calls);
        assert_eq!(state.transcript.last().unwrap().content, "Use an index...");
    }

    #[test]
    fn start_challenge_scripts_phase_one() {
        let mut state = session();
        state.start_challenge();

        assert_eq!(state.transcript.len(), 1);
        assert_eq!(state.transcript[0].content, PHASE_1_INTRO);
        assert_eq!(state.challenge.active_phase, Some(1));
        assert_eq!(state.challenge.completed, [false; 3]);
    }

    #[test]
    fn completing_phase_one_advances_to_two() {
        let mut state = session();
        state.start_challenge();
        state.complete_phase(1);

        assert_eq!(state.challenge.active_phase, Some(2));
        assert_eq!(state.challenge.completed, [true, false, false]);
        assert_eq!(state.transcript.last().unwrap().content, PHASE_2_INTRO);
    }

    #[test]
    fn completing_phase_three_finishes_the_challenge() {
        let mut state = session();
        state.start_challenge();
        state.complete_phase(1);
        state.complete_phase(2);
        state.complete_phase(3);

        assert_eq!(state.challenge.active_phase, Some(3));
        assert_eq!(state.challenge.completed, [true; 3]);
        assert!(state.challenge.is_complete());
        assert_eq!(state.transcript.last().unwrap().content, CHALLENGE_COMPLETE);
    }

    #[test]
    fn out_of_range_phase_is_ignored() {
        let mut state = session();
        state.start_challenge();
        let before = state.transcript.len();

        state.complete_phase(4);

        assert_eq!(state.transcript.len(), before);
        assert_eq!(state.challenge.active_phase, Some(1));
    }

    #[tokio::test]
    async fn approved_review_completes_the_active_phase() {
        let relay = StubRelay::reviewing("Great cleaning work. APPROVED", true);
        let mut state = session();
        state.start_challenge();

        submit_work(&mut state, &relay, &PathBuf::from("work.xlsx"))
            .await
            .unwrap();

        assert_eq!(state.challenge.active_phase, Some(2));
        assert!(state.challenge.completed[0]);
        // Review text, then the phase-2 script.
        let n = state.transcript.len();
        assert!(state.transcript[n - 2].content.contains("APPROVED"));
        assert_eq!(state.transcript[n - 1].content, PHASE_2_INTRO);
        assert!(!state.busy);
        assert!(!state.reviewing);
    }

    #[tokio::test]
    async fn unapproved_review_keeps_the_phase() {
        let relay = StubRelay::reviewing("Fix the dates. NEEDS_REVISION", false);
        let mut state = session();
        state.start_challenge();

        submit_work(&mut state, &relay, &PathBuf::from("work.xlsx"))
            .await
            .unwrap();

        assert_eq!(state.challenge.active_phase, Some(1));
        assert!(!state.challenge.completed[0]);
    }

    #[tokio::test]
    async fn failed_review_appends_fallback_and_clears_flags() {
        let relay = StubRelay::failing();
        let mut state = session();
        state.start_challenge();

        submit_work(&mut state, &relay, &PathBuf::from("work.xlsx"))
            .await
            .unwrap();

        assert_eq!(state.transcript.last().unwrap().content, REVIEW_ERROR_MESSAGE);
        assert!(!state.busy);
        assert!(!state.reviewing);
    }

    #[tokio::test]
    async fn submit_after_completion_is_an_error() {
        let relay = StubRelay::reviewing("APPROVED", true);
        let mut state = session();
        state.start_challenge();
        state.complete_phase(1);
        state.complete_phase(2);
        state.complete_phase(3);
        let before = state.transcript.len();

        let err = submit_work(&mut state, &relay, &PathBuf::from("work.xlsx"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already complete"));
        assert_eq!(relay.call_count(), 0);
        // No second completion message appended.
        assert_eq!(state.transcript.len(), before);
    }

    #[tokio::test]
    async fn submit_without_challenge_is_an_error() {
        let relay = StubRelay::reviewing("text", true);
        let mut state = session();

        let err = submit_work(&mut state, &relay, &PathBuf::from("work.xlsx"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No challenge"));
        assert_eq!(relay.call_count(), 0);
    }

    #[tokio::test]
    async fn non_markdown_curriculum_rejected_without_relay_call() {
        let relay = StubRelay::default();
        let mut state = session();

        let err = load_curriculum(&mut state, &relay, &PathBuf::from("data.xlsx"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("markdown"));
        assert_eq!(relay.call_count(), 0);
        assert!(state.curriculum.is_none());
    }

    #[tokio::test]
    async fn curriculum_load_replaces_transcript_with_ack() {
        let relay = StubRelay::default();
        let mut state = session();
        state.push_user("earlier chatter");

        let title = load_curriculum(&mut state, &relay, &PathBuf::from("lesson.md"))
            .await
            .unwrap();

        assert_eq!(title, "My Title");
        assert_eq!(state.transcript.len(), 1);
        assert!(state.transcript[0].content.contains("My Title"));
        assert!(state.curriculum.is_some());
    }

    #[tokio::test]
    async fn curriculum_context_prepended_to_outgoing_messages() {
        let relay = StubRelay::default();
        let mut state = session();
        load_curriculum(&mut state, &relay, &PathBuf::from("lesson.md"))
            .await
            .unwrap();

        let outgoing = state.augmented_message("What's a pivot table?");
        assert!(outgoing.starts_with("Using this curriculum as context:"));
        assert!(outgoing.contains("Lesson one."));
        assert!(outgoing.ends_with("What's a pivot table?"));
    }

    #[test]
    fn without_curriculum_messages_pass_through() {
        let state = session();
        assert_eq!(state.augmented_message("plain"), "plain");
    }
}
