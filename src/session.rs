use crate::evaluator::{CharOutcome, KeystrokeState};
use crate::metrics::{self, ScorePolicy, SessionSummary, WpmSample};
use crate::prompt::Prompt;
use std::time::{Duration, SystemTime};

/// Delay between solving a prompt and loading the next one, so the all-green
/// feedback is on screen for at least one tick.
pub const SOLVE_ADVANCE_MS: u64 = 100;

/// How long a skipped prompt's answer stays revealed before advancing.
pub const SKIP_REVEAL_MS: u64 = 1200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Active,
    Ended,
}

/// Drives one run from the start command to the summary: owns the prompt
/// list, the per-prompt keystroke state, the cumulative counters, and the
/// clock. All mutation happens on input and tick callbacks.
#[derive(Debug)]
pub struct Session {
    phase: SessionPhase,
    policy: ScorePolicy,
    prompts: Vec<Prompt>,
    index: usize,
    keystrokes: Option<KeystrokeState>,
    field: String,
    correct_chars: u64,
    total_chars: u64,
    started_at: Option<SystemTime>,
    advance_at: Option<SystemTime>,
    revealing: bool,
    elapsed_secs: u64,
    live_wpm: f64,
    live_accuracy: f64,
    wpm_samples: Vec<WpmSample>,
    summary: Option<SessionSummary>,
    notice: Option<String>,
}

impl Session {
    pub fn new(policy: ScorePolicy) -> Self {
        Self {
            phase: SessionPhase::Idle,
            policy,
            prompts: Vec::new(),
            index: 0,
            keystrokes: None,
            field: String::new(),
            correct_chars: 0,
            total_chars: 0,
            started_at: None,
            advance_at: None,
            revealing: false,
            elapsed_secs: 0,
            live_wpm: 0.0,
            live_accuracy: 0.0,
            wpm_samples: Vec::new(),
            summary: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// The start command. Only meaningful from Idle; the start control is
    /// inert while a run is loading or active.
    pub fn begin_loading(&mut self) {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::Loading;
            self.notice = None;
        }
    }

    /// Prompt fetch came back. A non-empty set starts the clock and serves
    /// the first prompt; an empty set is a dead end and returns to Idle.
    pub fn prompts_ready(&mut self, prompts: Vec<Prompt>) {
        if self.phase != SessionPhase::Loading {
            return;
        }

        if prompts.is_empty() {
            self.phase = SessionPhase::Idle;
            self.notice = Some("no questions available, try again".into());
            return;
        }

        self.prompts = prompts;
        self.index = 0;
        self.correct_chars = 0;
        self.total_chars = 0;
        self.wpm_samples.clear();
        self.summary = None;
        self.started_at = Some(SystemTime::now());
        self.phase = SessionPhase::Active;
        self.load_current();
    }

    /// Prompt fetch failed. Fully recoverable by starting again.
    pub fn load_failed(&mut self, message: &str) {
        if self.phase == SessionPhase::Loading {
            self.phase = SessionPhase::Idle;
            self.notice = Some(message.to_string());
        }
    }

    pub fn type_char(&mut self, c: char) {
        if self.accepts_input() {
            self.field.push(c);
            self.observe_field();
        }
    }

    pub fn backspace(&mut self) {
        if self.accepts_input() && self.field.pop().is_some() {
            self.observe_field();
        }
    }

    /// Give up on the current prompt: reveal the answer for a moment, then
    /// move on without touching the counters beyond what was already typed.
    pub fn skip(&mut self) {
        if self.phase == SessionPhase::Active && self.advance_at.is_none() {
            self.revealing = true;
            self.schedule_advance(SKIP_REVEAL_MS);
        }
    }

    /// Walk away mid-run. No record is produced.
    pub fn abandon(&mut self) {
        if matches!(self.phase, SessionPhase::Loading | SessionPhase::Active) {
            self.phase = SessionPhase::Idle;
            self.keystrokes = None;
            self.field.clear();
            self.advance_at = None;
            self.revealing = false;
            self.summary = None;
        }
    }

    /// Runtime tick: performs due prompt advances and refreshes the live
    /// display figures. Never touches the stored counters.
    pub fn on_tick(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }

        if let Some(due) = self.advance_at {
            if SystemTime::now() >= due {
                self.advance();
            }
        }

        if self.phase == SessionPhase::Active {
            self.update_live();
        }
    }

    fn accepts_input(&self) -> bool {
        // Input is ignored once a prompt is solved or skipped and the
        // session is waiting out the display delay.
        self.phase == SessionPhase::Active && self.advance_at.is_none()
    }

    fn observe_field(&mut self) {
        let Some(keystrokes) = self.keystrokes.as_mut() else {
            return;
        };

        let eval = keystrokes.observe(&self.field);
        if eval.charged {
            self.total_chars += 1;
        }
        if eval.credited {
            self.correct_chars += 1;
        }
        debug_assert!(self.correct_chars <= self.total_chars);

        if eval.solved && self.advance_at.is_none() {
            self.schedule_advance(SOLVE_ADVANCE_MS);
        }
    }

    fn schedule_advance(&mut self, delay_ms: u64) {
        self.advance_at = Some(SystemTime::now() + Duration::from_millis(delay_ms));
    }

    fn load_current(&mut self) {
        let keystrokes = KeystrokeState::new(&self.prompts[self.index].answer);
        self.field.clear();
        self.revealing = false;
        self.advance_at = None;
        // Answerless prompts solve themselves; move on after the usual delay.
        if keystrokes.is_solved() {
            self.schedule_advance(SOLVE_ADVANCE_MS);
        }
        self.keystrokes = Some(keystrokes);
    }

    fn advance(&mut self) {
        self.index += 1;
        self.advance_at = None;
        self.revealing = false;
        if self.index >= self.prompts.len() {
            self.end();
        } else {
            self.load_current();
        }
    }

    fn end(&mut self) {
        self.phase = SessionPhase::Ended;
        self.keystrokes = None;
        self.field.clear();
        self.summary = Some(SessionSummary::compute(
            self.correct_chars,
            self.total_chars,
            self.elapsed_ms(),
            self.policy,
        ));
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at
            .and_then(|t| t.elapsed().ok())
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn update_live(&mut self) {
        let elapsed_secs = self.elapsed_ms() / 1000;
        self.elapsed_secs = elapsed_secs;
        self.live_accuracy = metrics::accuracy(self.correct_chars, self.total_chars);
        self.live_wpm = metrics::words_per_minute(self.correct_chars, elapsed_secs.max(1));

        // One chart point per whole elapsed second.
        if elapsed_secs >= 1 {
            let t = elapsed_secs as f64;
            let fresh = self.wpm_samples.last().map_or(true, |last| last.t < t);
            if fresh {
                self.wpm_samples.push(WpmSample {
                    t,
                    wpm: self.live_wpm,
                });
            }
        }
    }

    pub fn current_prompt(&self) -> Option<&Prompt> {
        if self.phase == SessionPhase::Active {
            self.prompts.get(self.index)
        } else {
            None
        }
    }

    /// 1-based prompt position and the total, for the progress display.
    pub fn progress(&self) -> (usize, usize) {
        ((self.index + 1).min(self.prompts.len()), self.prompts.len())
    }

    pub fn classify(&self) -> Vec<CharOutcome> {
        self.keystrokes
            .as_ref()
            .map(|k| k.classify())
            .unwrap_or_default()
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_revealing(&self) -> bool {
        self.revealing
    }

    pub fn revealed_answer(&self) -> Option<String> {
        if self.revealing {
            self.keystrokes.as_ref().map(|k| k.expected_answer())
        } else {
            None
        }
    }

    pub fn correct_chars(&self) -> u64 {
        self.correct_chars
    }

    pub fn total_chars(&self) -> u64 {
        self.total_chars
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn live_wpm(&self) -> f64 {
        self.live_wpm
    }

    pub fn live_accuracy(&self) -> f64 {
        self.live_accuracy
    }

    pub fn wpm_samples(&self) -> &[WpmSample] {
        &self.wpm_samples
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }
}
