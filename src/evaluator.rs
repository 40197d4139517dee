/// Classification of one expected-answer position against the current input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharOutcome {
    /// Position not reached by the input yet.
    Pending,
    Correct,
    Incorrect,
}

/// What a single input event changed, from the session's point of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// The field grew, so one keystroke is charged to the total count.
    pub charged: bool,
    /// The newest position was observed correct for the first time.
    pub credited: bool,
    /// The field matches the expected answer in full.
    pub solved: bool,
}

/// Per-prompt typing state. The UI always hands over the complete field
/// content after every mutation; the evaluator compares that against the
/// expected answer and keeps the bookkeeping needed to charge and credit
/// keystrokes exactly once.
///
/// Characters are compared as `char` units on both sides, so multi-byte
/// answers segment the same way as the question packs that produced them.
#[derive(Clone, Debug)]
pub struct KeystrokeState {
    expected: Vec<char>,
    input: Vec<char>,
    /// Field length at the previous event. Growth past this charges a
    /// keystroke; deletions pull it back so re-typed characters charge again.
    prev_len: usize,
    /// Highest input length whose last position has been credited. Never
    /// exceeds the field length; moved back (not decremented as a count)
    /// when the position at that length is currently wrong.
    last_correct_len: usize,
    solved: bool,
}

impl KeystrokeState {
    pub fn new(expected_answer: &str) -> Self {
        let expected: Vec<char> = expected_answer.chars().collect();
        // A prompt without an answer has nothing to type; treat it as solved
        // so the session can move on instead of stalling.
        let solved = expected.is_empty();
        Self {
            expected,
            input: Vec::new(),
            prev_len: 0,
            last_correct_len: 0,
            solved,
        }
    }

    pub fn answer_len(&self) -> usize {
        self.expected.len()
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn expected_answer(&self) -> String {
        self.expected.iter().collect()
    }

    /// Evaluate the complete field content after one input event.
    ///
    /// Charging happens only when the field grew; crediting only when the
    /// newest position is correct and has not been credited before. A wrong
    /// character at the newest position retracts the credit pointer so the
    /// position can be credited again once fixed, without the counter ever
    /// going down.
    pub fn observe(&mut self, field: &str) -> Evaluation {
        let mut eval = Evaluation::default();

        if self.solved {
            eval.solved = true;
            return eval;
        }

        let mut next: Vec<char> = field.chars().collect();
        // Anything beyond the answer length is cut, not scored.
        next.truncate(self.expected.len());
        let len = next.len();

        if len > self.prev_len {
            eval.charged = true;
        }
        self.prev_len = len;
        self.input = next;

        if len > 0 {
            let pos = len - 1;
            if self.input[pos] == self.expected[pos] {
                if len > self.last_correct_len {
                    eval.credited = true;
                    self.last_correct_len = len;
                }
            } else {
                self.last_correct_len = len - 1;
            }
        }

        if self.input == self.expected {
            self.solved = true;
            eval.solved = true;
        }

        eval
    }

    /// Per-position outcome over the whole expected answer, for rendering.
    pub fn classify(&self) -> Vec<CharOutcome> {
        self.expected
            .iter()
            .enumerate()
            .map(|(i, expected)| {
                if i >= self.input.len() {
                    CharOutcome::Pending
                } else if self.input[i] == *expected {
                    CharOutcome::Correct
                } else {
                    CharOutcome::Incorrect
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a sequence of field snapshots, accumulating counters the way the
    /// session does, and assert the core invariant after every event.
    fn drive(state: &mut KeystrokeState, fields: &[&str]) -> (u64, u64) {
        let mut total = 0;
        let mut correct = 0;
        for field in fields {
            let eval = state.observe(field);
            if eval.charged {
                total += 1;
            }
            if eval.credited {
                correct += 1;
            }
            assert!(correct <= total, "correct must never exceed total");
        }
        (correct, total)
    }

    #[test]
    fn exact_typing_credits_every_position() {
        let mut state = KeystrokeState::new("cat");
        let (correct, total) = drive(&mut state, &["c", "ca", "cat"]);

        assert_eq!(total, 3);
        assert_eq!(correct, 3);
        assert!(state.is_solved());
    }

    #[test]
    fn backtracked_mistake_charges_but_credits_once() {
        // Type "c", "cx", clear the field, then retype "c", "ca", "cat":
        // five growth events charged, three positions ever credited, the
        // re-typed "c" neither re-credited nor the deletions charged.
        let mut state = KeystrokeState::new("cat");
        let (correct, total) =
            drive(&mut state, &["c", "cx", "c", "", "c", "ca", "cat"]);

        assert_eq!(total, 5);
        assert_eq!(correct, 3);
        assert!(state.is_solved());
    }

    #[test]
    fn deletion_never_charges() {
        let mut state = KeystrokeState::new("cat");
        let (correct, total) = drive(&mut state, &["c", "ca", "c", ""]);

        assert_eq!(total, 2);
        assert_eq!(correct, 2);
        assert!(!state.is_solved());
    }

    #[test]
    fn repeated_correct_reentry_is_not_recredited() {
        let mut state = KeystrokeState::new("cat");
        // Type "ca", delete back to "c", retype "ca": both growth events
        // charge, but position 1 is only credited the first time.
        let (correct, total) = drive(&mut state, &["c", "ca", "c", "ca"]);

        assert_eq!(total, 3);
        assert_eq!(correct, 2);
    }

    #[test]
    fn wrong_position_retracts_pointer_not_counter() {
        let mut state = KeystrokeState::new("cat");
        drive(&mut state, &["c", "ca"]);
        // Overwrite position 1 with a wrong character at the same length:
        // no charge (no growth), no credit, and the earlier credit stands.
        let eval = state.observe("cx");
        assert!(!eval.charged);
        assert!(!eval.credited);

        // Fixing it credits position 1 again exactly once.
        let eval = state.observe("ca");
        assert!(!eval.charged);
        assert!(eval.credited);
    }

    #[test]
    fn overlong_input_is_truncated() {
        let mut state = KeystrokeState::new("cat");
        let (correct, total) = drive(&mut state, &["c", "ca", "cat", "catz"]);

        // The fourth event does not grow the scored field past the answer.
        assert_eq!(total, 3);
        assert_eq!(correct, 3);
        assert_eq!(state.input_len(), 3);
        assert!(state.is_solved());
    }

    #[test]
    fn empty_answer_is_immediately_solved() {
        let mut state = KeystrokeState::new("");
        assert!(state.is_solved());

        let eval = state.observe("x");
        assert!(eval.solved);
        assert!(!eval.charged);
        assert!(!eval.credited);
    }

    #[test]
    fn paste_growth_charges_one_event() {
        // A paste delivers one event whose field grew by several characters.
        let mut state = KeystrokeState::new("cat");
        let eval = state.observe("cat");

        assert!(eval.charged);
        assert!(eval.credited);
        assert!(eval.solved);
    }

    #[test]
    fn multibyte_answers_compare_per_character() {
        let mut state = KeystrokeState::new("débâcle");
        let eval = state.observe("d");
        assert!(eval.credited);
        let eval = state.observe("dé");
        assert!(eval.credited);
        let eval = state.observe("déb");
        assert!(eval.credited);

        assert_eq!(
            state.classify()[..3],
            [
                CharOutcome::Correct,
                CharOutcome::Correct,
                CharOutcome::Correct
            ]
        );
        assert_eq!(state.classify()[3], CharOutcome::Pending);
    }

    #[test]
    fn classify_marks_wrong_positions() {
        let mut state = KeystrokeState::new("cat");
        state.observe("cx");

        assert_eq!(
            state.classify(),
            vec![
                CharOutcome::Correct,
                CharOutcome::Incorrect,
                CharOutcome::Pending
            ]
        );
    }

    #[test]
    fn solved_state_ignores_further_input() {
        let mut state = KeystrokeState::new("hi");
        state.observe("hi");
        assert!(state.is_solved());

        let eval = state.observe("hix");
        assert!(eval.solved);
        assert!(!eval.charged);
    }
}
