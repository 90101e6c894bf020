//! Question generation: lesson → shuffled sequence of multiple-choice questions.
//!
//! Flow:
//! 1) Pick `min(question_count, words)` answer words by shuffle + prefix.
//! 2) Per answer word, choose a kind uniformly among the kinds it is eligible for.
//! 3) Draw `option_count - 1` distractors (illustrated only for image questions).
//! 4) Shuffle each option set, then shuffle the question order.
//!
//! Kinds are chosen independently per question; nothing balances them across a quiz.
//! The random source is injected so callers (and tests) can seed it.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::domain::{Lesson, Question, QuestionKind, WordEntry};

pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const DEFAULT_OPTION_COUNT: usize = 5;

/// Requested size of a quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizShape {
  pub question_count: usize,
  pub option_count: usize,
}

impl Default for QuizShape {
  fn default() -> Self {
    Self { question_count: DEFAULT_QUESTION_COUNT, option_count: DEFAULT_OPTION_COUNT }
  }
}

impl QuizShape {
  pub fn new(question_count: usize, option_count: usize) -> Self {
    Self { question_count, option_count }
  }

  /// Whether `lesson` has enough words to fill one option set.
  pub fn feasible_for(&self, lesson: &Lesson) -> bool {
    self.option_count > 0 && lesson.words.len() >= self.option_count
  }
}

/// Build the questions for one quiz run.
///
/// Returns an empty sequence when the lesson has fewer words than `option_count`
/// (insufficient vocabulary). This is logged, never an error: the host shows an
/// empty state instead.
pub fn generate<R: Rng + ?Sized>(lesson: &Lesson, shape: QuizShape, rng: &mut R) -> Vec<Question> {
  if !shape.feasible_for(lesson) {
    warn!(
      target: "quiz",
      lesson = %lesson.id,
      words = lesson.words.len(),
      option_count = shape.option_count,
      "Not enough words in the lesson for the requested option count; no questions generated"
    );
    return Vec::new();
  }

  let illustrated: Vec<&WordEntry> = lesson.words.iter().filter(|w| w.has_illustration()).collect();
  // Same threshold as the option count, not option_count - 1.
  let image_questions_possible = illustrated.len() >= shape.option_count;

  let mut answers: Vec<&WordEntry> = lesson.words.iter().collect();
  answers.shuffle(rng);
  answers.truncate(shape.question_count);

  let mut questions: Vec<Question> = answers
    .into_iter()
    .map(|answer| {
      let kind = choose_kind(answer, image_questions_possible, rng);
      let pool: Vec<&WordEntry> = if kind == QuestionKind::IdentifyFromImage {
        illustrated.iter().copied().filter(|w| !w.same_word(answer)).collect()
      } else {
        lesson.words.iter().filter(|w| !w.same_word(answer)).collect()
      };
      let options = build_options(answer, pool, shape.option_count, rng);
      Question { prompt_word: answer.clone(), options, kind }
    })
    .collect();

  questions.shuffle(rng);

  debug!(
    target: "quiz",
    lesson = %lesson.id,
    questions = questions.len(),
    option_count = shape.option_count,
    image_questions_possible,
    "Quiz generated"
  );
  questions
}

/// Kinds the answer word may be asked as.
pub fn eligible_kinds(answer: &WordEntry, image_questions_possible: bool) -> Vec<QuestionKind> {
  let mut kinds = QuestionKind::BASE.to_vec();
  if answer.has_illustration() && image_questions_possible {
    kinds.push(QuestionKind::IdentifyFromImage);
  }
  kinds
}

fn choose_kind<R: Rng + ?Sized>(answer: &WordEntry, image_questions_possible: bool, rng: &mut R) -> QuestionKind {
  let kinds = eligible_kinds(answer, image_questions_possible);
  kinds[rng.gen_range(0..kinds.len())]
}

fn build_options<R: Rng + ?Sized>(
  answer: &WordEntry,
  mut pool: Vec<&WordEntry>,
  option_count: usize,
  rng: &mut R,
) -> Vec<WordEntry> {
  let wanted = option_count.saturating_sub(1);
  pool.shuffle(rng);
  if pool.len() < wanted {
    // The image gate should rule this out; fill what we can.
    warn!(target: "quiz", answer = %answer.surface_form, pool = pool.len(), wanted, "Distractor pool smaller than requested");
  }
  pool.truncate(wanted);

  let mut options: Vec<WordEntry> = std::iter::once(answer).chain(pool).cloned().collect();
  options.shuffle(rng);
  options
}
