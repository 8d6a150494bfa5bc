use rand::Rng;
use std::collections::BTreeMap;

use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::kv::KeyValueStore;
use crate::models::{AnswerRecord, CategoryResult, CategoryStats, GameStats, Question};
use crate::stats::StatsStore;

pub const DEFAULT_GAME_LENGTH: u32 = 10;

/// One round of play: a fixed number of questions, answered one at a time.
///
/// Every answer counts toward the game totals, including repeats of a question
/// already seen. The answer record keeps the latest outcome per question.
#[derive(Debug, Clone)]
pub struct GameSession {
    length: u32,
    answers: AnswerRecord,
    category_results: BTreeMap<String, CategoryResult>,
    correct: u32,
    answered: u32,
}

impl GameSession {
    pub fn new(length: u32) -> Self {
        Self {
            length: length.max(1),
            answers: AnswerRecord::new(),
            category_results: BTreeMap::new(),
            correct: 0,
            answered: 0,
        }
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn is_over(&self) -> bool {
        self.answered >= self.length
    }

    pub fn next_question<'a>(&self, bank: &'a QuestionBank) -> Result<&'a Question, QuizError> {
        self.next_question_with(bank, &mut rand::thread_rng())
    }

    /// Prefer a question not yet answered this game; fall back to any draw
    /// when the pool is exhausted.
    pub fn next_question_with<'a, R: Rng + ?Sized>(
        &self,
        bank: &'a QuestionBank,
        rng: &mut R,
    ) -> Result<&'a Question, QuizError> {
        const MAX_REDRAWS: usize = 16;

        let mut question = bank.get_random_question_with(&mut *rng)?;
        for _ in 0..MAX_REDRAWS {
            if !self.answers.contains_key(&question.id) {
                break;
            }
            question = bank.get_random_question_with(&mut *rng)?;
        }
        Ok(question)
    }

    /// Record a chosen option. Returns whether it was correct.
    pub fn answer(&mut self, question: &Question, choice: &str) -> bool {
        let is_correct = question.is_correct(choice);

        self.answers.insert(question.id, is_correct);
        let tally = self
            .category_results
            .entry(question.category.clone())
            .or_default();
        tally.total += 1;
        self.answered += 1;
        if is_correct {
            tally.correct += 1;
            self.correct += 1;
        }

        is_correct
    }

    pub fn category_stats(&self, bank: &QuestionBank) -> Vec<CategoryStats> {
        bank.get_category_stats(&self.answers)
    }

    pub fn finish<S: KeyValueStore>(&self, stats: &StatsStore<S>) -> Result<GameStats, QuizError> {
        stats.save_game_results(self.correct, self.answered, &self.category_results)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(DEFAULT_GAME_LENGTH)
    }
}
