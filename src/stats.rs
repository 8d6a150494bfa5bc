use chrono::Utc;
use std::collections::BTreeMap;

use crate::error::{QuizError, StatsError};
use crate::kv::KeyValueStore;
use crate::models::{accuracy_percent, CategoryResult, GameStats};

pub const STATS_KEY: &str = "knowledge_gap_stats";

type ErrorHook = Box<dyn Fn(&StatsError)>;

/// Cumulative play history kept in a single slot of a key-value store.
///
/// Nothing is cached: every operation re-reads the slot, so the store is the
/// only durable copy. There is no conflict resolution between processes
/// sharing a store; the last write wins.
pub struct StatsStore<S: KeyValueStore> {
    store: S,
    on_error: Option<ErrorHook>,
}

impl<S: KeyValueStore> StatsStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            on_error: None,
        }
    }

    /// Called for every persistence fault that is recovered from.
    pub fn with_error_hook(mut self, hook: impl Fn(&StatsError) + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// The stored record, or a fresh default when the slot is empty,
    /// unreadable, or corrupt.
    pub fn get_stats(&self) -> GameStats {
        match self.load() {
            Ok(Some(stats)) => stats,
            Ok(None) => GameStats::new(Utc::now()),
            Err(e) => {
                self.report(&e);
                GameStats::new(Utc::now())
            }
        }
    }

    /// Fold one finished game into the cumulative record and persist it.
    ///
    /// A game with `total_count == 0` is rejected before the store is touched.
    /// A failed write is reported but the updated record is still returned.
    pub fn save_game_results(
        &self,
        correct_count: u32,
        total_count: u32,
        category_results: &BTreeMap<String, CategoryResult>,
    ) -> Result<GameStats, QuizError> {
        if total_count == 0 {
            return Err(QuizError::NoQuestionsAnswered);
        }

        let mut stats = self.get_stats();

        // Stored counters may come from any writer; never overflow on them
        stats.games_played = stats.games_played.saturating_add(1);
        stats.total_correct = stats.total_correct.saturating_add(correct_count.into());
        stats.total_questions = stats.total_questions.saturating_add(total_count.into());
        stats.last_played = Utc::now();

        let accuracy = accuracy_percent(correct_count.into(), total_count.into());
        if accuracy > stats.best_accuracy {
            stats.best_accuracy = accuracy;
        }

        for (category, result) in category_results {
            let entry = stats.category_stats.entry(category.clone()).or_default();
            entry.played = entry.played.saturating_add(result.total.into());
            entry.correct = entry.correct.saturating_add(result.correct.into());
        }

        if let Err(e) = self.persist(&stats) {
            self.report(&e);
        } else {
            tracing::debug!(
                games_played = stats.games_played,
                accuracy,
                "saved game results"
            );
        }

        Ok(stats)
    }

    pub fn clear_stats(&self) {
        if let Err(e) = self.store.remove(STATS_KEY) {
            self.report(&StatsError::Remove(e));
        }
    }

    fn load(&self) -> Result<Option<GameStats>, StatsError> {
        let raw = self.store.read(STATS_KEY).map_err(StatsError::Read)?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(StatsError::Corrupt),
            None => Ok(None),
        }
    }

    fn persist(&self, stats: &GameStats) -> Result<(), StatsError> {
        let json = serde_json::to_string(stats).map_err(StatsError::Encode)?;
        self.store.write(STATS_KEY, &json).map_err(StatsError::Write)
    }

    fn report(&self, err: &StatsError) {
        tracing::warn!("{}", err);
        if let Some(hook) = &self.on_error {
            hook(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::kv::{MemoryStore, SqliteStore};
    use crate::models::CategoryTotals;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    // Reads succeed, every write fails
    #[derive(Default)]
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for ReadOnlyStore {
        fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.read(key)
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }
    }

    fn setup_stats() -> StatsStore<MemoryStore> {
        StatsStore::new(MemoryStore::new())
    }

    fn results(entries: &[(&str, u32, u32)]) -> BTreeMap<String, CategoryResult> {
        entries
            .iter()
            .map(|(name, correct, total)| {
                (
                    name.to_string(),
                    CategoryResult {
                        correct: *correct,
                        total: *total,
                    },
                )
            })
            .collect()
    }

    fn assert_default(stats: &GameStats) {
        assert_eq!(stats.games_played, 0);
        assert_eq!(stats.total_correct, 0);
        assert_eq!(stats.total_questions, 0);
        assert_eq!(stats.best_accuracy, 0);
        assert!(stats.category_stats.is_empty());
    }

    mod get_stats_tests {
        use super::*;

        #[test]
        fn fresh_store_returns_defaults() {
            let stats = setup_stats();
            let before = Utc::now();
            let record = stats.get_stats();
            assert_default(&record);
            assert!(record.last_played >= before);
        }

        #[test]
        fn get_stats_does_not_write() {
            let stats = setup_stats();
            stats.get_stats();
            assert_eq!(stats.store.read(STATS_KEY).unwrap(), None);
        }

        #[test]
        fn corrupt_record_falls_back_and_reports() {
            let reported = Rc::new(Cell::new(0));
            let counter = Rc::clone(&reported);
            let stats = StatsStore::new(MemoryStore::new()).with_error_hook(move |e| {
                assert!(matches!(e, StatsError::Corrupt(_)));
                counter.set(counter.get() + 1);
            });
            stats.store.write(STATS_KEY, "{not json").unwrap();

            let record = stats.get_stats();
            assert_default(&record);
            assert_eq!(reported.get(), 1);
        }

        #[test]
        fn wrong_shape_is_corrupt() {
            let stats = setup_stats();
            stats
                .store
                .write(STATS_KEY, r#"{"gamesPlayed": "many"}"#)
                .unwrap();
            assert_default(&stats.get_stats());
        }

        #[test]
        fn read_failure_falls_back_and_reports() {
            let kinds = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&kinds);
            let stats = StatsStore::new(BrokenStore).with_error_hook(move |e| {
                sink.borrow_mut().push(matches!(e, StatsError::Read(_)));
            });
            assert_default(&stats.get_stats());
            assert_eq!(*kinds.borrow(), vec![true]);
        }

        #[test]
        fn reads_existing_record() {
            let stats = setup_stats();
            stats
                .store
                .write(
                    STATS_KEY,
                    r#"{"gamesPlayed":2,"totalCorrect":7,"totalQuestions":10,"bestAccuracy":90,
                        "lastPlayed":"2024-01-01T00:00:00Z","categoryStats":{"art":{"played":3,"correct":2}}}"#,
                )
                .unwrap();
            let record = stats.get_stats();
            assert_eq!(record.games_played, 2);
            assert_eq!(record.total_correct, 7);
            assert_eq!(record.best_accuracy, 90);
            assert_eq!(
                record.category_stats.get("art"),
                Some(&CategoryTotals { played: 3, correct: 2 })
            );
        }
    }

    mod save_tests {
        use super::*;

        #[test]
        fn first_game_on_fresh_store() {
            let stats = setup_stats();
            let record = stats
                .save_game_results(4, 5, &results(&[("math", 4, 5)]))
                .unwrap();

            assert_eq!(record.games_played, 1);
            assert_eq!(record.total_correct, 4);
            assert_eq!(record.total_questions, 5);
            assert_eq!(record.best_accuracy, 80);
            assert_eq!(record.category_stats.len(), 1);
            assert_eq!(
                record.category_stats.get("math"),
                Some(&CategoryTotals { played: 5, correct: 4 })
            );
        }

        #[test]
        fn save_then_get_round_trips() {
            let stats = setup_stats();
            stats
                .save_game_results(3, 4, &results(&[("math", 2, 2), ("art", 1, 2)]))
                .unwrap();
            let before = stats.get_stats();

            let returned = stats
                .save_game_results(1, 2, &results(&[("art", 1, 2)]))
                .unwrap();
            let after = stats.get_stats();

            assert_eq!(after, returned);
            assert_eq!(after.games_played, before.games_played + 1);
            assert_eq!(after.total_correct, before.total_correct + 1);
            assert_eq!(after.total_questions, before.total_questions + 2);
        }

        #[test]
        fn categories_created_lazily_and_accumulate() {
            let stats = setup_stats();
            stats
                .save_game_results(2, 3, &results(&[("math", 2, 3)]))
                .unwrap();
            let record = stats
                .save_game_results(3, 4, &results(&[("math", 1, 2), ("history", 2, 2)]))
                .unwrap();

            assert_eq!(
                record.category_stats.get("math"),
                Some(&CategoryTotals { played: 5, correct: 3 })
            );
            assert_eq!(
                record.category_stats.get("history"),
                Some(&CategoryTotals { played: 2, correct: 2 })
            );
        }

        #[test]
        fn best_accuracy_never_decreases() {
            let stats = setup_stats();
            let mut best = 0;
            for (correct, total) in [(2, 5), (5, 5), (1, 4), (3, 3), (0, 2)] {
                let record = stats
                    .save_game_results(correct, total, &BTreeMap::new())
                    .unwrap();
                assert!(record.best_accuracy >= best);
                best = record.best_accuracy;
            }
            assert_eq!(best, 100);
        }

        #[test]
        fn best_accuracy_tracks_maximum() {
            let stats = setup_stats();
            stats.save_game_results(3, 5, &BTreeMap::new()).unwrap();
            let record = stats.save_game_results(1, 5, &BTreeMap::new()).unwrap();
            assert_eq!(record.best_accuracy, 60);
        }

        #[test]
        fn updates_last_played() {
            let stats = setup_stats();
            stats
                .store
                .write(
                    STATS_KEY,
                    r#"{"gamesPlayed":1,"totalCorrect":1,"totalQuestions":1,"bestAccuracy":100,
                        "lastPlayed":"2020-01-01T00:00:00Z","categoryStats":{}}"#,
                )
                .unwrap();
            let before = Utc::now();
            let record = stats.save_game_results(1, 1, &BTreeMap::new()).unwrap();
            assert!(record.last_played >= before);
        }

        #[test]
        fn zero_total_is_rejected_without_writing() {
            let stats = setup_stats();
            let result = stats.save_game_results(0, 0, &BTreeMap::new());
            assert!(matches!(result, Err(QuizError::NoQuestionsAnswered)));
            assert_eq!(stats.store.read(STATS_KEY).unwrap(), None);
        }

        #[test]
        fn counters_saturate_instead_of_overflowing() {
            let stats = setup_stats();
            let record = format!(
                r#"{{"gamesPlayed":{max},"totalCorrect":{max},"totalQuestions":{max},"bestAccuracy":50,
                    "lastPlayed":"2020-01-01T00:00:00Z","categoryStats":{{"math":{{"played":{max},"correct":{max}}}}}}}"#,
                max = u64::MAX
            );
            stats.store.write(STATS_KEY, &record).unwrap();

            let record = stats
                .save_game_results(1, 1, &results(&[("math", 1, 1)]))
                .unwrap();
            assert_eq!(record.games_played, u64::MAX);
            assert_eq!(record.total_correct, u64::MAX);
            assert_eq!(record.total_questions, u64::MAX);
            assert_eq!(record.best_accuracy, 100);
            assert_eq!(
                record.category_stats.get("math"),
                Some(&CategoryTotals {
                    played: u64::MAX,
                    correct: u64::MAX
                })
            );
        }

        #[test]
        fn counters_beyond_u32_are_kept() {
            let reports = Rc::new(Cell::new(0));
            let counter = Rc::clone(&reports);
            let stats = StatsStore::new(MemoryStore::new())
                .with_error_hook(move |_| counter.set(counter.get() + 1));
            stats
                .store
                .write(
                    STATS_KEY,
                    r#"{"gamesPlayed":7,"totalCorrect":5000000000,"totalQuestions":6000000000,
                        "bestAccuracy":90,"lastPlayed":"2020-01-01T00:00:00Z","categoryStats":{}}"#,
                )
                .unwrap();

            let loaded = stats.get_stats();
            assert_eq!(loaded.games_played, 7);
            assert_eq!(loaded.total_questions, 6_000_000_000);

            let record = stats.save_game_results(1, 2, &BTreeMap::new()).unwrap();
            assert_eq!(record.games_played, 8);
            assert_eq!(record.total_correct, 5_000_000_001);
            assert_eq!(record.total_questions, 6_000_000_002);
            assert_eq!(reports.get(), 0);
        }

        #[test]
        fn corrupt_record_is_replaced_on_save() {
            let stats = setup_stats();
            stats.store.write(STATS_KEY, "garbage").unwrap();
            let record = stats.save_game_results(1, 2, &BTreeMap::new()).unwrap();
            assert_eq!(record.games_played, 1);
            assert_eq!(stats.get_stats().games_played, 1);
        }

        #[test]
        fn write_failure_still_returns_updated_record() {
            let failures = Rc::new(Cell::new(0));
            let counter = Rc::clone(&failures);
            let stats = StatsStore::new(ReadOnlyStore::default()).with_error_hook(move |e| {
                assert!(matches!(e, StatsError::Write(_)));
                counter.set(counter.get() + 1);
            });

            let record = stats
                .save_game_results(4, 5, &results(&[("math", 4, 5)]))
                .unwrap();
            assert_eq!(record.games_played, 1);
            assert_eq!(record.best_accuracy, 80);
            assert_eq!(failures.get(), 1);

            // The lost update is not visible on the next read
            assert_default(&stats.get_stats());
        }

        #[test]
        fn sqlite_backed_round_trip() {
            let stats = StatsStore::new(SqliteStore::open_in_memory().unwrap());
            stats
                .save_game_results(4, 5, &results(&[("math", 4, 5)]))
                .unwrap();
            let record = stats.get_stats();
            assert_eq!(record.games_played, 1);
            assert_eq!(record.best_accuracy, 80);
        }

        #[test]
        fn survives_reopening_database() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("knowledge_gap.db");

            {
                let stats = StatsStore::new(SqliteStore::open(&path).unwrap());
                stats
                    .save_game_results(2, 4, &results(&[("history", 2, 4)]))
                    .unwrap();
            }

            let stats = StatsStore::new(SqliteStore::open(&path).unwrap());
            let record = stats.get_stats();
            assert_eq!(record.games_played, 1);
            assert_eq!(record.best_accuracy, 50);
        }
    }

    mod clear_tests {
        use super::*;

        #[test]
        fn clear_resets_to_defaults() {
            let stats = setup_stats();
            stats
                .save_game_results(4, 5, &results(&[("math", 4, 5)]))
                .unwrap();
            stats.clear_stats();
            assert_default(&stats.get_stats());
            assert_eq!(stats.store.read(STATS_KEY).unwrap(), None);
        }

        #[test]
        fn clear_on_empty_store_is_ok() {
            let stats = setup_stats();
            stats.clear_stats();
            assert_default(&stats.get_stats());
        }

        #[test]
        fn clear_then_save_starts_over() {
            let stats = setup_stats();
            stats.save_game_results(5, 5, &BTreeMap::new()).unwrap();
            stats.clear_stats();
            let record = stats.save_game_results(1, 5, &BTreeMap::new()).unwrap();
            assert_eq!(record.games_played, 1);
            assert_eq!(record.best_accuracy, 20);
        }

        #[test]
        fn clear_with_broken_store_does_not_panic() {
            let stats = StatsStore::new(BrokenStore);
            stats.clear_stats();
        }

        #[test]
        fn clear_failure_reaches_error_hook() {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&seen);
            let stats = StatsStore::new(BrokenStore).with_error_hook(move |e| {
                sink.borrow_mut().push(matches!(e, StatsError::Remove(_)));
            });
            stats.clear_stats();
            assert_eq!(*seen.borrow(), vec![true]);
        }
    }
}
