//! The persistent, insertion-ordered workout collection.
//!
//! Every successful mutation writes the whole collection back through the
//! key-value backend before returning. A failed write is logged and
//! reported as [`SaveStatus::Unsaved`]; the in-memory change stays applied.

use crate::storage::KeyValueStore;
use crate::{Error, ParseFailure, Result, Workout, WorkoutPatch};

/// Key holding the JSON array of workouts
pub const WORKOUTS_KEY: &str = "runTracker.workouts";

/// Outcome of the persistence side effect of a mutation
#[derive(Debug)]
pub enum SaveStatus {
    Saved,
    /// The in-memory change was kept but could not be written
    Unsaved(Error),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }
}

/// Decode the persisted workouts array.
///
/// Elements that do not decode as a [`Workout`] are skipped with a warning;
/// only a document that is not a JSON array at all is a failure.
pub fn decode_workouts(raw: &str) -> std::result::Result<Vec<Workout>, ParseFailure> {
    decode_entries(raw).map(|(workouts, _)| workouts)
}

/// Split the persisted array into decodable workouts and the raw elements
/// that are not.
fn decode_entries(
    raw: &str,
) -> std::result::Result<(Vec<Workout>, Vec<serde_json::Value>), ParseFailure> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ParseFailure::Malformed(e.to_string()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(ParseFailure::NotAnArray),
    };

    let mut workouts = Vec::with_capacity(items.len());
    let mut unreadable = Vec::new();
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Workout>(item.clone()) {
            Ok(workout) => workouts.push(workout),
            Err(e) => {
                tracing::warn!("Skipping stored workout #{}: {}", idx, e);
                unreadable.push(item);
            }
        }
    }
    Ok((workouts, unreadable))
}

/// Ordered workout collection bound to a key-value backend
pub struct WorkoutStore<S: KeyValueStore> {
    workouts: Vec<Workout>,
    /// Stored elements that did not decode; written back untouched after
    /// the workouts
    unreadable: Vec<serde_json::Value>,
    backend: S,
}

impl<S: KeyValueStore> WorkoutStore<S> {
    /// Start with an empty collection without reading the backend
    pub fn empty(backend: S) -> Self {
        Self {
            workouts: Vec::new(),
            unreadable: Vec::new(),
            backend,
        }
    }

    /// Load the collection from the backend.
    ///
    /// Absent, unreadable or unparseable data yields an empty collection.
    pub fn load(backend: S) -> Self {
        let (workouts, unreadable) = match backend.get(WORKOUTS_KEY) {
            Ok(Some(raw)) => match decode_entries(&raw) {
                Ok((workouts, unreadable)) => {
                    tracing::debug!(
                        "Loaded {} workouts ({} unreadable kept as-is)",
                        workouts.len(),
                        unreadable.len()
                    );
                    (workouts, unreadable)
                }
                Err(e) => {
                    tracing::warn!("Could not parse saved workouts: {}. Starting empty.", e);
                    (Vec::new(), Vec::new())
                }
            },
            Ok(None) => {
                tracing::info!("No saved workouts found, starting empty");
                (Vec::new(), Vec::new())
            }
            Err(e) => {
                tracing::warn!("Could not read saved workouts: {}. Starting empty.", e);
                (Vec::new(), Vec::new())
            }
        };

        Self {
            workouts,
            unreadable,
            backend,
        }
    }

    /// All workouts in insertion order
    pub fn get_all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn get(&self, index: usize) -> Option<&Workout> {
        self.workouts.get(index)
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Validate and append a workout to the end of the collection
    pub fn append(&mut self, candidate: Workout) -> Result<SaveStatus> {
        candidate.validate()?;
        tracing::info!(
            "Adding workout on {}: {} km in {} min",
            candidate.date,
            candidate.distance,
            candidate.duration
        );
        self.workouts.push(candidate);
        Ok(self.persist())
    }

    /// Merge `patch` over the workout at `index`.
    ///
    /// The merged record must still satisfy the workout invariants.
    pub fn update_at(&mut self, index: usize, patch: &WorkoutPatch) -> Result<SaveStatus> {
        let current = self.checked(index)?;
        let merged = patch.merge_onto(current);
        merged.validate()?;

        self.workouts[index] = merged;
        tracing::info!("Updated workout #{}", index);
        Ok(self.persist())
    }

    /// Remove the workout at `index`; later workouts shift down by one
    pub fn remove_at(&mut self, index: usize) -> Result<(Workout, SaveStatus)> {
        self.checked(index)?;
        let removed = self.workouts.remove(index);
        tracing::info!("Removed workout #{} ({})", index, removed.date);
        Ok((removed, self.persist()))
    }

    /// Give kudos to the workout at `index`, returning the new count
    pub fn increment_kudos(&mut self, index: usize) -> Result<(u32, SaveStatus)> {
        self.checked(index)?;
        let workout = &mut self.workouts[index];
        workout.kudos = workout.kudos.saturating_add(1);
        let kudos = workout.kudos;
        tracing::debug!("Workout #{} now has {} kudos", index, kudos);
        Ok((kudos, self.persist()))
    }

    fn checked(&self, index: usize) -> Result<&Workout> {
        self.workouts.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.workouts.len(),
        })
    }

    fn persist(&mut self) -> SaveStatus {
        let result = self
            .workouts
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()
            .and_then(|mut entries| {
                entries.extend(self.unreadable.iter().cloned());
                serde_json::to_string(&entries)
            })
            .map_err(Error::from)
            .and_then(|json| self.backend.set(WORKOUTS_KEY, &json));

        match result {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                tracing::warn!("Could not save workouts: {}", e);
                SaveStatus::Unsaved(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn sample(date: &str, distance: f64, duration: f64) -> Workout {
        Workout::new(date, distance, duration)
    }

    fn store_with(workouts: &[Workout]) -> (WorkoutStore<MemoryStore>, MemoryStore) {
        let handle = MemoryStore::new();
        let mut store = WorkoutStore::empty(handle.clone());
        for w in workouts {
            assert!(store.append(w.clone()).unwrap().is_saved());
        }
        (store, handle)
    }

    #[test]
    fn test_append_grows_by_one_with_default_kudos() {
        crate::logging::init_test();
        let (mut store, handle) = store_with(&[]);

        let w = sample("2024-05-01", 5.0, 25.0).with_type("Easy");
        assert!(store.append(w.clone()).unwrap().is_saved());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_all().last(), Some(&w));
        assert_eq!(store.get_all()[0].kudos, 0);

        let persisted = decode_workouts(&handle.raw(WORKOUTS_KEY).unwrap()).unwrap();
        assert_eq!(persisted, vec![w]);
    }

    #[test]
    fn test_append_rejects_invalid_without_mutation() {
        let (mut store, handle) = store_with(&[]);

        let result = store.append(sample("2024-05-01", 0.0, 25.0));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.is_empty());
        assert_eq!(handle.raw(WORKOUTS_KEY), None);

        let result = store.append(sample("", 5.0, 25.0));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let (store, _) = store_with(&[
            sample("2024-05-03", 5.0, 25.0),
            sample("2024-05-01", 3.0, 18.0),
            sample("2024-05-02", 8.0, 44.0),
        ]);

        let dates: Vec<_> = store.get_all().iter().map(|w| w.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-03", "2024-05-01", "2024-05-02"]);
    }

    #[test]
    fn test_update_preserves_unspecified_fields() {
        let (mut store, _) = store_with(&[sample("2024-05-01", 5.0, 25.0).with_type("Tempo")]);
        store.increment_kudos(0).unwrap();

        let patch = WorkoutPatch {
            distance: Some(7.5),
            ..Default::default()
        };
        assert!(store.update_at(0, &patch).unwrap().is_saved());

        let updated = &store.get_all()[0];
        assert_eq!(updated.distance, 7.5);
        assert_eq!(updated.kudos, 1);
        assert_eq!(updated.duration, 25.0);
        assert_eq!(updated.workout_type.as_deref(), Some("Tempo"));
    }

    #[test]
    fn test_update_rejects_invalid_merge() {
        let (mut store, _) = store_with(&[sample("2024-05-01", 5.0, 25.0)]);

        let patch = WorkoutPatch {
            duration: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            store.update_at(0, &patch),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(store.get_all()[0].duration, 25.0);
    }

    #[test]
    fn test_out_of_range_leaves_collection_unchanged() {
        let (mut store, _) = store_with(&[sample("2024-05-01", 5.0, 25.0)]);
        let before = store.get_all().to_vec();

        assert!(matches!(
            store.remove_at(1),
            Err(Error::OutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            store.update_at(5, &WorkoutPatch::default()),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            store.increment_kudos(9),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(store.get_all(), before.as_slice());
    }

    #[test]
    fn test_remove_shifts_indices() {
        let (mut store, _) = store_with(&[
            sample("2024-05-01", 1.0, 6.0),
            sample("2024-05-02", 2.0, 12.0),
            sample("2024-05-03", 3.0, 18.0),
        ]);

        let (removed, status) = store.remove_at(1).unwrap();
        assert!(status.is_saved());
        assert_eq!(removed.date, "2024-05-02");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().date, "2024-05-03");
    }

    #[test]
    fn test_kudos_increments() {
        let (mut store, _) = store_with(&[sample("2024-05-01", 5.0, 25.0)]);
        assert_eq!(store.increment_kudos(0).unwrap().0, 1);
        assert_eq!(store.increment_kudos(0).unwrap().0, 2);
    }

    #[test]
    fn test_failed_write_keeps_in_memory_change() {
        let (mut store, handle) = store_with(&[sample("2024-05-01", 5.0, 25.0)]);
        handle.set_fail_writes(true);

        let status = store.append(sample("2024-05-02", 6.0, 30.0)).unwrap();
        assert!(matches!(status, SaveStatus::Unsaved(Error::Persistence(_))));
        assert_eq!(store.len(), 2);

        // The backend still holds the previous collection
        let persisted = decode_workouts(&handle.raw(WORKOUTS_KEY).unwrap()).unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[test]
    fn test_load_roundtrip_through_files() {
        let temp_dir = tempfile::tempdir().unwrap();

        let mut store = WorkoutStore::load(FileStore::new(temp_dir.path()));
        assert!(store.is_empty());
        store.append(sample("2024-05-01", 5.0, 25.0)).unwrap();
        store.increment_kudos(0).unwrap();

        let reloaded = WorkoutStore::load(FileStore::new(temp_dir.path()));
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get_all()[0].kudos, 1);
    }

    #[test]
    fn test_load_corrupted_falls_back_to_empty() {
        let handle = MemoryStore::new();
        handle.insert(WORKOUTS_KEY, "{ invalid json }");
        assert!(WorkoutStore::load(handle.clone()).is_empty());

        handle.insert(WORKOUTS_KEY, r#"{"date":"2024-05-01"}"#);
        assert!(WorkoutStore::load(handle).is_empty());
    }

    #[test]
    fn test_decode_tags_failures() {
        assert!(matches!(
            decode_workouts("nope"),
            Err(ParseFailure::Malformed(_))
        ));
        assert_eq!(decode_workouts("{}"), Err(ParseFailure::NotAnArray));
    }

    #[test]
    fn test_decode_skips_bad_elements() {
        let raw = r#"[
            {"date":"2024-05-01","distance":5,"duration":25,"type":"Easy","kudos":2},
            {"date":"2024-05-02"},
            42,
            {"date":"2024-05-03","distance":3,"duration":20}
        ]"#;
        let workouts = decode_workouts(raw).unwrap();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0].kudos, 2);
        assert_eq!(workouts[1].kudos, 0);
    }

    #[test]
    fn test_unreadable_records_survive_a_save() {
        let handle = MemoryStore::new();
        handle.insert(
            WORKOUTS_KEY,
            r#"[
                {"date":"2024-05-01","distance":5,"duration":25},
                {"date":"2024-05-02","distance":null,"duration":30,"type":"Easy","kudos":4}
            ]"#,
        );

        let mut store = WorkoutStore::load(handle.clone());
        assert_eq!(store.len(), 1);
        assert!(store.increment_kudos(0).unwrap().1.is_saved());

        let stored: serde_json::Value =
            serde_json::from_str(&handle.raw(WORKOUTS_KEY).unwrap()).unwrap();
        let entries = stored.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["kudos"], 1);
        assert_eq!(entries[1]["date"], "2024-05-02");
        assert!(entries[1]["distance"].is_null());
        assert_eq!(entries[1]["kudos"], 4);

        // Still only the readable record is addressable after a reload
        let reloaded = WorkoutStore::load(handle);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get_all()[0].kudos, 1);
    }
}
