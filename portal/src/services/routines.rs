//! Routine store
//!
//! Ordered collection of class routines. `RoutineBook` holds the in-memory
//! rules; `RoutinesService` loads it from local storage, applies one change
//! and writes the whole collection back.

use crate::config::KEY_ROUTINES;
use crate::database::{ClassRoutine, LocalStore, NewRoutine};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-memory routine collection in stored order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutineBook {
    routines: Vec<ClassRoutine>,
}

impl RoutineBook {
    pub fn new(routines: Vec<ClassRoutine>) -> Self {
        Self { routines }
    }

    pub fn routines(&self) -> &[ClassRoutine] {
        &self.routines
    }

    pub fn into_routines(self) -> Vec<ClassRoutine> {
        self.routines
    }

    pub fn get(&self, id: &str) -> Option<&ClassRoutine> {
        self.routines.iter().find(|r| r.id == id)
    }

    /// Append a routine with a fresh id and its alarm enabled
    pub fn add(&mut self, new: NewRoutine) -> ClassRoutine {
        let id = self.fresh_id();

        let routine = ClassRoutine {
            id,
            time: new.time,
            class_name: new.class_name,
            section: new.section,
            subject: new.subject,
            homework: new.homework.unwrap_or_default(),
            alarm_active: true,
            alarm_music: new.alarm_music,
        };

        self.routines.push(routine.clone());
        routine
    }

    /// Flip `alarm_active` on the matching entry only
    pub fn toggle_alarm(&mut self, id: &str) -> Option<&ClassRoutine> {
        let routine = self.routines.iter_mut().find(|r| r.id == id)?;
        routine.alarm_active = !routine.alarm_active;
        Some(routine)
    }

    /// Delete the matching entry
    pub fn remove(&mut self, id: &str) -> Option<ClassRoutine> {
        let index = self.routines.iter().position(|r| r.id == id)?;
        Some(self.routines.remove(index))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

/// Persistent routine store
#[derive(Clone)]
pub struct RoutinesService {
    store: LocalStore,
    write_lock: Arc<Mutex<()>>,
}

impl RoutinesService {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load the stored collection. Malformed data yields an empty book.
    pub async fn load(&self) -> Result<RoutineBook> {
        let routines: Vec<ClassRoutine> = self
            .store
            .load_json(KEY_ROUTINES)
            .await?
            .unwrap_or_default();

        Ok(RoutineBook::new(routines))
    }

    async fn save(&self, book: &RoutineBook) -> Result<()> {
        self.store.save_json(KEY_ROUTINES, book.routines()).await
    }

    /// List routines in stored order
    pub async fn list(&self) -> Result<Vec<ClassRoutine>> {
        Ok(self.load().await?.into_routines())
    }

    /// Add a routine and persist the collection
    pub async fn add(&self, new: NewRoutine) -> Result<ClassRoutine> {
        let _guard = self.write_lock.lock().await;

        let mut book = self.load().await?;
        let routine = book.add(new);
        self.save(&book).await?;

        tracing::info!(
            "Added routine {} (class {} {} at {})",
            routine.id,
            routine.class_name,
            routine.section,
            routine.time
        );
        Ok(routine)
    }

    /// Toggle a routine's alarm. Returns `None` when the id is unknown.
    pub async fn toggle_alarm(&self, id: &str) -> Result<Option<ClassRoutine>> {
        let _guard = self.write_lock.lock().await;

        let mut book = self.load().await?;
        let toggled = book.toggle_alarm(id).cloned();
        self.save(&book).await?;

        if let Some(routine) = &toggled {
            tracing::info!("Alarm for routine {} is now {}", routine.id, routine.alarm_active);
        }
        Ok(toggled)
    }

    /// Delete a routine. Returns `None` when the id is unknown.
    pub async fn remove(&self, id: &str) -> Result<Option<ClassRoutine>> {
        let _guard = self.write_lock.lock().await;

        let mut book = self.load().await?;
        let removed = book.remove(id);
        self.save(&book).await?;

        if removed.is_some() {
            tracing::info!("Removed routine {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    fn new_routine(time: &str, subject: &str) -> NewRoutine {
        NewRoutine {
            time: time.to_string(),
            class_name: "8".to_string(),
            section: "ময়না".to_string(),
            subject: subject.to_string(),
            homework: None,
            alarm_music: None,
        }
    }

    async fn create_test_service() -> (RoutinesService, LocalStore) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let store = LocalStore::new(pool);
        (RoutinesService::new(store.clone()), store)
    }

    #[test]
    fn test_add_assigns_unique_ids_and_enables_alarm() {
        let mut book = RoutineBook::default();

        let first = book.add(new_routine("08:00", "Math"));
        let second = book.add(new_routine("08:00", "Math"));

        assert_ne!(first.id, second.id);
        assert!(first.alarm_active);
        assert_eq!(first.homework, "");
        assert_eq!(book.routines().len(), 2);
    }

    #[test]
    fn test_toggle_twice_restores_entry() {
        let mut book = RoutineBook::default();
        let original = book.add(new_routine("10:15", "Biology"));

        assert!(!book.toggle_alarm(&original.id).unwrap().alarm_active);
        let restored = book.toggle_alarm(&original.id).unwrap().clone();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_toggle_only_touches_matching_entry() {
        let mut book = RoutineBook::default();
        let a = book.add(new_routine("08:00", "Math"));
        let b = book.add(new_routine("09:00", "Physics"));

        book.toggle_alarm(&a.id);

        assert!(!book.get(&a.id).unwrap().alarm_active);
        assert_eq!(book.get(&b.id).unwrap(), &b);
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let mut book = RoutineBook::default();
        book.add(new_routine("08:00", "Math"));
        let before = book.clone();

        assert!(book.toggle_alarm("missing").is_none());
        assert!(book.remove("missing").is_none());
        assert_eq!(book, before);
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut book = RoutineBook::default();
        let a = book.add(new_routine("08:00", "Math"));
        let b = book.add(new_routine("09:00", "Physics"));
        let c = book.add(new_routine("10:00", "Chemistry"));

        book.remove(&b.id);

        let ids: Vec<_> = book.routines().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_service_persists_every_change() {
        let (service, store) = create_test_service().await;

        let routine = service.add(new_routine("11:30", "English")).await.unwrap();
        assert!(store.get(KEY_ROUTINES).await.unwrap().is_some());

        service.toggle_alarm(&routine.id).await.unwrap();
        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].alarm_active);

        let removed = service.remove(&routine.id).await.unwrap();
        assert_eq!(removed.map(|r| r.id), Some(routine.id));
        assert!(service.list().await.unwrap().is_empty());
        assert_eq!(store.get(KEY_ROUTINES).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_malformed_routines_fall_back_to_empty() {
        let (service, store) = create_test_service().await;

        store.set(KEY_ROUTINES, "not json at all").await.unwrap();

        assert!(service.list().await.unwrap().is_empty());

        // The next write replaces the bad value
        service.add(new_routine("07:45", "Bangla")).await.unwrap();
        assert_eq!(service.list().await.unwrap().len(), 1);
    }
}
