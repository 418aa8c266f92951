//! Built-in units and lessons.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;

use lingo_core::model::{Lesson, LessonId, LessonSummary, Unit, UnitId};

use crate::error::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    units: Vec<Unit>,
    lessons: Vec<Lesson>,
}

/// Ordered units plus the playable content for some of their lessons.
///
/// Every listed lesson id is unique across units, and all content belongs to
/// a listed lesson in the unit it names.
#[derive(Debug, Clone)]
pub struct LessonCatalog {
    units: Vec<Unit>,
    placement: HashMap<LessonId, usize>,
    content: HashMap<LessonId, Arc<Lesson>>,
}

impl LessonCatalog {
    /// The catalog shipped with the app.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the embedded data is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON or invalid lessons,
    /// and the structural variants when units and content disagree.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.units, file.lessons)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateUnit`, `DuplicateLesson`, `OrphanContent` or
    /// `UnitMismatch` when the pieces do not fit together.
    pub fn new(units: Vec<Unit>, lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        if let Some(unit) = units.iter().find(|unit| !seen.insert(unit.id)) {
            return Err(CatalogError::DuplicateUnit(unit.id));
        }

        let mut placement = HashMap::new();
        for (index, unit) in units.iter().enumerate() {
            for summary in &unit.lessons {
                if placement.insert(summary.id, index).is_some() {
                    return Err(CatalogError::DuplicateLesson(summary.id));
                }
            }
        }

        let mut content = HashMap::new();
        for lesson in lessons {
            let id = lesson.id();
            let Some(&index) = placement.get(&id) else {
                return Err(CatalogError::OrphanContent(id));
            };
            let listed = units[index].id;
            if listed != lesson.unit_id() {
                return Err(CatalogError::UnitMismatch {
                    lesson: id,
                    listed,
                    content: lesson.unit_id(),
                });
            }
            if content.insert(id, Arc::new(lesson)).is_some() {
                return Err(CatalogError::DuplicateLesson(id));
            }
        }

        Ok(Self {
            units,
            placement,
            content,
        })
    }

    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// # Errors
    ///
    /// Returns `CatalogError::UnitNotFound` for an unknown id.
    pub fn unit(&self, id: UnitId) -> Result<&Unit, CatalogError> {
        self.units
            .iter()
            .find(|unit| unit.id == id)
            .ok_or(CatalogError::UnitNotFound(id))
    }

    /// The unit a lesson is listed in.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::LessonNotFound` for an unknown id.
    pub fn unit_of(&self, id: LessonId) -> Result<&Unit, CatalogError> {
        self.placement
            .get(&id)
            .map(|&index| &self.units[index])
            .ok_or(CatalogError::LessonNotFound(id))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::LessonNotFound` for an unknown id.
    pub fn summary(&self, id: LessonId) -> Result<&LessonSummary, CatalogError> {
        self.unit_of(id)?
            .lessons
            .iter()
            .find(|summary| summary.id == id)
            .ok_or(CatalogError::LessonNotFound(id))
    }

    /// Playable content for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::LessonNotFound` for an unknown id and
    /// `CatalogError::ContentUnavailable` for a listed lesson with no steps yet.
    pub fn lesson(&self, id: LessonId) -> Result<Arc<Lesson>, CatalogError> {
        if let Some(lesson) = self.content.get(&id) {
            return Ok(Arc::clone(lesson));
        }
        if self.placement.contains_key(&id) {
            return Err(CatalogError::ContentUnavailable(id));
        }
        Err(CatalogError::LessonNotFound(id))
    }

    #[must_use]
    pub fn is_playable(&self, id: LessonId) -> bool {
        self.content.contains_key(&id)
    }

    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.placement.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::model::{LessonCategory, Step};

    #[test]
    fn builtin_catalog_loads() {
        let catalog = LessonCatalog::builtin().unwrap();
        let titles: Vec<_> = catalog.units().iter().map(|u| u.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Basics",
                "Greetings & Introductions",
                "Family & Relationships",
                "Daily Activities"
            ]
        );
        assert_eq!(catalog.unit(UnitId::new(1)).unwrap().lessons.len(), 8);
        assert_eq!(catalog.total_lessons(), 23);
    }

    #[test]
    fn greetings_lesson_has_expected_quizzes() {
        let catalog = LessonCatalog::builtin().unwrap();
        let lesson = catalog.lesson(LessonId::new(2)).unwrap();
        assert_eq!(lesson.len(), 6);
        assert_eq!(lesson.quiz_count(), 2);
        let answers: Vec<_> = lesson
            .steps()
            .iter()
            .filter_map(|step| match step {
                Step::Quiz { correct_option, .. } => Some(*correct_option),
                _ => None,
            })
            .collect();
        assert_eq!(answers, [1, 2]);
    }

    #[test]
    fn premium_flags_follow_listing() {
        let catalog = LessonCatalog::builtin().unwrap();
        let practice = catalog.summary(LessonId::new(5)).unwrap();
        assert!(practice.premium);
        assert_eq!(practice.category, LessonCategory::Speaking);
        assert!(!catalog.summary(LessonId::new(7)).unwrap().premium);
    }

    #[test]
    fn unknown_and_unplayable_lessons_are_distinguished() {
        let catalog = LessonCatalog::builtin().unwrap();
        assert!(matches!(
            catalog.lesson(LessonId::new(999)),
            Err(CatalogError::LessonNotFound(_))
        ));
        assert!(matches!(
            catalog.lesson(LessonId::new(23)),
            Err(CatalogError::ContentUnavailable(_))
        ));
        assert!(matches!(
            catalog.unit(UnitId::new(9)),
            Err(CatalogError::UnitNotFound(_))
        ));
    }

    #[test]
    fn content_outside_any_unit_is_rejected() {
        let json = r#"{
            "units": [{"id": 1, "title": "A", "description": "", "lessons": []}],
            "lessons": [{"id": 4, "unit_id": 1, "title": "Stray",
                "steps": [{"type": "completion", "title": "Done", "message": "ok"}]}]
        }"#;
        assert!(matches!(
            LessonCatalog::from_json(json),
            Err(CatalogError::OrphanContent(_))
        ));
    }

    #[test]
    fn duplicate_listing_is_rejected() {
        let json = r#"{
            "units": [
                {"id": 1, "title": "A", "description": "", "lessons": [
                    {"id": 1, "title": "x", "category": "quiz"}]},
                {"id": 2, "title": "B", "description": "", "lessons": [
                    {"id": 1, "title": "y", "category": "quiz"}]}
            ],
            "lessons": []
        }"#;
        assert!(matches!(
            LessonCatalog::from_json(json),
            Err(CatalogError::DuplicateLesson(_))
        ));
    }

    #[test]
    fn invalid_lesson_content_fails_to_parse() {
        let json = r#"{
            "units": [{"id": 1, "title": "A", "description": "", "lessons": [
                {"id": 1, "title": "x", "category": "quiz"}]}],
            "lessons": [{"id": 1, "unit_id": 1, "title": "x", "steps": []}]
        }"#;
        assert!(matches!(
            LessonCatalog::from_json(json),
            Err(CatalogError::Parse(_))
        ));
    }
}
