use services::{DashboardOverview, UnitOverview};

#[derive(Clone, Debug, PartialEq)]
pub struct UnitCardVm {
    pub id: u64,
    pub title: String,
    pub percent: f64,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardVm {
    pub level: u64,
    pub total_xp: u64,
    pub xp_to_next_level: u64,
    pub level_percent: f64,
    pub lessons_label: String,
    pub lessons_percent: f64,
    pub streak_label: String,
    pub units: Vec<UnitCardVm>,
    pub next_unit: Option<(u64, String)>,
    pub next_lesson: Option<u64>,
}

#[must_use]
pub fn map_dashboard(overview: &DashboardOverview) -> DashboardVm {
    let units = overview
        .units
        .iter()
        .map(|card| UnitCardVm {
            id: card.id.value(),
            title: card.title.clone(),
            percent: card.progress.percent(),
            label: format!(
                "{}/{} lessons",
                card.progress.completed, card.progress.total
            ),
        })
        .collect();

    DashboardVm {
        level: overview.level,
        total_xp: overview.total_xp,
        xp_to_next_level: overview.xp_to_next_level,
        level_percent: overview.level_percent(),
        lessons_label: format!(
            "{} of {} lessons completed",
            overview.lessons.completed, overview.lessons.total
        ),
        lessons_percent: overview.lessons.percent(),
        streak_label: match overview.streak_days {
            1 => "1 day".to_string(),
            days => format!("{days} days"),
        },
        units,
        next_unit: overview
            .next
            .as_ref()
            .map(|next| (next.unit_id.value(), next.unit_title.clone())),
        next_lesson: overview
            .next
            .as_ref()
            .and_then(|next| next.lesson_id)
            .map(|id| id.value()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonRowState {
    Completed,
    Available,
    Locked,
    ComingSoon,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonRowVm {
    pub id: u64,
    pub number: usize,
    pub title: String,
    pub category: &'static str,
    pub premium: bool,
    pub state: LessonRowState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnitVm {
    pub title: String,
    pub description: String,
    pub percent: f64,
    pub label: String,
    pub lessons: Vec<LessonRowVm>,
}

#[must_use]
pub fn map_unit(overview: &UnitOverview) -> UnitVm {
    let lessons = overview
        .lessons
        .iter()
        .enumerate()
        .map(|(index, status)| {
            let state = if !status.accessible {
                LessonRowState::Locked
            } else if status.completed {
                LessonRowState::Completed
            } else if status.playable {
                LessonRowState::Available
            } else {
                LessonRowState::ComingSoon
            };
            LessonRowVm {
                id: status.summary.id.value(),
                number: index + 1,
                title: status.summary.title.clone(),
                category: status.summary.category.label(),
                premium: status.summary.premium,
                state,
            }
        })
        .collect();

    UnitVm {
        title: overview.unit.title.clone(),
        description: overview.unit.description.clone(),
        percent: overview.progress.percent(),
        label: format!(
            "{} of {} lessons completed",
            overview.progress.completed, overview.progress.total
        ),
        lessons,
    }
}
