mod admin_vm;
mod dashboard_vm;
mod lesson_vm;
mod signup_vm;

pub use admin_vm::{
    AdminLessonRow, AdminTab, AdminUnitRow, AdminVm, CatalogStats, map_admin,
};
pub use dashboard_vm::{
    DashboardVm, LessonRowVm, LessonRowState, UnitCardVm, UnitVm, map_dashboard, map_unit,
};
pub use lesson_vm::{
    LessonIntent, LessonOutcome, LessonVm, OptionMark, QuizOptionVm, StepVm, start_lesson,
};
pub use signup_vm::{SignUpField, field_error, field_of};
