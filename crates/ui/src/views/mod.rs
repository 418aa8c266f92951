mod admin;
mod dashboard;
mod guard;
mod lesson;
mod login;
mod not_found;
mod signup;
mod state;
mod subscribe;
mod unit;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use admin::{AdminTabView, AdminView};
pub use dashboard::DashboardView;
pub use guard::Protected;
pub use lesson::LessonView;
pub use login::LoginView;
pub use not_found::NotFoundView;
pub use signup::SignupView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use subscribe::SubscribeView;
pub use unit::UnitView;
