mod auth;
mod ids;
mod lesson;
mod profile;
mod unit;

pub use auth::{
    looks_like_email, AuthChange, AuthEvent, AuthSession, AuthSnapshot, AuthUser, Credentials,
    FormError, OAuthProvider, SignInOutcome, SignUpForm, SubscriptionSnapshot, MIN_PASSWORD_LEN,
};
pub use ids::{LessonId, ParseIdError, UnitId, UserId};
pub use lesson::{Lesson, LessonError, Step, StepKind, VocabularyEntry};
pub use profile::{NewProfile, Profile, Role, SubscriptionTier};
pub use unit::{LessonCategory, LessonSummary, Unit, UnitProgress};
