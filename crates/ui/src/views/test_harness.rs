use std::sync::{Arc, Mutex};
use std::time::Duration;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use lingo_core::guard::Access;
use lingo_core::model::UserId;
use lingo_core::time::fixed_clock;
use services::{
    AccountService, AppServices, AuthBackend, BackendChoice, InMemoryBackend, LessonService,
    SessionHandles,
};

use crate::context::{UiApp, build_app_context, provide_session_signals};
use crate::platform::{LinkOpenerRef, UiLinkOpener};
use crate::views::{
    AdminTabView, AdminView, DashboardView, LessonView, LoginView, Protected, SignupView,
    SubscribeView, UnitView,
};

pub const LEARNER: &str = "learner@example.com";
pub const ADMIN: &str = "admin@example.com";
pub const DEMO_PASSWORD: &str = "password123";

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
}

impl UiLinkOpener for RecordingOpener {
    fn open_url(&self, url: &str) {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }
    }
}

struct TestApp {
    services: AppServices,
    session: SessionHandles,
    links: Arc<RecordingOpener>,
}

impl UiApp for TestApp {
    fn lessons(&self) -> Arc<LessonService> {
        self.services.lessons()
    }

    fn accounts(&self) -> Arc<AccountService> {
        self.services.accounts()
    }

    fn session(&self) -> SessionHandles {
        self.session.clone()
    }

    fn link_opener(&self) -> LinkOpenerRef {
        self.links.clone()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Dashboard,
    Unit(u64),
    Lesson(u64),
    Subscribe,
    Admin(Option<String>),
    Login,
    Signup,
    Guarded(Access),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view.clone());
    provide_session_signals();
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Dashboard => rsx! { DashboardView {} },
        ViewKind::Unit(unit_id) => rsx! { UnitView { unit_id } },
        ViewKind::Lesson(lesson_id) => rsx! { LessonView { lesson_id } },
        ViewKind::Subscribe => rsx! { SubscribeView {} },
        ViewKind::Admin(None) => rsx! { AdminView {} },
        ViewKind::Admin(Some(tab)) => rsx! { AdminTabView { tab } },
        ViewKind::Login => rsx! { LoginView {} },
        ViewKind::Signup => rsx! { SignupView {} },
        ViewKind::Guarded(access) => rsx! {
            Protected { access,
                p { "secret content" }
            }
        },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub backend: InMemoryBackend,
    pub services: AppServices,
    pub session: SessionHandles,
    pub links: Arc<RecordingOpener>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(Duration::from_millis(50), self.dom.wait_for_work()).await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Drive until `needle` shows up or the attempts run out.
    pub async fn drive_until(&mut self, needle: &str) -> String {
        for _ in 0..20 {
            let html = self.render();
            if html.contains(needle) {
                return html;
            }
            self.drive_async().await;
        }
        self.render()
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.session.current_session().map(|s| s.user_id())
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Mount the session against the demo backend, signed in as `email` when
/// given, and wait for auth and plan to settle before building the DOM.
pub async fn setup_view_harness(view: ViewKind, email: Option<&str>) -> ViewHarness {
    let backend = InMemoryBackend::demo();
    if let Some(email) = email {
        backend
            .sign_in_with_password(email, DEMO_PASSWORD)
            .await
            .expect("demo sign-in");
    }
    let services = AppServices::in_memory(fixed_clock(), BackendChoice::InMemory(backend.clone()))
        .expect("services");
    let session = services.mount_session();
    wait_for_settled(&session).await;

    let links = Arc::new(RecordingOpener::default());
    let app = Arc::new(TestApp {
        services: services.clone(),
        session: session.clone(),
        links: Arc::clone(&links),
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness {
        dom,
        backend,
        services,
        session,
        links,
    }
}

pub async fn wait_for_settled(session: &SessionHandles) {
    for _ in 0..100 {
        if !session.auth.snapshot().is_loading && !session.subscription.snapshot().is_loading {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never settled");
}
