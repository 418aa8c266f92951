use std::time::Duration;

use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use lingo_core::model::{Credentials, OAuthProvider};

use crate::context::{AppContext, use_auth};
use crate::routes::Route;

/// How long the browser has to come back from the consent page.
const OAUTH_TIMEOUT: Duration = Duration::from_secs(300);

#[component]
pub fn LoginView() -> Element {
    let ctx = use_context::<AppContext>();
    let auth = use_auth();
    let navigator = use_navigator();

    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    // Leave only after the new session has reached the auth snapshot, so the
    // guarded page never sees a stale signed-out state.
    use_effect(move || {
        let snapshot = auth.read();
        if !snapshot.is_loading && snapshot.is_authenticated() {
            let _ = navigator.replace(Route::Dashboard {});
        }
    });

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let email_value = email.read().trim().to_string();
        let password_value = password.read().clone();
        if email_value.is_empty() || password_value.is_empty() {
            error.set(Some("Email and password are required".into()));
            return;
        }
        let provider = ctx.provider();
        busy.set(true);
        error.set(None);
        spawn(async move {
            let result = provider
                .sign_in(Credentials::EmailPassword {
                    email: email_value,
                    password: password_value,
                })
                .await;
            if let Err(err) = result {
                error.set(Some(err.to_string()));
            }
            busy.set(false);
        });
    };

    rsx! {
        div { class: "auth-page",
            div { class: "auth-card",
                h1 { "Welcome Back" }
                p { class: "subtitle", "Sign in to continue learning Tagalog" }

                if let Some(message) = error() {
                    div { class: "form-error", "{message}" }
                }

                GoogleButton { disabled: busy(), on_error: move |message: String| error.set(Some(message)) }

                div { class: "divider", span { "Or continue with email" } }

                form { class: "auth-form", onsubmit: on_submit,
                    label { r#for: "email", "Email Address" }
                    input {
                        id: "email",
                        r#type: "email",
                        placeholder: "you@example.com",
                        value: "{email}",
                        oninput: move |evt| email.set(evt.value()),
                    }
                    label { r#for: "password", "Password" }
                    input {
                        id: "password",
                        r#type: "password",
                        value: "{password}",
                        oninput: move |evt| password.set(evt.value()),
                    }
                    button { class: "btn-primary", r#type: "submit", disabled: busy(),
                        if busy() { "Signing in..." } else { "Sign In" }
                    }
                }

                p { class: "auth-switch",
                    "Don't have an account? "
                    Link { to: Route::Signup {}, "Sign up" }
                }
            }
        }
    }
}

/// "Continue with Google". Opens the consent page in the system browser and
/// waits for it to redirect back to a loopback address; the session then
/// arrives through the identity service's notification.
#[component]
pub(crate) fn GoogleButton(disabled: bool, on_error: EventHandler<String>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut pending_url = use_signal(|| None::<String>);

    let on_click = move |_: MouseEvent| {
        let provider = ctx.provider();
        let links = ctx.links();
        spawn(async move {
            let result = provider
                .sign_in_with_browser(
                    OAuthProvider::Google,
                    |url: &str| {
                        links.open_url(url);
                        pending_url.set(Some(url.to_string()));
                    },
                    OAUTH_TIMEOUT,
                )
                .await;
            pending_url.set(None);
            if let Err(err) = result {
                on_error.call(err.to_string());
            }
        });
    };

    rsx! {
        button { class: "btn-google", r#type: "button", disabled, onclick: on_click,
            "Continue with Google"
        }
        if let Some(url) = pending_url() {
            p { class: "oauth-pending",
                "Finish signing in from your browser: "
                code { "{url}" }
            }
        }
    }
}
