use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use lingo_core::model::{FormError, SignUpForm};
use services::RegistrationError;

use crate::context::{AppContext, use_auth};
use crate::routes::Route;
use crate::views::login::GoogleButton;
use crate::vm::{SignUpField, field_error};

#[component]
pub fn SignupView() -> Element {
    let ctx = use_context::<AppContext>();
    let auth = use_auth();
    let navigator = use_navigator();

    let mut form = use_signal(SignUpForm::default);
    let mut field_errors = use_signal(Vec::<FormError>::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);
    let mut awaiting_confirmation = use_signal(|| false);

    use_effect(move || {
        let snapshot = auth.read();
        if !snapshot.is_loading && snapshot.is_authenticated() {
            let _ = navigator.replace(Route::Dashboard {});
        }
    });

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let submitted = form.read().clone();
        let problems = submitted.validate();
        if !problems.is_empty() {
            field_errors.set(problems);
            return;
        }
        field_errors.set(Vec::new());
        error.set(None);
        busy.set(true);

        let accounts = ctx.accounts();
        spawn(async move {
            match accounts.register(&submitted).await {
                Ok(Some(_)) => {}
                Ok(None) => awaiting_confirmation.set(true),
                Err(RegistrationError::Invalid(problems)) => field_errors.set(problems),
                Err(err) => error.set(Some(err.to_string())),
            }
            busy.set(false);
        });
    };

    if awaiting_confirmation() {
        return rsx! {
            div { class: "auth-page",
                div { class: "auth-card",
                    h1 { "Check your email" }
                    p { "We sent a confirmation link to {form.read().email}. Confirm it, then sign in." }
                    Link { class: "btn-primary", to: Route::Login {}, "Go to sign in" }
                }
            }
        };
    }

    let errors = field_errors.read().clone();

    rsx! {
        div { class: "auth-page",
            div { class: "auth-card",
                h1 { "Create Your Account" }
                p { class: "subtitle", "Start your Tagalog learning journey today" }

                if let Some(message) = error() {
                    div { class: "form-error", "{message}" }
                }

                GoogleButton { disabled: busy(), on_error: move |message: String| error.set(Some(message)) }

                div { class: "divider", span { "Or continue with email" } }

                form { class: "auth-form", onsubmit: on_submit,
                    FormField {
                        id: "fullName",
                        label: "Full Name",
                        kind: "text",
                        placeholder: "Juan dela Cruz",
                        value: form.read().full_name.clone(),
                        error: field_error(&errors, SignUpField::FullName),
                        on_input: move |value: String| form.write().full_name = value,
                    }
                    FormField {
                        id: "email",
                        label: "Email Address",
                        kind: "email",
                        placeholder: "you@example.com",
                        value: form.read().email.clone(),
                        error: field_error(&errors, SignUpField::Email),
                        on_input: move |value: String| form.write().email = value,
                    }
                    FormField {
                        id: "password",
                        label: "Password",
                        kind: "password",
                        placeholder: "",
                        value: form.read().password.clone(),
                        error: field_error(&errors, SignUpField::Password),
                        on_input: move |value: String| form.write().password = value,
                    }
                    FormField {
                        id: "confirmPassword",
                        label: "Confirm Password",
                        kind: "password",
                        placeholder: "",
                        value: form.read().confirm_password.clone(),
                        error: field_error(&errors, SignUpField::ConfirmPassword),
                        on_input: move |value: String| form.write().confirm_password = value,
                    }
                    button { class: "btn-primary", r#type: "submit", disabled: busy(),
                        if busy() { "Creating account..." } else { "Create Account" }
                    }
                }

                p { class: "auth-switch",
                    "Already have an account? "
                    Link { to: Route::Login {}, "Sign in" }
                }
            }
        }
    }
}

#[component]
fn FormField(
    id: &'static str,
    label: &'static str,
    kind: &'static str,
    placeholder: &'static str,
    value: String,
    error: Option<String>,
    on_input: EventHandler<String>,
) -> Element {
    rsx! {
        div { class: "form-field",
            label { r#for: id, "{label}" }
            input {
                id,
                r#type: kind,
                placeholder,
                value: "{value}",
                oninput: move |evt| on_input.call(evt.value()),
            }
            if let Some(message) = error {
                p { class: "field-error", "{message}" }
            }
        }
    }
}
