use dioxus::prelude::*;

use lingo_core::model::SubscriptionTier;

use crate::context::use_subscription;

const SUPPORT_MAIL: &str = "mailto:support@tagaloglearn.com?subject=Subscribe%20to%20Premium";

#[derive(Clone, Debug, PartialEq, Eq)]
struct Plan {
    tier: SubscriptionTier,
    price: &'static str,
    popular: bool,
    features: &'static [&'static str],
}

const PLANS: [Plan; 2] = [
    Plan {
        tier: SubscriptionTier::Basic,
        price: "$4.99",
        popular: false,
        features: &[
            "Access to all basic lessons",
            "Ad-free experience",
            "Practice exercises",
            "Progress tracking",
            "Limited access to premium content",
        ],
    },
    Plan {
        tier: SubscriptionTier::Premium,
        price: "$9.99",
        popular: true,
        features: &[
            "All Basic plan features",
            "Full access to all premium content",
            "Pronunciation feedback",
            "Offline learning mode",
            "Personalized learning path",
            "Priority support",
        ],
    },
];

const FAQ: [(&str, &str); 3] = [
    (
        "Can I change my plan later?",
        "Yes, you can upgrade or downgrade your plan at any time. Contact our support team to make changes to your subscription.",
    ),
    (
        "How do I cancel my subscription?",
        "To cancel your subscription, please contact our support team. Your access will remain active until the end of the current billing period.",
    ),
    (
        "Is there a free trial?",
        "We offer a limited free plan so you can explore the basics of the platform before committing to a paid subscription.",
    ),
];

#[component]
pub fn SubscribeView() -> Element {
    let subscription = use_subscription();
    let snapshot = subscription();
    let paid_tier = snapshot
        .tier
        .filter(|tier| *tier != SubscriptionTier::Free);

    rsx! {
        div { class: "page subscribe",
            header { class: "page-header",
                h1 { "Choose Your Plan" }
                p { "Unlock the full potential of your Tagalog learning journey" }
            }

            if snapshot.is_loading {
                p { "Loading..." }
            } else if let Some(tier) = paid_tier {
                div { class: "card current-plan",
                    h2 { "You're currently on the {tier.display_name()} plan" }
                    p { "Enjoy your premium benefits and happy learning!" }
                }
            } else {
                div { class: "plan-grid",
                    for plan in PLANS {
                        PlanCard { key: "{plan.tier.as_str()}", plan }
                    }
                }
            }

            section { class: "card faq",
                h2 { "Frequently Asked Questions" }
                for (question, answer) in FAQ {
                    div { class: "faq-item",
                        h3 { "{question}" }
                        p { "{answer}" }
                    }
                }
            }
        }
    }
}

#[component]
fn PlanCard(plan: Plan) -> Element {
    let class = if plan.popular { "card plan popular" } else { "card plan" };
    let cta = if plan.popular { "btn-primary" } else { "btn-secondary" };
    rsx! {
        div { class,
            if plan.popular {
                div { class: "ribbon", "Most Popular" }
            }
            h3 { "{plan.tier.display_name()}" }
            div { class: "price",
                span { class: "amount", "{plan.price}" }
                span { class: "period", "/month" }
            }
            ul { class: "features",
                for feature in plan.features {
                    li { "{feature}" }
                }
            }
            a { class: cta, href: SUPPORT_MAIL, "Contact Support to Subscribe" }
        }
    }
}
