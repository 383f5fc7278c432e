use crate::dashboards::AdStatsDashboard;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    view! {
        <AdStatsDashboard />
    }
}
