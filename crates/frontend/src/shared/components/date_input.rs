use leptos::prelude::*;

/// Native date picker; `value`, `min` and `max` are yyyy-mm-dd strings
#[component]
pub fn DateInput(
    /// ID of the input element
    #[prop(into)]
    id: String,
    /// The date value in yyyy-mm-dd format, empty for no date
    #[prop(into)]
    value: Signal<String>,
    /// Callback when the date changes (receives yyyy-mm-dd format)
    on_change: impl Fn(String) + 'static,
    /// Earliest selectable date
    #[prop(optional, into)]
    min: MaybeProp<String>,
    /// Latest selectable date
    #[prop(optional, into)]
    max: MaybeProp<String>,
) -> impl IntoView {
    view! {
        <input
            type="date"
            id=id
            prop:value=value
            min=move || min.get()
            max=move || max.get()
            on:input=move |ev| {
                on_change(event_target_value(&ev));
            }
            style="padding: 6px 8px; border: 1px solid #ced4da; border-radius: 4px; font-size: 0.875rem; background: #fff; width: 140px;"
        />
    }
}
