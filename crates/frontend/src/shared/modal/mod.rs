use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;

/// Error dialog, visible while `message` is `Some`.
///
/// Closes on the `.close` button, on a click on the backdrop and on Escape.
#[component]
pub fn ErrorModal(
    /// Message shown in `#error-message`
    #[prop(into)]
    message: Signal<Option<String>>,
    /// Callback when modal should close
    on_close: Callback<()>,
) -> impl IntoView {
    // Handle Escape key; installed once for the lifetime of the page
    Effect::new(move |_| {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() {
                if keyboard_event.key() == "Escape" {
                    on_close.run(());
                }
            }
        }) as Box<dyn FnMut(_)>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    });

    let handle_backdrop_click = move |_| {
        on_close.run(());
    };

    // Clicks inside the dialog must not reach the backdrop
    let stop_propagation = move |ev: ev::MouseEvent| {
        ev.stop_propagation();
    };

    let handle_close = move |_| {
        on_close.run(());
    };

    view! {
        <div
            id="error-modal"
            class="modal-overlay"
            style:display={move || if message.get().is_some() { "flex" } else { "none" }}
            on:click=handle_backdrop_click
        >
            <div class="modal" on:click=stop_propagation>
                <div class="modal-header">
                    <h2 class="modal-title">"Error"</h2>
                    <span class="close" on:click=handle_close>"×"</span>
                </div>
                <div class="modal-body">
                    <p id="error-message">{move || message.get().unwrap_or_default()}</p>
                </div>
            </div>
        </div>
    }
}
