use chrono::{Local, NaiveDate};
use contracts::dashboards::d400_ad_stats::{DataRow, FilterOptions, GroupBy, SortOrder};
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::{Button, ButtonAppearance, Spinner};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;

use super::view_model::{
    ad_name_cell, ad_options, band_classes, callback_sent_options, count_cell, count_label,
    overlay_display, plain_options, rate_cell, text_cell, Totals, TABLE_COLUMNS,
};
use crate::dashboards::d400_ad_stats::api;
use crate::dashboards::d400_ad_stats::state::{FilterValues, QueryTracker};
use crate::shared::components::date_input::DateInput;
use crate::shared::components::table::format_percent;
use crate::shared::components::table_totals_row::TableTotalsRow;
use crate::shared::components::ui::Select;
use crate::shared::date_utils::format_clock;
use crate::shared::modal::ErrorModal;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Ad statistics dashboard: filter bar, grouped metrics table with totals
#[component]
pub fn AdStatsDashboard() -> impl IntoView {
    let filters = RwSignal::new(FilterValues::default());
    let options = RwSignal::new(FilterOptions::default());
    let rows = RwSignal::new(Vec::<DataRow>::new());
    let error = RwSignal::new(None::<String>);
    let clock = RwSignal::new(format_clock(&Local::now().naive_local()));

    // Requests in flight; the overlay stays up while any is pending
    let pending = RwSignal::new(0u32);
    let tracker = StoredValue::new(QueryTracker::default());

    let query_data = move |group_by: GroupBy, order: SortOrder| {
        let query = filters.with_untracked(|f| f.to_query(group_by, order));
        let mut query_id = 0;
        tracker.update_value(|t| query_id = t.issue());
        pending.update(|n| *n += 1);

        spawn_local(async move {
            let result = api::get_data(&query).await;
            if tracker.with_value(|t| t.is_latest(query_id)) {
                match result {
                    Ok(response) => {
                        log::debug!("D400 Ad stats: query {} returned {} rows", query_id, response.count);
                        rows.set(response.data);
                    }
                    Err(e) => {
                        log::error!("D400 Ad stats: query {} failed: {}", query_id, e);
                        error.set(Some(format!("Failed to query data: {}", e)));
                    }
                }
            } else {
                log::debug!("D400 Ad stats: dropping stale result of query {}", query_id);
            }
            pending.update(|n| *n = n.saturating_sub(1));
        });
    };

    let load_filter_options = move || {
        pending.update(|n| *n += 1);
        spawn_local(async move {
            match api::get_filter_options().await {
                Ok(loaded) => {
                    filters.update(|f| f.retain_known_selections(&loaded));
                    options.set(loaded);
                }
                Err(e) => {
                    log::error!("D400 Ad stats: failed to load filter options: {}", e);
                    error.set(Some(format!("Failed to load filter options: {}", e)));
                }
            }

            let range = options.with_untracked(|o| o.date_range.clone());
            filters.update(|f| f.apply_default_window(&range, today()));
            pending.update(|n| *n = n.saturating_sub(1));
            query_data(GroupBy::AdId, SortOrder::Desc);
        });
    };

    let reset_filters = move || {
        let range = options.with_untracked(|o| o.date_range.clone());
        filters.update(|f| f.reset(&range, today()));
        query_data(GroupBy::AdId, SortOrder::Desc);
    };

    // Initial load (once)
    Effect::new(move |_| {
        load_filter_options();
    });

    // Enter anywhere runs the default query
    Effect::new(move |_| {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() {
                if keyboard_event.key() == "Enter" {
                    query_data(GroupBy::AdId, SortOrder::Desc);
                }
            }
        }) as Box<dyn FnMut(_)>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    });

    // Header clock
    Effect::new(move |_| {
        gloo_timers::callback::Interval::new(1_000, move || {
            clock.set(format_clock(&Local::now().naive_local()));
        })
        .forget();
    });

    let select_value = move |pick: fn(&FilterValues) -> &String| {
        Signal::derive(move || filters.with(|f| pick(f).clone()))
    };

    view! {
        <div id="d400_ad_stats--dashboard" class="page page--wide d400-dashboard">
            <div class="page__header">
                <div class="page__header-left">
                    <h1 class="page__title">"Ad Statistics"</h1>
                </div>
                <div class="page__header-right">
                    <span id="current-time" class="current-time">{move || clock.get()}</span>
                </div>
            </div>

            <div class="filter-panel">
                <div class="filter-panel-content">
                    <div class="form__group">
                        <label class="form__label" for="start_date">"Start date"</label>
                        <DateInput
                            id="start_date"
                            value=select_value(|f| &f.start_date)
                            min=Signal::derive(move || options.with(|o| o.date_range.min_date.clone()))
                            on_change=move |v| filters.update(|f| f.start_date = v)
                        />
                    </div>
                    <div class="form__group">
                        <label class="form__label" for="end_date">"End date"</label>
                        <DateInput
                            id="end_date"
                            value=select_value(|f| &f.end_date)
                            max=Signal::derive(move || options.with(|o| o.date_range.max_date.clone()))
                            on_change=move |v| filters.update(|f| f.end_date = v)
                        />
                    </div>
                    <Select
                        id="ds_id"
                        label="DS"
                        value=select_value(|f| &f.ds_id)
                        options=Signal::derive(move || options.with(|o| plain_options(&o.ds_ids)))
                        on_change=Callback::new(move |v| filters.update(|f| f.ds_id = v))
                    />
                    <Select
                        id="ad_id"
                        label="Ad"
                        value=select_value(|f| &f.ad_id)
                        options=Signal::derive(move || options.with(ad_options))
                        on_change=Callback::new(move |v| filters.update(|f| f.ad_id = v))
                    />
                    <Select
                        id="channel_id"
                        label="Channel"
                        value=select_value(|f| &f.channel_id)
                        options=Signal::derive(move || options.with(|o| plain_options(&o.channel_ids)))
                        on_change=Callback::new(move |v| filters.update(|f| f.channel_id = v))
                    />
                    <Select
                        id="up_id"
                        label="Upstream"
                        value=select_value(|f| &f.up_id)
                        options=Signal::derive(move || options.with(|o| plain_options(&o.up_ids)))
                        on_change=Callback::new(move |v| filters.update(|f| f.up_id = v))
                    />
                    <Select
                        id="is_callback_sent"
                        label="Callback"
                        value=select_value(|f| &f.is_callback_sent)
                        options=Signal::derive(move || options.with(|o| callback_sent_options(&o.callback_sent_options)))
                        on_change=Callback::new(move |v| filters.update(|f| f.is_callback_sent = v))
                    />

                    <div class="filter-panel-actions">
                        <Button
                            attr:id="query-btn"
                            appearance=ButtonAppearance::Primary
                            on_click=move |_| query_data(GroupBy::AdId, SortOrder::Desc)
                        >
                            "Query"
                        </Button>
                        <Button
                            attr:id="reset-btn"
                            appearance=ButtonAppearance::Secondary
                            on_click=move |_| reset_filters()
                        >
                            "Reset"
                        </Button>
                        <Button
                            attr:id="refresh-btn"
                            appearance=ButtonAppearance::Subtle
                            on_click=move |_| load_filter_options()
                        >
                            "Refresh"
                        </Button>
                    </div>
                </div>
            </div>

            <div class="page-content">
                <div class="table-container">
                    <table id="data-table" class="data-table">
                        <thead>
                            <tr>
                                <th>"Date"</th>
                                <th>"Upstream"</th>
                                <th>"DS"</th>
                                <th>"Ad ID"</th>
                                <th>"Ad name"</th>
                                <th>"Channel"</th>
                                <th>"Requests"</th>
                                <th>"Succeeded"</th>
                                <th>"Failed"</th>
                                <th>"Activated"</th>
                                <th>"Registered"</th>
                                <th>"Paid"</th>
                                <th>"Callbacks"</th>
                                <th>"Callbacks failed"</th>
                                <th>"Callback rate"</th>
                                <th>"Updated at"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {move || rows.with(|r| options.with(|o| table_body(r, o)))}
                        </tbody>
                    </table>
                </div>
                <div class="table-footer">
                    <span id="data-count">{move || rows.with(|r| count_label(r.len()))}</span>
                </div>
            </div>

            <div
                id="loading"
                class="loading-overlay"
                style:display={move || overlay_display(pending.get() > 0)}
            >
                <Spinner />
            </div>

            <ErrorModal message=error on_close=Callback::new(move |_| error.set(None)) />
        </div>
    }
}

fn table_body(rows: &[DataRow], options: &FilterOptions) -> AnyView {
    if rows.is_empty() {
        return view! {
            <tr>
                <td colspan=TABLE_COLUMNS.to_string() class="no-data">"No data"</td>
            </tr>
        }
        .into_any();
    }

    let totals = Totals::from_rows(rows);
    let body = rows
        .iter()
        .zip(band_classes(rows))
        .map(|(row, class)| data_row(row, class, options))
        .collect_view();

    view! {
        {body}
        <TableTotalsRow label="Total">
            <td>"-"</td>
            <td>"-"</td>
            <td>"-"</td>
            <td>"-"</td>
            <td>"-"</td>
            <td class="number"><strong>{count_cell(totals.request_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.request_success_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.request_failed_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.activated_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.registered_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.paid_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.total_callback_count)}</strong></td>
            <td class="number"><strong>{count_cell(totals.callback_failed_count)}</strong></td>
            <td class="number"><strong>{format_percent(totals.callback_rate())}</strong></td>
            <td>"-"</td>
        </TableTotalsRow>
    }
    .into_any()
}

fn data_row(row: &DataRow, class: &'static str, options: &FilterOptions) -> impl IntoView {
    view! {
        <tr class=class>
            <td>{text_cell(row.date_day.as_deref())}</td>
            <td>{text_cell(row.up_id.as_deref())}</td>
            <td>{text_cell(row.ds_id.as_deref())}</td>
            <td>{text_cell(row.ad_id.as_deref())}</td>
            <td>{ad_name_cell(options, row.ad_id.as_deref())}</td>
            <td>{text_cell(row.channel_id.as_deref())}</td>
            <td class="number">{count_cell(row.request_count)}</td>
            <td class="number">{count_cell(row.request_success_count)}</td>
            <td class="number">{count_cell(row.request_failed_count)}</td>
            <td class="number">{count_cell(row.activated_count)}</td>
            <td class="number">{count_cell(row.registered_count)}</td>
            <td class="number">{count_cell(row.paid_count)}</td>
            <td class="number">{count_cell(row.total_callback_count)}</td>
            <td class="number">{count_cell(row.callback_failed_count)}</td>
            <td class="number">{rate_cell(row.callback_rate)}</td>
            <td>{text_cell(row.updated_at.as_deref())}</td>
        </tr>
    }
}
