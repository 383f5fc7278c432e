use leptos::prelude::*;

/// Totals row appended after the data rows.
///
/// The first cell carries `label`, the remaining cells come from `children`.
///
/// ```text
/// <TableTotalsRow label="Total">
///     <td class="number">{format_count(totals.request_count)}</td>
/// </TableTotalsRow>
/// ```
#[component]
pub fn TableTotalsRow(
    /// Text of the leading cell
    #[prop(into)]
    label: String,
    /// Remaining cells (td elements)
    children: Children,
) -> impl IntoView {
    view! {
        <tr class="summary-row">
            <td><strong>{label}</strong></td>
            {children()}
        </tr>
    }
}
