//! HTML Rendering
//!
//! Builds the single page of the tool: the submission form, the system information
//! banner, and once a report exists, the summary table followed by one table per
//! network. Every table shows its first page inline; later pages are fetched from
//! `/get_page_data`, which returns the rows plus fresh navigation markup produced by
//! [`render_pagination`].
//!
//! All text that originates outside the process (network and application names, the
//! submitted MAC address, error messages) passes through [`escape_html`].

use crate::models::{UsageReport, UsageTable, SUMMARY_TABLE};
use crate::pagination::{paginate, Pagination};
use std::fmt::Write;

/// Period choices offered by the selector, in display order.
pub const PERIOD_OPTIONS: [&str; 3] = ["24 Hours", "72 Hours", "1 Week"];

/// Pages either side of the current one that get a numbered link.
const PAGE_WINDOW: usize = 2;

/// Values echoed back into the form.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub mac_address: String,
    pub time_period: String,
    pub custom_interval: String,
}

#[derive(Debug, Clone)]
pub struct TableView {
    pub name: String,
    pub title: String,
    pub rows: UsageTable,
    pub pagination: Option<Pagination>,
}

impl TableView {
    fn first_page(name: &str, title: &str, table: &UsageTable) -> Self {
        let (rows, pagination) = paginate(table, 1);
        Self {
            name: name.to_string(),
            title: title.to_string(),
            rows,
            pagination,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportView {
    pub client_mac: String,
    pub summary: TableView,
    pub networks: Vec<TableView>,
}

impl ReportView {
    /// First page of the summary and of every network, networks sorted by name.
    pub fn first_pages(report: &UsageReport) -> Self {
        let networks = report
            .sorted_network_names()
            .into_iter()
            .filter_map(|name| {
                report
                    .table(name)
                    .map(|table| TableView::first_page(name, name, table))
            })
            .collect();

        Self {
            client_mac: report.client_mac.clone(),
            summary: TableView::first_page(SUMMARY_TABLE, "Summary", &report.summary),
            networks,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexView {
    pub system_info: String,
    pub error: Option<String>,
    pub form: FormValues,
    pub report: Option<ReportView>,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Navigation controls for `table`; empty when there is nothing to page through.
pub fn render_pagination(table: &str, pagination: Option<&Pagination>) -> String {
    let Some(p) = pagination else {
        return String::new();
    };

    let table = escape_html(table);
    let mut html = String::from("<ul class=\"pagination\">");

    let link = |html: &mut String, page: usize, label: &str, class: &str| {
        let _ = write!(
            html,
            "<li class=\"{}\"><a href=\"#\" class=\"page-link\" data-table=\"{}\" data-page=\"{}\">{}</a></li>",
            class, table, page, label
        );
    };

    let at_start = p.page <= p.first_page;
    let at_end = p.page >= p.last_page;

    link(&mut html, p.first_page, "&laquo;", if at_start { "disabled" } else { "" });
    link(&mut html, p.previous_page, "&lsaquo;", if at_start { "disabled" } else { "" });

    let low = p.page.saturating_sub(PAGE_WINDOW).max(p.first_page);
    let high = p.page.saturating_add(PAGE_WINDOW).min(p.last_page);
    for page in low..=high {
        link(&mut html, page, &page.to_string(), if page == p.page { "active" } else { "" });
    }

    link(&mut html, p.next_page, "&rsaquo;", if at_end { "disabled" } else { "" });
    link(&mut html, p.last_page, "&raquo;", if at_end { "disabled" } else { "" });

    let _ = write!(html, "</ul><span class=\"page-count\">Page {} of {}</span>", p.page, p.page_count);
    html
}

fn render_rows(rows: &UsageTable) -> String {
    if rows.is_empty() {
        return "<tr><td colspan=\"3\" class=\"empty\">No application usage found for this client.</td></tr>"
            .to_string();
    }

    let mut html = String::new();
    for (name, usage) in rows.iter() {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(name),
            usage.received,
            usage.sent
        );
    }
    html
}

fn render_table(view: &TableView) -> String {
    format!(
        r#"<section class="usage-table" data-table="{name}">
  <h3>{title}</h3>
  <table>
    <thead><tr><th>Application</th><th>Received (kilobytes)</th><th>Sent (kilobytes)</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
  <nav class="table-pagination">{pagination}</nav>
</section>
"#,
        name = escape_html(&view.name),
        title = escape_html(&view.title),
        rows = render_rows(&view.rows),
        pagination = render_pagination(&view.name, view.pagination.as_ref()),
    )
}

fn render_form(form: &FormValues) -> String {
    let mut options = String::new();
    for option in PERIOD_OPTIONS {
        let selected = if form.time_period == option { " selected" } else { "" };
        let _ = write!(options, "<option value=\"{0}\"{1}>{0}</option>", option, selected);
    }

    format!(
        r#"<form method="post" action="/display" class="query-form">
  <label>Client MAC address
    <input type="text" name="mac_address" required placeholder="AA:BB:CC:DD:EE:FF" value="{mac}">
  </label>
  <label>Time period
    <select name="time_period">{options}</select>
  </label>
  <label>Custom interval (hours)
    <input type="number" min="1" name="custom-interval" value="{custom}">
  </label>
  <button type="submit">Get usage</button>
</form>
"#,
        mac = escape_html(&form.mac_address),
        options = options,
        custom = escape_html(&form.custom_interval),
    )
}

fn render_report(report: &ReportView) -> String {
    let mut html = format!(
        r#"<div class="report-header">
  <h2>Application usage for {mac}</h2>
  <a class="download" href="/download">Download spreadsheet</a>
</div>
"#,
        mac = escape_html(&report.client_mac)
    );
    html.push_str(&render_table(&report.summary));
    for network in &report.networks {
        html.push_str(&render_table(network));
    }
    html
}

const PAGE_SCRIPT: &str = r#"<script>
document.addEventListener('click', async (event) => {
  const link = event.target.closest('.page-link');
  if (!link) return;
  event.preventDefault();
  if (link.parentElement.classList.contains('disabled')) return;
  const table = link.dataset.table;
  const params = new URLSearchParams({ network: table, page: link.dataset.page });
  const response = await fetch('/get_page_data?' + params.toString());
  if (!response.ok) return;
  const [rows, pagination] = await response.json();
  const section = [...document.querySelectorAll('.usage-table')].find((s) => s.dataset.table === table);
  if (!section) return;
  const body = section.querySelector('tbody');
  body.replaceChildren();
  for (const [name, [received, sent]] of Object.entries(rows)) {
    const row = body.insertRow();
    for (const value of [name, received, sent]) row.insertCell().textContent = value;
  }
  section.querySelector('.table-pagination').innerHTML = pagination;
});
</script>
"#;

const PAGE_STYLE: &str = r#"<style>
body { font-family: sans-serif; margin: 2rem; }
.banner { color: #555; font-size: 0.9rem; }
.error { background: #fdecea; color: #8a1c1c; padding: 0.75rem; border-radius: 4px; }
.query-form label { display: inline-block; margin-right: 1rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: 0.5rem; }
th, td { border: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }
.pagination { list-style: none; display: inline-flex; gap: 0.25rem; padding: 0; }
.pagination .active a { font-weight: bold; }
.pagination .disabled a { color: #aaa; pointer-events: none; }
.empty { color: #777; font-style: italic; }
</style>
"#;

pub fn render_index(view: &IndexView) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Meraki Client App Usage</title>\n",
    );
    html.push_str(PAGE_STYLE);
    html.push_str("</head>\n<body>\n<h1>Meraki Client App Usage</h1>\n");
    let _ = writeln!(html, "<p class=\"banner\">{}</p>", escape_html(&view.system_info));

    if let Some(error) = &view.error {
        let _ = writeln!(html, "<div class=\"error\">{}</div>", escape_html(error));
    }

    html.push_str(&render_form(&view.form));

    if let Some(report) = &view.report {
        html.push_str(&render_report(report));
    }

    html.push_str(PAGE_SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}
