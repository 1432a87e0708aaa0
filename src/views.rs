//! Server-rendered pages. Charts are drawn in the browser by Plotly.js from the
//! figure JSON embedded in each page.

const STYLE: &str = r#"
    body { background: #16161d; color: white; font-family: Arial, sans-serif; margin: 0; }
    header { display: flex; align-items: center; justify-content: space-between; padding: 16px 32px; }
    header h1 { color: #E6B11B; font-size: 24px; margin: 0; }
    nav a { color: white; margin-left: 16px; text-decoration: none; }
    nav a:hover { color: #E6B11B; }
    form { padding: 0 32px; }
    select, button { background: #24242e; color: white; border: 1px solid #E6B11B; padding: 6px 10px; }
    .chart { height: 420px; margin: 16px 32px; }
    .error { padding: 32px; }
"#;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encodes `raw` for use as one URL path segment.
pub fn encode_segment(raw: &str) -> String {
    // form encoding writes a space as '+', which a path keeps literally
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// JSON is embedded inside a <script> element; a literal "</" would end it.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn asset_selector(current: &str, assets: &[String]) -> String {
    let options: String = assets
        .iter()
        .map(|asset| {
            let selected = if asset == current { " selected" } else { "" };
            format!(
                r#"<option value="{value}"{selected}>{value}</option>"#,
                value = escape_html(asset),
                selected = selected
            )
        })
        .collect();

    format!(
        r#"<form method="post">
    <select name="comp_select">{options}</select>
    <button type="submit">Show</button>
</form>"#,
        options = options
    )
}

fn page(title: &str, asset: &str, body: &str, plotly_src: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="{plotly}"></script>
    <style>{style}</style>
</head>
<body>
<header>
    <h1>{title}</h1>
    <nav>
        <a href="/graph/{path}">Charts</a>
        <a href="/graph/{path}/predict">Prediction</a>
    </nav>
</header>
{body}
</body>
</html>"#,
        title = escape_html(title),
        plotly = escape_html(plotly_src),
        style = STYLE,
        path = encode_segment(asset),
        body = body
    )
}

fn chart_block(id: &str, figure_json: &str) -> String {
    format!(
        r#"<div id="{id}" class="chart"></div>
<script>
    (function () {{
        var figure = {figure};
        Plotly.newPlot("{id}", figure.data, figure.layout, {{responsive: true}});
    }})();
</script>"#,
        id = id,
        figure = script_safe(figure_json)
    )
}

/// Browsing page: open, marketcap and volume charts for one asset
pub fn graph_page(asset: &str, assets: &[String], figures: &[String], plotly_src: &str) -> String {
    let mut body = asset_selector(asset, assets);
    for (i, figure) in figures.iter().enumerate() {
        body.push_str(&chart_block(&format!("chart-{}", i), figure));
    }
    page(&format!("{} market data", asset), asset, &body, plotly_src)
}

/// Prediction page: train/test actuals against both model forecasts
pub fn predict_page(asset: &str, assets: &[String], figure: &str, plotly_src: &str) -> String {
    let mut body = asset_selector(asset, assets);
    body.push_str(&chart_block("prediction", figure));
    page(&format!("{} prediction", asset), asset, &body, plotly_src)
}

pub fn error_page(status: u16, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Error {status}</title><style>{style}</style></head>
<body>
<div class="error">
    <h1>Error {status}</h1>
    <p>{message}</p>
    <p><a href="/" style="color: #E6B11B">Back to charts</a></p>
</div>
</body>
</html>"#,
        status = status,
        style = STYLE,
        message = escape_html(message)
    )
}
