//! The dashboard page.
//!
//! Two multi-select dropdowns and four chart slots. The browser fetches
//! `/api/options` once, then `/api/update` on every change, and hands the
//! views to plotly.js. Each fetch takes a ticket when the selection changes;
//! replies whose ticket is older than the last one drawn are dropped, so
//! rapid changes settle on the latest selection whatever order they arrive in.

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
<style>
  body { font-family: sans-serif; margin: 1.5rem; }
  .controls { display: flex; gap: 2rem; margin-bottom: 1rem; }
  .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
  select { min-width: 12rem; }
</style>
</head>
<body>
<h1>{{TITLE}}</h1>
<div class="controls">
  <label>Products<br><select id="product-select" multiple size="3"></select></label>
  <label>Regions<br><select id="region-select" multiple size="4"></select></label>
</div>
<div class="grid">
  <div id="sales-over-time"></div>
  <div id="sales-by-product"></div>
  <div id="sales-by-region"></div>
  <div id="sales-heatmap"></div>
</div>
<script>
let issued = 0;
let drawn = 0;

function fill(select, labels) {
  for (const label of labels) {
    const opt = document.createElement("option");
    opt.value = label;
    opt.textContent = label;
    opt.selected = true;
    select.appendChild(opt);
  }
  select.addEventListener("change", refresh);
}

function chosen(select) {
  return Array.from(select.selectedOptions).map(o => o.value);
}

async function refresh() {
  const ticket = ++issued;
  const params = new URLSearchParams();
  chosen(document.getElementById("product-select")).forEach(p => params.append("product", p));
  chosen(document.getElementById("region-select")).forEach(r => params.append("region", r));
  const resp = await fetch("/api/update?" + params.toString());
  const v = await resp.json();
  if (ticket < drawn) return;
  drawn = ticket;
  draw(v);
}

function draw(v) {
  Plotly.react("sales-over-time", [{
    x: v.filtered.map(r => r.date), y: v.filtered.map(r => r.sales),
    type: "scatter", mode: "lines+markers"
  }], { title: "Sales Over Time" });
  Plotly.react("sales-by-product", [{
    x: Object.keys(v.product_totals), y: Object.values(v.product_totals), type: "bar"
  }], { title: "Sales by Product" });
  Plotly.react("sales-by-region", [{
    labels: Object.keys(v.region_totals), values: Object.values(v.region_totals), type: "pie"
  }], { title: "Sales by Region" });
  Plotly.react("sales-heatmap", [{
    z: v.heatmap.cells, x: v.heatmap.regions, y: v.heatmap.products, type: "heatmap"
  }], { title: "Product vs Region" });
}

fetch("/api/options").then(r => r.json()).then(opts => {
  fill(document.getElementById("product-select"), opts.products);
  fill(document.getElementById("region-select"), opts.regions);
  refresh();
});
</script>
</body>
</html>
"#;

pub fn render(title: &str) -> String {
    TEMPLATE.replace("{{TITLE}}", &escape_html(title))
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_escaped() {
        let html = render("Sales <Q1> & \"more\"");
        assert!(html.contains("<title>Sales &lt;Q1&gt; &amp; &quot;more&quot;</title>"));
        assert!(!html.contains("{{TITLE}}"));
    }

    #[test]
    fn test_page_wires_all_views() {
        let html = render("x");
        for id in ["sales-over-time", "sales-by-product", "sales-by-region", "sales-heatmap"] {
            assert!(html.contains(id), "missing {}", id);
        }
        assert!(html.contains("/api/update?"));
    }

    #[test]
    fn test_ticket_taken_before_fetch() {
        let html = render("x");
        let ticket = html.find("const ticket = ++issued;").unwrap();
        let fetch = html.find("await fetch(\"/api/update?\"").unwrap();
        assert!(ticket < fetch);
        assert!(html.contains("if (ticket < drawn) return;"));
        assert!(!html.contains("v.seq"));
    }
}
