use crate::model::{ChartLayout, LayoutNode, MindmapLayout};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Root `<svg>` id, so several diagrams can share a page.
    pub diagram_id: Option<String>,
    pub font_family: String,
    /// Fill per depth, cycling. Depth 0 is the root.
    pub depth_fills: Vec<String>,
    pub node_stroke: String,
    pub edge_stroke: String,
    pub text_color: String,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            depth_fills: ["#ECECFF", "#FFF4DD", "#E3F5E1", "#FDE2E4", "#E2ECF9", "#F3E8FF"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            node_stroke: "#9370DB".to_string(),
            edge_stroke: "#8A8A8A".to_string(),
            text_color: "#333333".to_string(),
        }
    }
}

pub(crate) fn fmt(v: f64) -> String {
    // Round-trippable decimal without `-0` or float noise from layout arithmetic.
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

/// Path coordinates with at most three fractional digits, like d3-path.
fn fmt_path(v: f64) -> String {
    if !v.is_finite() || v.abs() < 0.0005 {
        return "0".to_string();
    }
    let r = ((v * 1000.0) + 0.5).floor() / 1000.0;
    let mut s = format!("{r:.3}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" { "0".to_string() } else { s }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn open_svg(out: &mut String, id: &str, class: &str, width: f64, height: f64, role: &str) {
    let _ = write!(
        out,
        r#"<svg id="{id}" xmlns="http://www.w3.org/2000/svg" class="{class}" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="graphics-document document" aria-roledescription="{role}">"#,
        id = escape_xml(id),
        w = fmt(width),
        h = fmt(height),
    );
}

fn write_node(out: &mut String, n: &LayoutNode, options: &SvgRenderOptions, font_size: f64) {
    let fill = options
        .depth_fills
        .get(n.depth % options.depth_fills.len().max(1))
        .map_or("#ECECFF", String::as_str);
    let class = if n.collapsed {
        "node collapsed"
    } else {
        "node"
    };
    let _ = write!(
        out,
        r#"<g class="{class}" data-id="{id}" data-depth="{depth}" transform="translate({x}, {y})">"#,
        id = n.id,
        depth = n.depth,
        x = fmt(n.x),
        y = fmt(n.y),
    );
    let _ = write!(
        out,
        r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="6" ry="6" fill="{fill}" stroke="{stroke}" stroke-width="1"/>"#,
        x = fmt(-n.width / 2.0),
        y = fmt(-n.height / 2.0),
        w = fmt(n.width),
        h = fmt(n.height),
        fill = escape_xml(fill),
        stroke = escape_xml(&options.node_stroke),
    );

    let line_height = font_size * 1.2;
    let first_dy = -(n.lines.len().saturating_sub(1) as f64) * line_height / 2.0;
    out.push_str(r#"<text text-anchor="middle" dominant-baseline="central">"#);
    for (i, line) in n.lines.iter().enumerate() {
        let dy = if i == 0 { first_dy } else { line_height };
        let _ = write!(
            out,
            r#"<tspan x="0" dy="{dy}">{text}</tspan>"#,
            dy = fmt(dy),
            text = escape_xml(line),
        );
    }
    out.push_str("</text>");

    if n.hidden_children > 0 {
        let cx = n.width / 2.0;
        let _ = write!(
            out,
            r##"<g class="collapsed-marker"><circle cx="{cx}" cy="0" r="9" fill="#FFFFFF" stroke="{stroke}"/><text x="{cx}" y="0" text-anchor="middle" dominant-baseline="central" font-size="10">+{count}</text></g>"##,
            cx = fmt(cx),
            stroke = escape_xml(&options.node_stroke),
            count = n.hidden_children,
        );
    }
    out.push_str("</g>");
}

/// Mindmap SVG with no background: the surrounding page (or the raster exporter) supplies one.
pub fn render_mindmap_svg(
    layout: &MindmapLayout,
    font_size: f64,
    options: &SvgRenderOptions,
) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("mindmap");
    let mut out = String::new();
    open_svg(
        &mut out,
        diagram_id,
        "mindmapDiagram",
        layout.width,
        layout.height,
        "mindmap",
    );
    let _ = write!(
        &mut out,
        r#"<g font-family="{family}" font-size="{size}" fill="{color}">"#,
        family = escape_xml(&options.font_family),
        size = fmt(font_size),
        color = escape_xml(&options.text_color),
    );

    out.push_str(r#"<g class="edgePaths">"#);
    for e in &layout.edges {
        let _ = write!(
            &mut out,
            r#"<path class="edge" data-from="{from}" data-to="{to}" d="M{sx},{sy}C{c1x},{c1y},{c2x},{c2y},{tx},{ty}" fill="none" stroke="{stroke}" stroke-width="2"/>"#,
            from = e.from,
            to = e.to,
            sx = fmt_path(e.start.x),
            sy = fmt_path(e.start.y),
            c1x = fmt_path(e.control1.x),
            c1y = fmt_path(e.control1.y),
            c2x = fmt_path(e.control2.x),
            c2y = fmt_path(e.control2.y),
            tx = fmt_path(e.end.x),
            ty = fmt_path(e.end.y),
            stroke = escape_xml(&options.edge_stroke),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="nodes">"#);
    for n in &layout.nodes {
        write_node(&mut out, n, options, font_size);
    }
    out.push_str("</g></g></svg>");
    out
}

/// Bar-chart SVG. Like mindmaps, it carries no background rectangle.
pub fn render_chart_svg(layout: &ChartLayout, options: &SvgRenderOptions) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("chart");
    let plot = &layout.plot;
    let mut out = String::new();
    open_svg(
        &mut out,
        diagram_id,
        "barChart",
        layout.width,
        layout.height,
        "bar chart",
    );
    let _ = write!(
        &mut out,
        r#"<g font-family="{family}" font-size="{size}" fill="{color}">"#,
        family = escape_xml(&options.font_family),
        size = fmt(layout.font_size),
        color = escape_xml(&options.text_color),
    );

    out.push_str(r#"<g class="ticks">"#);
    for t in &layout.ticks {
        let _ = write!(
            &mut out,
            r##"<line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="#E0E0E0"/><text x="{tx}" y="{y}" text-anchor="end" dominant-baseline="central">{label}</text>"##,
            x1 = fmt(plot.min_x),
            x2 = fmt(plot.max_x),
            y = fmt(t.y),
            tx = fmt(plot.min_x - 6.0),
            label = escape_xml(&t.label),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="bars">"#);
    for b in &layout.bars {
        let _ = write!(
            &mut out,
            r#"<rect class="bar" data-category="{c}" data-series="{s}" x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"><title>{v}</title></rect>"#,
            c = b.category,
            s = b.series,
            x = fmt(b.x),
            y = fmt(b.y),
            w = fmt(b.width),
            h = fmt(b.height),
            fill = escape_xml(&b.color),
            v = fmt(b.value),
        );
    }
    out.push_str("</g>");

    let _ = write!(
        &mut out,
        r#"<line class="baseline" x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="{stroke}"/>"#,
        x1 = fmt(plot.min_x),
        x2 = fmt(plot.max_x),
        y = fmt(layout.baseline_y),
        stroke = escape_xml(&options.text_color),
    );

    out.push_str(r#"<g class="categories">"#);
    for c in &layout.categories {
        let _ = write!(
            &mut out,
            r#"<text x="{x}" y="{y}" text-anchor="middle" dominant-baseline="hanging">{label}</text>"#,
            x = fmt(c.x),
            y = fmt(plot.max_y + 6.0),
            label = escape_xml(&c.label),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="legend">"#);
    let mut x = plot.min_x;
    for item in &layout.legend {
        let _ = write!(
            &mut out,
            r#"<rect x="{x}" y="4" width="12" height="12" fill="{fill}"/><text x="{tx}" y="10" dominant-baseline="central">{name}</text>"#,
            x = fmt(x),
            tx = fmt(x + 16.0),
            fill = escape_xml(&item.color),
            name = escape_xml(&item.name),
        );
        x += 16.0 + layout.font_size * 0.6 * item.name.chars().count() as f64 + 16.0;
    }
    out.push_str("</g></g></svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_without_noise() {
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(12.0000000001), "12");
        assert_eq!(fmt(1.5), "1.5");
        assert_eq!(fmt_path(1.23456), "1.235");
        assert_eq!(fmt_path(2.0), "2");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
    }
}
