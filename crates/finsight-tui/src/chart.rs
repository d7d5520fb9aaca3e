use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
};
use finsight_core::{ChartDataPoint, ChartSpec, ChartType};

/// Samples per segment when filling an area chart
const AREA_SAMPLES_PER_SEGMENT: usize = 24;

/// Compact label for a metric value: 1200000 -> "1.2M", 150000 -> "150K", 12.5 -> "12.5"
pub fn format_value(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };

    let text = format!("{:.2}", scaled);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", text, suffix)
}

/// Y-axis bounds: always include zero, with headroom above the tallest point
pub fn value_bounds(data: &[ChartDataPoint]) -> [f64; 2] {
    let lo = data.iter().map(|p| p.value).fold(0.0_f64, f64::min);
    let mut hi = data.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    if hi <= lo {
        hi = lo + 1.0;
    }

    let pad = (hi - lo) * 0.1;
    let lo = if lo < 0.0 { lo - pad } else { lo };
    [lo, hi + pad]
}

/// Integer bar heights. Small values are scaled up so fractions still show.
pub fn bar_heights(data: &[ChartDataPoint]) -> Vec<u64> {
    let max_abs = data.iter().map(|p| p.value.abs()).fold(0.0_f64, f64::max);
    let scale = if max_abs < 1000.0 { 100.0 } else { 1.0 };
    data.iter()
        .map(|p| (p.value.max(0.0) * scale).round() as u64)
        .collect()
}

pub fn line_points(data: &[ChartDataPoint]) -> Vec<(f64, f64)> {
    data.iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect()
}

/// Linearly interpolated samples between consecutive points, so a bar-graph
/// dataset renders as a filled area
pub fn area_samples(data: &[ChartDataPoint], per_segment: usize) -> Vec<(f64, f64)> {
    let per_segment = per_segment.max(1);
    let mut samples = Vec::new();

    for (i, pair) in data.windows(2).enumerate() {
        let (from, to) = (pair[0].value, pair[1].value);
        for step in 0..per_segment {
            let t = step as f64 / per_segment as f64;
            samples.push((i as f64 + t, from + (to - from) * t));
        }
    }

    if let Some(last) = data.last() {
        samples.push(((data.len() - 1) as f64, last.value));
    }

    samples
}

fn chart_block(chart: &ChartSpec, position: usize, total: usize, focused: bool) -> Block<'static> {
    let title = chart.title.clone().unwrap_or_else(|| "Chart".to_string());
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title))
        .title_bottom(Line::from(format!(
            " {} chart {}/{} ",
            chart.chart_type.as_str(),
            position + 1,
            total
        )))
}

/// Render a chart attached to an assistant message
pub fn render_chart(
    frame: &mut Frame,
    area: Rect,
    chart: &ChartSpec,
    position: usize,
    total: usize,
    focused: bool,
) {
    let block = chart_block(chart, position, total, focused);

    if chart.data.is_empty() {
        let placeholder = Paragraph::new("The analyst returned no data points for this chart.")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    match chart.chart_type {
        ChartType::Bar => render_bar_chart(frame, area, chart, block),
        ChartType::Line => render_xy_chart(frame, area, chart, block, GraphType::Line, line_points(&chart.data)),
        ChartType::Area => render_xy_chart(
            frame,
            area,
            chart,
            block,
            GraphType::Bar,
            area_samples(&chart.data, AREA_SAMPLES_PER_SEGMENT),
        ),
    }
}

fn render_bar_chart(frame: &mut Frame, area: Rect, chart: &ChartSpec, block: Block) {
    let inner_width = block.inner(area).width as usize;
    let count = chart.data.len().max(1);
    let bar_width = (inner_width.saturating_sub(count - 1) / count).clamp(3, 14) as u16;

    let bars: Vec<Bar> = chart
        .data
        .iter()
        .zip(bar_heights(&chart.data))
        .map(|(point, height)| {
            Bar::default()
                .value(height)
                .label(Line::from(point.name.clone()))
                .text_value(format_value(point.value))
        })
        .collect();

    let barchart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD))
        .label_style(Style::default().fg(Color::Gray));

    frame.render_widget(barchart, area);
}

fn render_xy_chart(
    frame: &mut Frame,
    area: Rect,
    chart: &ChartSpec,
    block: Block,
    graph_type: GraphType,
    points: Vec<(f64, f64)>,
) {
    let [lo, hi] = value_bounds(&chart.data);
    let x_max = (chart.data.len().saturating_sub(1)).max(1) as f64;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(graph_type)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let x_labels: Vec<Span> = chart
        .data
        .iter()
        .map(|p| Span::styled(p.name.clone(), Style::default().fg(Color::Gray)))
        .collect();
    let y_labels: Vec<Span> = [lo, (lo + hi) / 2.0, hi]
        .iter()
        .map(|v| Span::raw(format_value(*v)))
        .collect();

    let widget = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([lo, hi])
                .labels(y_labels),
        );

    frame.render_widget(widget, area);
}

/// Filled cells for a text bar `width` cells wide at full scale
pub fn text_bar_len(value: f64, max_abs: f64, width: usize) -> usize {
    if max_abs <= 0.0 {
        return 0;
    }
    ((value.abs() / max_abs) * width as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, value: f64) -> ChartDataPoint {
        ChartDataPoint {
            name: name.to_string(),
            value,
            category: None,
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1_200_000.0), "1.2M");
        assert_eq!(format_value(1_350_000.0), "1.35M");
        assert_eq!(format_value(150_000.0), "150K");
        assert_eq!(format_value(2_500_000_000.0), "2.5B");
        assert_eq!(format_value(12.5), "12.5");
        assert_eq!(format_value(20.0), "20");
        assert_eq!(format_value(-90_000.0), "-90K");
        assert_eq!(format_value(0.0), "0");
    }

    #[test]
    fn test_value_bounds_include_zero() {
        let data = vec![point("Q1", 100.0), point("Q2", 200.0)];
        let [lo, hi] = value_bounds(&data);
        assert_eq!(lo, 0.0);
        assert!((hi - 220.0).abs() < 1e-9);

        let data = vec![point("Q1", -50.0), point("Q2", 50.0)];
        let [lo, hi] = value_bounds(&data);
        assert!((lo + 60.0).abs() < 1e-9);
        assert!((hi - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_bounds_flat_data() {
        let [lo, hi] = value_bounds(&[point("Q1", 0.0)]);
        assert!(hi > lo);
        assert_eq!(value_bounds(&[]), [0.0, 1.1]);
    }

    #[test]
    fn test_bar_heights_scale_small_values() {
        let margins = vec![point("Q1", 12.5), point("Q2", 20.0)];
        assert_eq!(bar_heights(&margins), vec![1250, 2000]);

        let revenue = vec![point("Q1", 1_200_000.0), point("Q2", -5_000.0)];
        assert_eq!(bar_heights(&revenue), vec![1_200_000, 0]);
    }

    #[test]
    fn test_line_points_use_index_as_x() {
        let data = vec![point("Q1", 3.0), point("Q2", 4.0)];
        assert_eq!(line_points(&data), vec![(0.0, 3.0), (1.0, 4.0)]);
    }

    #[test]
    fn test_area_samples_interpolate() {
        let data = vec![point("Q1", 0.0), point("Q2", 10.0), point("Q3", 0.0)];
        let samples = area_samples(&data, 2);

        assert_eq!(
            samples,
            vec![(0.0, 0.0), (0.5, 5.0), (1.0, 10.0), (1.5, 5.0), (2.0, 0.0)]
        );
    }

    #[test]
    fn test_area_samples_degenerate_inputs() {
        assert!(area_samples(&[], 4).is_empty());
        assert_eq!(area_samples(&[point("Q1", 7.0)], 4), vec![(0.0, 7.0)]);
    }

    #[test]
    fn test_text_bar_len() {
        assert_eq!(text_bar_len(50.0, 100.0, 20), 10);
        assert_eq!(text_bar_len(-100.0, 100.0, 20), 20);
        assert_eq!(text_bar_len(5.0, 0.0, 20), 0);
    }
}
