use std::path::Path;

use itertools::{Itertools, MinMaxResult};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::full_palette;

use crate::model::LineFit;

const COLORS: [RGBColor; 4] = [
    full_palette::RED,
    full_palette::BLUE,
    full_palette::GREEN,
    full_palette::CYAN,
];

/// Finite min/max of `values`, padded so the range is never empty.
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.filter(|v| v.is_finite()).minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v - 1., v + 1.)),
        MinMaxResult::MinMax(min, max) if min == max => Some((min - 1., max + 1.)),
        MinMaxResult::MinMax(min, max) => {
            let pad = (max - min) * 0.05;
            Some((min - pad, max + pad))
        }
    }
}

pub fn plot_fit<DB>(
    x: &[f64],
    y: &[f64],
    lines: &[(&str, LineFit)],
    caption: &str,
    drawing_area: &DrawingArea<DB, Shift>,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    <DB as DrawingBackend>::ErrorType: 'static,
{
    drawing_area.fill(&WHITE)?;

    let (x_min, x_max) = bounds(x.iter().cloned()).unwrap_or((0., 1.));

    let line_ends = lines
        .iter()
        .flat_map(|(_, line)| [line.predict(x_min), line.predict(x_max)]);
    let (y_min, y_max) = bounds(y.iter().cloned().chain(line_ends)).unwrap_or((0., 1.));

    let mut chart_builder = ChartBuilder::on(drawing_area);

    let mut chart_context = chart_builder
        .caption(caption, ("Arial", 20))
        .set_all_label_area_size(50)
        .margin(20)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart_context
        .configure_mesh()
        .x_labels(10)
        .x_desc("x")
        .y_labels(10)
        .y_desc("y")
        .draw()?;

    chart_context
        .draw_series(
            x.iter()
                .zip(y)
                .map(|(&x, &y)| Circle::new((x, y), 3, BLACK.filled())),
        )?
        .label("test data")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLACK.filled()));

    for (i, (name, line)) in lines.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];

        chart_context
            .draw_series(LineSeries::new(
                [(x_min, line.predict(x_min)), (x_max, line.predict(x_max))],
                color.stroke_width(2),
            ))?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart_context
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    Ok(())
}

pub fn plot_log_scale_data<DB>(
    data: &[f64],
    label: &str,
    drawing_area: &DrawingArea<DB, Shift>,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    <DB as DrawingBackend>::ErrorType: 'static,
{
    drawing_area.fill(&WHITE)?;

    let positive = data.iter().cloned().filter(|l| l.is_finite() && *l > 0.);

    let (min_loss, max_loss) = match positive.minmax() {
        MinMaxResult::NoElements => return Ok(()),
        MinMaxResult::OneElement(l) => (l / 10., l * 10.),
        MinMaxResult::MinMax(min, max) if min == max => (min / 10., max * 10.),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    let mut chart_builder = ChartBuilder::on(drawing_area);

    let mut chart_context = chart_builder
        .caption(label, ("Arial", 20))
        .set_all_label_area_size(70)
        .margin(50)
        .build_cartesian_2d(0..data.len(), (min_loss..max_loss).log_scale())?;

    chart_context
        .configure_mesh()
        .x_labels(10)
        .x_desc("Iteration")
        .y_labels(10)
        .y_desc(label)
        .y_label_formatter(&|y| format!("{:.1e}", y))
        .draw()?;

    let losses = LineSeries::new(
        data.iter()
            .enumerate()
            .filter(|(_, l)| l.is_finite() && **l > 0.)
            .map(|(i, &l)| (i, l)),
        BLUE.filled(),
    );

    chart_context.draw_series(losses)?;

    Ok(())
}

/// Fitted lines over the test points on the left, the training loss curve on the right.
pub fn save_experiment_plot(
    path: &Path,
    x_test: &[f64],
    y_test: &[f64],
    lines: &[(&str, LineFit)],
    losses: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let drawing_area = SVGBackend::new(path, (1200, 600)).into_drawing_area();

    let (left, right) = drawing_area.split_horizontally(600);

    plot_fit(x_test, y_test, lines, "fitted lines on test data", &left)?;
    plot_log_scale_data(losses, "scratch training loss", &right)?;

    drawing_area.present()?;

    Ok(())
}
