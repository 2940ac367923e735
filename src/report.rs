use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use resvg::{tiny_skia, usvg};
use serde::Serialize;
use svg::Document;
use svg::node::element::{Circle, Line, Polyline, Rectangle, Text};
use tempfile::Builder;

use crate::domain::SeqRecord;
use crate::error::KiraError;

pub const TABLE_HEADER: [&str; 3] = ["Accession number", "Length", "Description"];

const CHART_WIDTH: f64 = 2000.0;
const CHART_HEIGHT: f64 = 500.0;
const PLOT_LEFT: f64 = 90.0;
const PLOT_RIGHT: f64 = CHART_WIDTH - 30.0;
const PLOT_TOP: f64 = 50.0;
const PLOT_BOTTOM: f64 = CHART_HEIGHT - 170.0;
const SERIES_COLOR: &str = "#1f77b4";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportArtifacts {
    pub csv_path: Utf8PathBuf,
    pub plot_path: Utf8PathBuf,
}

/// Destination for the filtered records. Each artifact is written
/// independently; a failure in one says nothing about the other.
pub trait ReportSink {
    fn write_table(&self, records: &[SeqRecord], path: &Utf8Path) -> Result<(), KiraError>;
    fn write_chart(&self, records: &[SeqRecord], path: &Utf8Path) -> Result<(), KiraError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &S {
    fn write_table(&self, records: &[SeqRecord], path: &Utf8Path) -> Result<(), KiraError> {
        (**self).write_table(records, path)
    }

    fn write_chart(&self, records: &[SeqRecord], path: &Utf8Path) -> Result<(), KiraError> {
        (**self).write_chart(records, path)
    }
}

/// CSV table plus PNG chart on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReportSink;

impl ReportSink for FileReportSink {
    fn write_table(&self, records: &[SeqRecord], path: &Utf8Path) -> Result<(), KiraError> {
        let dir = parent_dir(path);
        let mut staged = Builder::new()
            .prefix(".kira-ts-")
            .suffix(".csv")
            .tempfile_in(dir.as_std_path())
            .map_err(|err| write_error(path, err))?;
        write_table_to(records, staged.as_file_mut()).map_err(|err| write_error(path, err))?;
        staged
            .persist(path.as_std_path())
            .map_err(|err| write_error(path, err.error))?;
        tracing::info!(%path, rows = records.len(), "wrote CSV report");
        Ok(())
    }

    fn write_chart(&self, records: &[SeqRecord], path: &Utf8Path) -> Result<(), KiraError> {
        let svg = render_chart_svg(records);
        let png = rasterize_png(&svg)?;
        fs::write(path.as_std_path(), png).map_err(|err| write_error(path, err))?;
        tracing::info!(%path, points = records.len(), "wrote length chart");
        Ok(())
    }
}

#[derive(Serialize)]
struct TableRow<'a> {
    id: &'a str,
    length: usize,
    description: &'a str,
}

/// Header row then one row per record, in input order.
pub fn write_table_to<W: Write>(records: &[SeqRecord], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(TABLE_HEADER)?;
    for record in records {
        out.serialize(TableRow {
            id: &record.id,
            length: record.length,
            description: &record.description,
        })?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint<'a> {
    pub label: &'a str,
    pub length: usize,
}

/// Records ranked longest first. Ties keep their input order; the input
/// slice is left untouched.
pub fn chart_points(records: &[SeqRecord]) -> Vec<ChartPoint<'_>> {
    let mut ranked: Vec<&SeqRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.length.cmp(&a.length));
    ranked
        .into_iter()
        .map(|record| ChartPoint {
            label: &record.id,
            length: record.length,
        })
        .collect()
}

pub fn render_chart_svg(records: &[SeqRecord]) -> String {
    let points = chart_points(records);
    let max_length = points.first().map(|point| point.length).unwrap_or(0);
    let (y_top, y_step) = y_axis_scale(max_length);

    let x_for = |index: usize| {
        let slot = (PLOT_RIGHT - PLOT_LEFT) / points.len().max(1) as f64;
        PLOT_LEFT + slot * (index as f64 + 0.5)
    };
    let y_for = |length: f64| PLOT_BOTTOM - (length / y_top) * (PLOT_BOTTOM - PLOT_TOP);

    let mut document = Document::new()
        .set("width", CHART_WIDTH)
        .set("height", CHART_HEIGHT)
        .set("viewBox", format!("0 0 {CHART_WIDTH} {CHART_HEIGHT}"))
        .add(
            Rectangle::new()
                .set("width", CHART_WIDTH)
                .set("height", CHART_HEIGHT)
                .set("fill", "white"),
        )
        .add(
            Rectangle::new()
                .set("x", PLOT_LEFT)
                .set("y", PLOT_TOP)
                .set("width", PLOT_RIGHT - PLOT_LEFT)
                .set("height", PLOT_BOTTOM - PLOT_TOP)
                .set("fill", "none")
                .set("stroke", "black"),
        )
        .add(label(CHART_WIDTH / 2.0, 30.0, 20, "middle", "GenBank Record Lengths"))
        .add(label(
            CHART_WIDTH / 2.0,
            CHART_HEIGHT - 12.0,
            14,
            "middle",
            "Accession number",
        ))
        .add(
            label(
                24.0,
                (PLOT_TOP + PLOT_BOTTOM) / 2.0,
                14,
                "middle",
                "Sequence length",
            )
            .set(
                "transform",
                format!("rotate(-90 24 {})", (PLOT_TOP + PLOT_BOTTOM) / 2.0),
            ),
        );

    let mut tick = 0.0;
    while tick <= y_top + f64::EPSILON {
        let y = y_for(tick);
        document = document
            .add(
                Line::new()
                    .set("x1", PLOT_LEFT - 5.0)
                    .set("y1", y)
                    .set("x2", PLOT_LEFT)
                    .set("y2", y)
                    .set("stroke", "black"),
            )
            .add(label(PLOT_LEFT - 8.0, y + 4.0, 11, "end", &format_tick(tick)));
        tick += y_step;
    }

    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(index, point)| (x_for(index), y_for(point.length as f64)))
        .collect();
    if coords.len() > 1 {
        let line = coords
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        document = document.add(
            Polyline::new()
                .set("points", line)
                .set("fill", "none")
                .set("stroke", SERIES_COLOR)
                .set("stroke-width", 1.5),
        );
    }
    for (point, &(x, y)) in points.iter().zip(&coords) {
        document = document
            .add(
                Circle::new()
                    .set("cx", x)
                    .set("cy", y)
                    .set("r", 4)
                    .set("fill", SERIES_COLOR),
            )
            .add(
                label(x, PLOT_BOTTOM + 8.0, 10, "end", point.label)
                    .set("dominant-baseline", "middle")
                    .set("transform", format!("rotate(-90 {x} {})", PLOT_BOTTOM + 8.0)),
            );
    }

    document.to_string()
}

fn rasterize_png(svg: &str) -> Result<Vec<u8>, KiraError> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|err| KiraError::ChartRender(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| KiraError::ChartRender("chart has zero size".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .encode_png()
        .map_err(|err| KiraError::ChartRender(err.to_string()))
}

fn label(x: f64, y: f64, size: u32, anchor: &str, content: &str) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("font-family", "sans-serif")
        .set("font-size", size)
        .set("text-anchor", anchor)
}

/// Upper axis bound and tick step: a 1/2/5 multiple covering `max`.
fn y_axis_scale(max: usize) -> (f64, f64) {
    let max = (max as f64).max(1.0);
    let raw = max / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = match raw / magnitude {
        n if n <= 1.0 => magnitude,
        n if n <= 2.0 => 2.0 * magnitude,
        n if n <= 5.0 => 5.0 * magnitude,
        _ => 10.0 * magnitude,
    };
    ((max / step).ceil() * step, step)
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

fn parent_dir(path: &Utf8Path) -> Utf8PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    }
}

fn write_error(path: &Utf8Path, err: impl std::fmt::Display) -> KiraError {
    KiraError::ReportWrite {
        path: path.to_string(),
        message: err.to_string(),
    }
}
