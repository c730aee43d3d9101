//! Month chart rendering. The assistant only needs bytes; the format belongs to the renderer.

use std::fmt::Write as _;

use crate::ledger::{Locale, MonthTotals};

pub const INCOME_COLOR: &str = "#36A2EB";
pub const EXPENSE_COLOR: &str = "#FF6384";

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

/// Income and expense bars for a month, labelled for `locale`.
pub fn month_bars(totals: &MonthTotals, locale: Locale) -> Vec<Bar> {
    let (income, expense) = match locale {
        Locale::Ru => ("Доходы", "Расходы"),
        Locale::En => ("Income", "Expenses"),
    };
    vec![
        Bar {
            label: income.to_string(),
            value: totals.income,
            color: INCOME_COLOR,
        },
        Bar {
            label: expense.to_string(),
            value: totals.expense,
            color: EXPENSE_COLOR,
        },
    ]
}

pub trait ChartRenderer: Send + Sync {
    /// File extension of the produced image, without the dot.
    fn extension(&self) -> &'static str;

    /// Renders a bar chart. An empty buffer means "no image".
    fn render(&self, title: &str, bars: &[Bar]) -> Vec<u8>;
}

/// Plain SVG bar chart with a zero baseline and value captions.
#[derive(Debug, Clone)]
pub struct SvgBarChart {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgBarChart {
    fn default() -> Self {
        Self {
            width: 480,
            height: 320,
        }
    }
}

const MARGIN: f64 = 40.0;

impl ChartRenderer for SvgBarChart {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, title: &str, bars: &[Bar]) -> Vec<u8> {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let plot_height = height - 2.0 * MARGIN;
        let max = bars
            .iter()
            .map(|bar| bar.value.max(0.0))
            .fold(0.0_f64, f64::max);
        let slot = if bars.is_empty() {
            0.0
        } else {
            (width - 2.0 * MARGIN) / bars.len() as f64
        };

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="16">{}</text>"#,
            width / 2.0,
            MARGIN / 2.0 + 6.0,
            escape(title)
        );
        for (i, bar) in bars.iter().enumerate() {
            let bar_height = if max > 0.0 {
                bar.value.max(0.0) / max * plot_height
            } else {
                0.0
            };
            let x = MARGIN + slot * i as f64 + slot * 0.15;
            let y = MARGIN + plot_height - bar_height;
            let center = x + slot * 0.35;
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{:.1}" height="{bar_height:.1}" fill="{}"/>"#,
                slot * 0.7,
                bar.color
            );
            let _ = write!(
                svg,
                r#"<text x="{center:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
                y - 4.0,
                format_value(bar.value)
            );
            let _ = write!(
                svg,
                r#"<text x="{center:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
                height - MARGIN / 2.0,
                escape(&bar.label)
            );
        }
        let _ = write!(
            svg,
            r##"<line x1="{m}" y1="{base}" x2="{end}" y2="{base}" stroke="#333"/>"##,
            m = MARGIN,
            base = MARGIN + plot_height,
            end = width - MARGIN
        );
        svg.push_str("</svg>");
        svg.into_bytes()
    }
}

/// Renders nothing; replies go out without an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChart;

impl ChartRenderer for NoChart {
    fn extension(&self) -> &'static str {
        ""
    }

    fn render(&self, _title: &str, _bars: &[Bar]) -> Vec<u8> {
        Vec::new()
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
