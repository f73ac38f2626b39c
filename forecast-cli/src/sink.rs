use chrono::Local;
use forecast_core::{DisplayRow, PresentationSink};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

/// Renders refresh outcomes to the terminal.
///
/// Rows and prompts go to `out`, errors to `err`.
pub struct TerminalSink<O: Write, E: Write> {
    out: O,
    err: E,
}

impl TerminalSink<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_rows(&mut self, rows: &[DisplayRow], title: &str) -> io::Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{}", "=".repeat(title.width().max(16)))?;

        if rows.is_empty() {
            writeln!(self.out, "(no forecast days returned)")?;
        }

        let date_width = column_width(rows.iter().map(|r| r.date.as_str()));
        let temp_width = column_width(rows.iter().map(|r| r.temperature.as_str()));
        let weather_width = column_width(rows.iter().map(|r| r.weather.as_str()));

        for row in rows {
            writeln!(
                self.out,
                "{}  {}  {}  {}",
                pad(&row.date, date_width),
                pad(&row.temperature, temp_width),
                pad(&row.weather, weather_width),
                row.wind,
            )?;
        }

        writeln!(self.out)?;
        writeln!(self.out, "Updated at {}", Local::now().format("%Y-%m-%d %H:%M"))?;
        self.out.flush()
    }
}

/// Widest terminal width among `values`; CJK text counts two columns per char.
fn column_width<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.map(UnicodeWidthStr::width).max().unwrap_or(0)
}

fn pad(value: &str, width: usize) -> String {
    let fill = width.saturating_sub(value.width());
    format!("{value}{}", " ".repeat(fill))
}

impl<O: Write, E: Write> PresentationSink for TerminalSink<O, E> {
    fn show_rows(&mut self, rows: &[DisplayRow], title: &str) {
        if let Err(e) = self.write_rows(rows, title) {
            tracing::warn!("failed to write forecast to terminal: {e}");
        }
    }

    fn show_prompt(&mut self, message: &str) {
        let res = writeln!(self.out, "{message}")
            .and_then(|_| writeln!(self.out, "Hint: run `forecast city add <name>` to save a city."));
        if let Err(e) = res {
            tracing::warn!("failed to write prompt to terminal: {e}");
        }
    }

    fn show_error(&mut self, message: &str) {
        if let Err(e) = writeln!(self.err, "Error: {message}") {
            tracing::warn!("failed to write error to terminal: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut TerminalSink<Vec<u8>, Vec<u8>>)) -> (String, String) {
        let mut sink = TerminalSink::new(Vec::new(), Vec::new());
        f(&mut sink);
        let (out, err) = sink.into_parts();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    fn row(date: &str, temperature: &str, weather: &str, wind: &str) -> DisplayRow {
        DisplayRow {
            date: date.into(),
            temperature: temperature.into(),
            weather: weather.into(),
            wind: wind.into(),
        }
    }

    #[test]
    fn rows_render_in_order_under_title() {
        let rows = vec![
            row("12日星期一", "23/15℃", "多云", "东北风3级"),
            row("13日星期二", "25/16℃", "晴", "微风"),
        ];
        let (out, err) = render(|s| s.show_rows(&rows, "北京"));

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "北京");
        assert!(lines[2].starts_with("12日星期一"));
        assert!(lines[2].contains("东北风3级"));
        assert!(lines[3].starts_with("13日星期二"));
        assert!(out.contains("Updated at "));
        assert!(err.is_empty());
    }

    #[test]
    fn wide_text_columns_line_up() {
        let rows = vec![
            row("12日星期一", "23/15℃", "多云", "东北风3级"),
            row("today", "10/2℃", "晴", "微风"),
        ];
        let (out, _) = render(|s| s.show_rows(&rows, "北京"));

        let lines: Vec<&str> = out.lines().collect();
        let wind_column = |line: &str, wind: &str| {
            let idx = line.find(wind).unwrap();
            line[..idx].width()
        };
        assert_eq!(wind_column(lines[2], "东北风3级"), wind_column(lines[3], "微风"));
        assert!(lines[3].starts_with("today      "));
    }

    #[test]
    fn empty_rows_are_reported() {
        let (out, _) = render(|s| s.show_rows(&[], "北京"));
        assert!(out.contains("(no forecast days returned)"));
    }

    #[test]
    fn prompt_includes_hint() {
        let (out, err) = render(|s| s.show_prompt("Please add a city."));
        assert!(out.starts_with("Please add a city.\n"));
        assert!(out.contains("forecast city add"));
        assert!(err.is_empty());
    }

    #[test]
    fn errors_go_to_err_stream() {
        let (out, err) = render(|s| s.show_error("Failed to fetch weather data: timed out"));
        assert!(out.is_empty());
        assert_eq!(err, "Error: Failed to fetch weather data: timed out\n");
    }
}
