//! Where rendered sections go
//!
//! The auditor hands every finished section to a [`ReportSink`] as soon as
//! its task ends. [`TerminalSink`] prints them with `console` styling;
//! [`MemorySink`] keeps them for callers that post-process the output.

use console::{Style, Term};
use std::io::Write;

use crate::render::{Line, Section};
use crate::tasks::TaskKind;

const HEADLINE: Style = Style::new().bold().underlined();
const LABEL: Style = Style::new().yellow();
const DIM: Style = Style::new().dim();
const ALERT: Style = Style::new().red();

/// Receives sections in emission order
pub trait ReportSink: Send {
    /// A task ended and produced `section`
    fn section(&mut self, task: TaskKind, section: &Section);
}

/// Prints sections to a terminal or any writer
pub struct TerminalSink<W: Write + Send = Term> {
    out: W,
}

impl TerminalSink<Term> {
    /// Print to standard output
    pub fn stdout() -> Self {
        Self { out: Term::stdout() }
    }
}

impl<W: Write + Send> TerminalSink<W> {
    /// Print to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give the writer back
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, section: &Section) -> std::io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", HEADLINE.apply_to(&section.title))?;
        writeln!(self.out)?;

        let widths = column_widths(&section.lines);
        for line in &section.lines {
            match line {
                Line::Info { text } => writeln!(self.out, "  {text}")?,
                Line::Item { label, value } => {
                    let label = format!("{label:<24}");
                    writeln!(self.out, "  {} {value}", LABEL.apply_to(label))?;
                }
                Line::Row { cells, flagged } => {
                    let mut row = String::from(" ");
                    for (i, cell) in cells.iter().enumerate() {
                        let padded = format!(" {cell:<width$}", width = widths.get(i).copied().unwrap_or(0));
                        let styled = if *flagged {
                            ALERT.apply_to(padded).to_string()
                        } else if i == 0 {
                            LABEL.apply_to(padded).to_string()
                        } else if i + 1 == cells.len() {
                            DIM.apply_to(padded).to_string()
                        } else {
                            padded
                        };
                        row.push_str(&styled);
                    }
                    writeln!(self.out, "{}", row.trim_end())?;
                }
                Line::Warning { text } => {
                    writeln!(self.out, "  {} {text}", ALERT.apply_to("Warning!"))?
                }
                Line::Error { text } => writeln!(self.out, "  {}", ALERT.apply_to(text))?,
            }
        }
        self.out.flush()
    }
}

fn column_widths(lines: &[Line]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for line in lines {
        if let Line::Row { cells, .. } = line {
            for (i, cell) in cells.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
    }
    widths
}

impl<W: Write + Send> ReportSink for TerminalSink<W> {
    fn section(&mut self, task: TaskKind, section: &Section) {
        if let Err(e) = self.write(section) {
            tracing::warn!(%task, error = %e, "failed to print section");
        }
    }
}

/// Collects sections in memory
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    /// `(task, section)` in emission order
    pub sections: Vec<(TaskKind, Section)>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks in the order their sections arrived
    pub fn order(&self) -> Vec<TaskKind> {
        self.sections.iter().map(|(task, _)| *task).collect()
    }

    /// Section emitted by `task`, if any
    pub fn get(&self, task: TaskKind) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(t, _)| *t == task)
            .map(|(_, section)| section)
    }

    /// How many sections `task` emitted
    pub fn count(&self, task: TaskKind) -> usize {
        self.sections.iter().filter(|(t, _)| *t == task).count()
    }
}

impl ReportSink for MemorySink {
    fn section(&mut self, task: TaskKind, section: &Section) {
        self.sections.push((task, section.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;

    #[test]
    fn test_terminal_sink_writes_headline_and_items() {
        console::set_colors_enabled(false);
        let mut sink = TerminalSink::new(Vec::new());
        let section = render::forms(&[]);
        sink.section(TaskKind::Forms, &section);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("Forms"));
        assert!(text.contains("No form found"));
        assert!(text.contains("Nothing to check out"));
    }

    #[test]
    fn test_column_widths_follow_longest_cell() {
        let section = render::externals(&["a.example".into(), "cdn.example.net".into()]);
        assert_eq!(column_widths(&section.lines), vec![15, 33]);
    }

    #[test]
    fn test_memory_sink_records_order() {
        let mut sink = MemorySink::new();
        sink.section(TaskKind::Videos, &render::videos(&[]));
        sink.section(TaskKind::Forms, &render::forms(&[]));
        assert_eq!(sink.order(), vec![TaskKind::Videos, TaskKind::Forms]);
        assert_eq!(sink.count(TaskKind::Forms), 1);
        assert!(sink.get(TaskKind::Cookies).is_none());
    }
}
