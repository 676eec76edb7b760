//! Turns a sparse datalog stream into dense, aligned records.
//!
//! Each channel has two buffers. Values land in `pending` until a present
//! value closes the run; the run is then filled in and everything but its
//! final value moves to `ready`. The final value stays in `pending` as the
//! start of the next run. A record is emitted whenever every channel has a
//! ready value, so output order matches input order and memory only grows
//! while some channel is silent.

use crate::config::FillMode;
use crate::core::smoothing::interp_dpoints;
use crate::errors::AppResult;
use csv::StringRecord;
use log::{debug, warn};
use std::collections::VecDeque;

/// One aligned output row, one value per channel in header order.
/// A value is `None` only for a channel that never reported anything.
pub type Record = Vec<Option<f64>>;

/// A recoverable data-quality issue; the offending line was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportWarning {
    /// 1-based data line number; the header line is not counted.
    pub line: usize,
    pub text: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    Draining,
    Done,
}

pub struct Desparsifier<I> {
    records: I,
    fill: FillMode,
    width: usize,
    pending: Vec<Vec<Option<f64>>>,
    ready: Vec<VecDeque<Option<f64>>>,
    state: State,
    lines_read: usize,
    warnings: Vec<ImportWarning>,
}

impl<I> Desparsifier<I>
where
    I: Iterator<Item = csv::Result<StringRecord>>,
{
    /// `width` is the channel count declared by the header line.
    pub fn new(records: I, width: usize, fill: FillMode) -> Self {
        Self {
            records,
            fill,
            width,
            pending: vec![Vec::new(); width],
            ready: vec![VecDeque::new(); width],
            state: if width == 0 { State::Done } else { State::Reading },
            lines_read: 0,
            warnings: Vec::new(),
        }
    }

    /// Data lines consumed so far, skipped lines included.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn into_warnings(self) -> Vec<ImportWarning> {
        self.warnings
    }

    fn warn_line(&mut self, text: String, message: String) {
        let line = self.lines_read + 1;
        warn!("DataStore: line {}: {}", line, message);
        self.warnings.push(ImportWarning {
            line,
            text,
            message,
        });
    }

    /// Split a line into per-channel values; `Err` carries the warning text.
    fn parse_line(&self, record: &StringRecord) -> Result<Vec<Option<f64>>, String> {
        if record.len() > self.width {
            return Err(format!(
                "Unexpected channel count. Expected {}, got {}",
                self.width,
                record.len()
            ));
        }

        let mut values = Vec::with_capacity(self.width);
        for field in record.iter() {
            let field = field.trim();
            if field.is_empty() {
                values.push(None);
                continue;
            }
            match field.parse::<f64>() {
                Ok(v) => values.push(Some(v)),
                Err(_) => return Err(format!("Could not parse value '{}'", field)),
            }
        }
        values.resize(self.width, None);
        Ok(values)
    }

    fn file_values(&mut self, values: Vec<Option<f64>>) {
        for (c, value) in values.into_iter().enumerate() {
            let run = &mut self.pending[c];
            run.push(value);

            if run.len() < 2 {
                continue;
            }
            let Some(Some(last)) = run.last().copied() else {
                continue;
            };

            let filled = fill_run(run, last, self.fill);
            self.ready[c].extend(filled[..filled.len() - 1].iter().map(|v| Some(*v)));
            run.clear();
            run.push(Some(last));
        }
    }

    /// End of input: every pending run becomes a constant run of its first
    /// value.
    fn flush_pending(&mut self) {
        for (run, ready) in self.pending.iter_mut().zip(self.ready.iter_mut()) {
            let head = run.first().copied().flatten();
            ready.extend(std::iter::repeat_n(head, run.len()));
            run.clear();
        }
    }

    fn pop_aligned(&mut self) -> Option<Record> {
        if self.ready.iter().any(|r| r.is_empty()) {
            return None;
        }
        Some(
            self.ready
                .iter_mut()
                .map(|r| r.pop_front().flatten())
                .collect(),
        )
    }
}

/// Fill a run whose last value is present. A run that starts missing can
/// only occur at the head of the stream and is back-filled with `last`.
fn fill_run(run: &[Option<f64>], last: f64, fill: FillMode) -> Vec<f64> {
    match run[0] {
        None => vec![last; run.len()],
        Some(first) => match fill {
            FillMode::Carry => {
                let mut out = vec![first; run.len() - 1];
                out.push(last);
                out
            }
            FillMode::Linear => interp_dpoints(first, last, run.len() - 1),
        },
    }
}

impl<I> Iterator for Desparsifier<I>
where
    I: Iterator<Item = csv::Result<StringRecord>>,
{
    type Item = AppResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pop_aligned() {
                return Some(Ok(record));
            }

            match self.state {
                State::Reading => match self.records.next() {
                    Some(Ok(record)) => {
                        match self.parse_line(&record) {
                            Ok(values) => self.file_values(values),
                            Err(message) => {
                                let text = record.iter().collect::<Vec<_>>().join(",");
                                self.warn_line(text, message);
                            }
                        }
                        self.lines_read += 1;
                    }
                    Some(Err(e)) if e.is_io_error() => {
                        self.state = State::Done;
                        return Some(Err(e.into()));
                    }
                    Some(Err(e)) => {
                        self.warn_line(String::new(), format!("Unreadable line: {}", e));
                        self.lines_read += 1;
                    }
                    None => {
                        debug!("DataStore: desparsify reached end after {} lines", self.lines_read);
                        self.flush_pending();
                        self.state = State::Draining;
                    }
                },
                State::Draining | State::Done => {
                    self.state = State::Done;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    fn run(data: &str, width: usize, fill: FillMode) -> (Vec<Record>, Vec<ImportWarning>) {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(data.as_bytes());
        let mut d = Desparsifier::new(reader.into_records(), width, fill);
        let mut out = Vec::new();
        for r in d.by_ref() {
            out.push(r.unwrap());
        }
        (out, d.into_warnings())
    }

    fn some(v: &[f64]) -> Record {
        v.iter().map(|x| Some(*x)).collect()
    }

    #[test]
    fn back_fills_leading_gaps() {
        let data = "1,,\n2,,\n3,5,\n4,,9\n5,6,\n";
        let (out, _) = run(data, 3, FillMode::Carry);
        assert_eq!(
            out,
            vec![
                some(&[1.0, 5.0, 9.0]),
                some(&[2.0, 5.0, 9.0]),
                some(&[3.0, 5.0, 9.0]),
                some(&[4.0, 5.0, 9.0]),
                some(&[5.0, 6.0, 9.0]),
            ]
        );
    }

    #[test]
    fn carry_holds_previous_value() {
        let data = "3,0\n,\n,\n,\n7,0\n";
        let (out, _) = run(data, 2, FillMode::Carry);
        let first: Vec<f64> = out.iter().map(|r| r[0].unwrap()).collect();
        assert_eq!(first, vec![3.0, 3.0, 3.0, 3.0, 7.0]);
    }

    #[test]
    fn linear_interpolates_between_hits() {
        let data = "1,0\n,\n,\n,\n5,0\n";
        let (out, _) = run(data, 2, FillMode::Linear);
        let first: Vec<f64> = out.iter().map(|r| r[0].unwrap()).collect();
        assert_eq!(first, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn linear_still_back_fills_head() {
        let data = ",1\n,2\n4,3\n,4\n8,5\n";
        let (out, _) = run(data, 2, FillMode::Linear);
        let first: Vec<f64> = out.iter().map(|r| r[0].unwrap()).collect();
        assert_eq!(first, vec![4.0, 4.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn trailing_gaps_hold_last_value() {
        let data = "1,10\n2,\n3,\n";
        let (out, _) = run(data, 2, FillMode::Carry);
        assert_eq!(out, vec![some(&[1.0, 10.0]), some(&[2.0, 10.0]), some(&[3.0, 10.0])]);
    }

    #[test]
    fn wide_line_is_skipped_with_warning() {
        let data = "1,2\n3,4,5\n6,7\n";
        let (out, warnings) = run(data, 2, FillMode::Carry);
        assert_eq!(out, vec![some(&[1.0, 2.0]), some(&[6.0, 7.0])]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 2);
        assert!(warnings[0].message.contains("Expected 2, got 3"));
    }

    #[test]
    fn unparseable_line_is_skipped_with_warning() {
        let data = "1,2\nabc,4\n6,7\n";
        let (out, warnings) = run(data, 2, FillMode::Carry);
        assert_eq!(out.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].text, "abc,4");
    }

    #[test]
    fn short_line_is_padded_as_missing() {
        let data = "1,2\n3\n5,6\n";
        let (out, warnings) = run(data, 2, FillMode::Carry);
        assert!(warnings.is_empty());
        assert_eq!(out, vec![some(&[1.0, 2.0]), some(&[3.0, 2.0]), some(&[5.0, 6.0])]);
    }

    #[test]
    fn silent_channel_yields_none() {
        let data = "1,\n2,\n";
        let (out, _) = run(data, 2, FillMode::Carry);
        assert_eq!(out, vec![vec![Some(1.0), None], vec![Some(2.0), None]]);
    }

    #[test]
    fn every_record_is_fully_populated() {
        let data = ",1,\n2,,\n,,3\n4,5,\n,,6\n7,8,9\n";
        let (out, _) = run(data, 3, FillMode::Carry);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|r| r.iter().all(|v| v.is_some())));
    }
}
