use super::{CallQueue, QueueEntry};
use crate::triage::stress::round_to;
use serde::Serialize;
use std::io::Write;

/// Download name for the batch report.
pub const REPORT_FILE_NAME: &str = "emergency_call_queue_report.csv";

/// One report line. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueRow<'a> {
    pub rank: usize,
    pub filename: &'a str,
    pub urgency: u8,
    pub level: &'static str,
    pub situation: &'static str,
    pub situation_confidence: f64,
    pub emotion: &'static str,
    pub emotion_confidence: f64,
    pub stress: f64,
    pub manual_review: bool,
    pub transcript: &'a str,
    pub instruction: &'static str,
}

impl<'a> From<&'a QueueEntry> for QueueRow<'a> {
    fn from(entry: &'a QueueEntry) -> Self {
        let result = &entry.result;
        Self {
            rank: entry.rank,
            filename: result.filename(),
            urgency: result.urgency(),
            level: result.level().as_str(),
            situation: result.situation().label.as_str(),
            situation_confidence: round_to(result.situation().confidence, 2),
            emotion: result.emotion().label.as_str(),
            emotion_confidence: round_to(result.emotion().confidence, 2),
            stress: round_to(result.stress(), 1),
            manual_review: result.manual_review(),
            transcript: result.transcript(),
            instruction: result.instruction(),
        }
    }
}

impl CallQueue {
    pub fn rows(&self) -> Vec<QueueRow<'_>> {
        self.entries.iter().map(QueueRow::from).collect()
    }

    /// Writes the header plus one row per entry.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.entries.is_empty() {
            csv_writer.write_record(HEADER)?;
        }
        for row in self.rows() {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|err| {
            csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })
    }
}

/// Used when there are no rows for serde to derive the header from.
const HEADER: [&str; 12] = [
    "rank",
    "filename",
    "urgency",
    "level",
    "situation",
    "situation_confidence",
    "emotion",
    "emotion_confidence",
    "stress",
    "manual_review",
    "transcript",
    "instruction",
];

#[cfg(test)]
mod tests {
    use super::super::QueueRanker;
    use super::*;
    use crate::triage::engine::TriageEngine;

    fn queue() -> CallQueue {
        let engine = TriageEngine::default();
        QueueRanker.rank(vec![
            engine.assess("calm.wav", "we are safe, no injuries", 12.345),
            engine.assess(
                "trapped.wav",
                "I'm trapped under rubble, please help, panic!",
                80.0,
            ),
        ])
    }

    #[test]
    fn header_matches_column_order() {
        let csv = queue().to_csv_string().expect("csv renders");
        let header = csv.lines().next().expect("header present");
        assert_eq!(header, HEADER.join(","));
    }

    #[test]
    fn rows_round_confidence_and_stress() {
        let csv = queue().to_csv_string().expect("csv renders");
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let records: Vec<csv::StringRecord> = reader
            .records()
            .collect::<Result<_, _>>()
            .expect("records parse");

        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "1");
        assert_eq!(&records[0][1], "trapped.wav");
        assert_eq!(&records[0][2], "92");
        assert_eq!(&records[0][3], "CRITICAL");
        assert_eq!(&records[0][5], "0.85");
        assert_eq!(&records[0][7], "0.84");
        assert_eq!(&records[0][8], "80.0");
        assert_eq!(&records[0][9], "false");

        assert_eq!(&records[1][1], "calm.wav");
        assert_eq!(&records[1][4], "SAFE");
        assert_eq!(&records[1][5], "0.7");
        assert_eq!(&records[1][8], "12.3");
        assert_eq!(&records[1][10], "we are safe, no injuries");
    }

    #[test]
    fn empty_queue_still_has_header() {
        let csv = CallQueue::default().to_csv_string().expect("csv renders");
        assert_eq!(csv.trim_end(), HEADER.join(","));
    }
}
