//! Simulation log records
//!
//! One CSV row per simulated user action. Rows are deserialized into an
//! all-optional [`RawRecord`] first so that a missing or malformed field can be
//! reported with the file, line and column it came from instead of a generic
//! deserialization failure.
//!
//! Header:
//!
//! ```text
//! record_type,scenario_name,group_hierarchy,request_name,status,start_timestamp,end_timestamp,response_time_ms,message
//! ```

use crate::error::{GstatError, Result};
use crate::identity::FullRequestPath;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
}

/// User lifecycle marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLifecycle {
    Start,
    End,
}

/// A user lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEvent {
    pub scenario_name: String,
    pub lifecycle: UserLifecycle,
    pub timestamp_ms: u64,
}

/// A completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub scenario_name: String,
    pub group_hierarchy: Vec<String>,
    pub request_name: String,
    pub status: Status,
    pub start_timestamp_ms: u64,
    pub end_timestamp_ms: u64,
    pub response_time_ms: u64,
    pub message: Option<String>,
}

impl RequestEvent {
    /// Aggregation key for this request
    pub fn full_path(&self) -> FullRequestPath {
        FullRequestPath::resolve(&self.group_hierarchy, &self.request_name)
    }
}

/// One parsed log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    User(UserEvent),
    Request(RequestEvent),
}

/// Row as it appears in the file, before validation
#[derive(Debug, Default, Deserialize)]
pub struct RawRecord {
    pub record_type: Option<String>,
    pub scenario_name: Option<String>,
    pub group_hierarchy: Option<String>,
    pub request_name: Option<String>,
    pub status: Option<String>,
    pub start_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
    pub response_time_ms: Option<String>,
    pub message: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

struct FieldContext<'a> {
    source_name: &'a str,
    line: u64,
}

impl FieldContext<'_> {
    fn required<'r>(&self, value: &'r Option<String>, field: &'static str) -> Result<&'r str> {
        non_empty(value)
            .ok_or_else(|| GstatError::data(self.source_name, self.line, field, "missing value"))
    }

    fn timestamp(&self, value: &Option<String>, field: &'static str) -> Result<u64> {
        let text = self.required(value, field)?;
        text.parse::<u64>().map_err(|_| {
            GstatError::data(
                self.source_name,
                self.line,
                field,
                format!("expected a non-negative integer, got `{}`", text),
            )
        })
    }
}

impl LogRecord {
    /// Validate a raw row. `line` is the 1-based line number in `source_name`.
    pub fn from_raw(raw: &RawRecord, source_name: &str, line: u64) -> Result<Self> {
        let ctx = FieldContext { source_name, line };
        let record_type = ctx.required(&raw.record_type, "record_type")?;

        match record_type.to_ascii_lowercase().as_str() {
            "user" => Self::user_from_raw(raw, &ctx),
            "request" => Self::request_from_raw(raw, &ctx),
            other => Err(GstatError::data(
                source_name,
                line,
                "record_type",
                format!("expected `user` or `request`, got `{}`", other),
            )),
        }
    }

    fn user_from_raw(raw: &RawRecord, ctx: &FieldContext<'_>) -> Result<Self> {
        let scenario_name = ctx.required(&raw.scenario_name, "scenario_name")?;
        let lifecycle = match ctx
            .required(&raw.status, "status")?
            .to_ascii_uppercase()
            .as_str()
        {
            "START" => UserLifecycle::Start,
            "END" => UserLifecycle::End,
            other => {
                return Err(GstatError::data(
                    ctx.source_name,
                    ctx.line,
                    "status",
                    format!("expected `START` or `END` for a user record, got `{}`", other),
                ))
            }
        };
        let timestamp_ms = match lifecycle {
            UserLifecycle::Start => ctx.timestamp(&raw.start_timestamp, "start_timestamp")?,
            UserLifecycle::End => match non_empty(&raw.end_timestamp) {
                Some(_) => ctx.timestamp(&raw.end_timestamp, "end_timestamp")?,
                None => ctx.timestamp(&raw.start_timestamp, "start_timestamp")?,
            },
        };

        Ok(LogRecord::User(UserEvent {
            scenario_name: scenario_name.to_string(),
            lifecycle,
            timestamp_ms,
        }))
    }

    fn request_from_raw(raw: &RawRecord, ctx: &FieldContext<'_>) -> Result<Self> {
        let scenario_name = ctx.required(&raw.scenario_name, "scenario_name")?;
        let request_name = ctx.required(&raw.request_name, "request_name")?;
        let status = match ctx
            .required(&raw.status, "status")?
            .to_ascii_uppercase()
            .as_str()
        {
            "OK" => Status::Ok,
            "KO" => Status::Ko,
            other => {
                return Err(GstatError::data(
                    ctx.source_name,
                    ctx.line,
                    "status",
                    format!("expected `OK` or `KO`, got `{}`", other),
                ))
            }
        };
        let start_timestamp_ms = ctx.timestamp(&raw.start_timestamp, "start_timestamp")?;
        let end_timestamp_ms = ctx.timestamp(&raw.end_timestamp, "end_timestamp")?;

        let response_time_ms = if non_empty(&raw.response_time_ms).is_some() {
            ctx.timestamp(&raw.response_time_ms, "response_time_ms")?
        } else {
            end_timestamp_ms
                .checked_sub(start_timestamp_ms)
                .ok_or_else(|| {
                    GstatError::data(
                        ctx.source_name,
                        ctx.line,
                        "response_time_ms",
                        "missing value and end_timestamp precedes start_timestamp",
                    )
                })?
        };

        Ok(LogRecord::Request(RequestEvent {
            scenario_name: scenario_name.to_string(),
            group_hierarchy: FullRequestPath::parse_hierarchy(
                raw.group_hierarchy.as_deref().unwrap_or(""),
            ),
            request_name: request_name.to_string(),
            status,
            start_timestamp_ms,
            end_timestamp_ms,
            response_time_ms,
            message: non_empty(&raw.message).map(str::to_string),
        }))
    }
}

/// Streaming reader over a simulation log, yielding validated records in
/// file order
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
    source_name: String,
    headers: Option<csv::StringRecord>,
    row: csv::StringRecord,
    done: bool,
}

impl RecordReader<std::fs::File> {
    /// Open a simulation log on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(file, &path.display().to_string()))
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap any reader. `source_name` is used in error messages.
    pub fn new(input: R, source_name: &str) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);
        Self {
            reader,
            source_name: source_name.to_string(),
            headers: None,
            row: csv::StringRecord::new(),
            done: false,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn csv_error(&self, err: csv::Error) -> GstatError {
        match err.position() {
            Some(pos) => GstatError::data(&self.source_name, pos.line(), "row", err.to_string()),
            None => GstatError::Csv(err),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.headers.is_none() {
            match self.reader.headers() {
                Ok(headers) => self.headers = Some(headers.clone()),
                Err(e) => {
                    self.done = true;
                    return Some(Err(self.csv_error(e)));
                }
            }
        }

        match self.reader.read_record(&mut self.row) {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(self.csv_error(e)));
            }
        }

        let line = self.row.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRecord = match self.row.deserialize(self.headers.as_ref()) {
            Ok(raw) => raw,
            Err(e) => return Some(Err(self.csv_error(e))),
        };
        Some(LogRecord::from_raw(&raw, &self.source_name, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "record_type,scenario_name,group_hierarchy,request_name,status,start_timestamp,end_timestamp,response_time_ms,message\n";

    fn parse(body: &str) -> Vec<Result<LogRecord>> {
        let input = format!("{}{}", HEADER, body);
        RecordReader::new(input.as_bytes(), "test.csv").collect()
    }

    #[test]
    fn test_parses_request_row() {
        let records = parse("request,Basic,A|B,X,OK,1000,1005,5,\n");
        assert_eq!(records.len(), 1);
        match records[0].as_ref().unwrap() {
            LogRecord::Request(req) => {
                assert_eq!(req.group_hierarchy, vec!["A", "B"]);
                assert_eq!(req.request_name, "X");
                assert_eq!(req.status, Status::Ok);
                assert_eq!(req.response_time_ms, 5);
                assert_eq!(req.full_path().to_string(), "A|B|X");
                assert!(req.message.is_none());
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_parses_user_rows() {
        let records = parse("user,Basic,,,START,1000,,,\nUSER,Basic,,,END,1000,2000,,\n");
        let events: Vec<_> = records.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events[0],
            LogRecord::User(UserEvent {
                scenario_name: "Basic".to_string(),
                lifecycle: UserLifecycle::Start,
                timestamp_ms: 1000,
            })
        );
        match &events[1] {
            LogRecord::User(u) => {
                assert_eq!(u.lifecycle, UserLifecycle::End);
                assert_eq!(u.timestamp_ms, 2000);
            }
            other => panic!("expected user, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_hierarchy_is_no_context() {
        let records = parse("request,Basic,,X,KO,1000,1010,10,timeout\n");
        match records[0].as_ref().unwrap() {
            LogRecord::Request(req) => {
                assert!(req.group_hierarchy.is_empty());
                assert_eq!(req.status, Status::Ko);
                assert_eq!(req.message.as_deref(), Some("timeout"));
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_response_time_derived_from_timestamps() {
        let records = parse("request,Basic,,X,OK,1000,1042,,\n");
        match records[0].as_ref().unwrap() {
            LogRecord::Request(req) => assert_eq!(req.response_time_ms, 42),
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_request_name_is_data_error_with_line() {
        let records = parse("request,Basic,A,X,OK,1,2,1,\nrequest,Basic,A,,OK,1,2,1,\n");
        assert!(records[0].is_ok());
        match records[1].as_ref().unwrap_err() {
            GstatError::Data {
                source_name,
                line,
                field,
                ..
            } => {
                assert_eq!(source_name, "test.csv");
                assert_eq!(*line, 3);
                assert_eq!(*field, "request_name");
            }
            other => panic!("expected data error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_response_time_is_data_error() {
        let records = parse("request,Basic,A,X,OK,1,2,-5,\n");
        let err = records[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("response_time_ms"));
    }

    #[test]
    fn test_inverted_timestamps_without_response_time_is_data_error() {
        let records = parse("request,Basic,A,X,OK,10,2,,\n");
        assert!(matches!(
            records[0],
            Err(GstatError::Data {
                field: "response_time_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_status_and_record_type() {
        let records = parse("request,Basic,A,X,MAYBE,1,2,1,\nerror,Basic,A,X,OK,1,2,1,\n");
        assert!(matches!(records[0], Err(GstatError::Data { field: "status", .. })));
        assert!(matches!(
            records[1],
            Err(GstatError::Data {
                field: "record_type",
                ..
            })
        ));
    }

    #[test]
    fn test_short_rows_and_extra_columns_are_tolerated() {
        let records = parse("request,Basic,A,X,OK,1,2,1,,extra\nuser,Basic,,,START,5\n");
        assert!(records[0].is_ok());
        assert!(records[1].is_ok());
    }
}
