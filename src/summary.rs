use serde::Serialize;

use crate::models::ResultRecord;

/// `"MM:SS"` for the countdown display, seconds rounded to nearest.
pub fn format_time_mmss(ms: u64) -> String {
    let total_seconds = (ms + 500) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn format_time_verbose(ms: u64) -> String {
    let total_seconds = (ms + 500) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    if minutes > 0 {
        format!("{minutes} min {seconds} sec")
    } else {
        format!("{seconds} sec")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: f64,
    pub time_text: String,
    pub timed_out: bool,
}

impl ResultSummary {
    pub fn from_record(result: &ResultRecord) -> Self {
        let percentage = if result.total_questions == 0 {
            0.0
        } else {
            f64::from(result.score) * 100.0 / f64::from(result.total_questions)
        };
        let time_text = if result.timed_out {
            format!(
                "Time Limit Reached ({} min)",
                result.settings.time_limit_minutes
            )
        } else {
            format_time_verbose(result.time_taken_ms)
        };
        Self {
            score: result.score,
            total_questions: result.total_questions,
            percentage,
            time_text,
            timed_out: result.timed_out,
        }
    }
}
