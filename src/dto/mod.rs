use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod codes;
pub mod health;
pub mod prefs;
pub mod redeemed;
pub mod sse;
pub mod validation;

fn format_epoch_secs(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
