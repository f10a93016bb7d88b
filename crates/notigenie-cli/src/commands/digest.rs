use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};

use super::parse_date;
use crate::bootstrap::AppBootstrap;

pub async fn run(app: &AppBootstrap, date: Option<&str>) -> Result<()> {
    let today = match date {
        Some(raw) => parse_date(raw)?,
        None => {
            let offset = FixedOffset::east_opt(app.config.pipeline.timezone_offset_hours * 3600)
                .context("Invalid pipeline.timezone_offset_hours")?;
            Utc::now().with_timezone(&offset).date_naive()
        }
    };

    let report = app.digest()?.build(today).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
