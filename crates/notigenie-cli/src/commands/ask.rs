use anyhow::Result;

use super::parse_date;
use crate::bootstrap::AppBootstrap;

pub async fn run(app: &AppBootstrap, text: &str, session: &str, date: Option<&str>) -> Result<()> {
    let orchestrator = app.orchestrator().await?;

    let reply = match date {
        Some(raw) => {
            let date = parse_date(raw)?.format("%Y-%m-%d").to_string();
            orchestrator.handle(session, text, &date).await
        }
        None => orchestrator.handle_message(session, text).await,
    };

    println!("{}", reply);
    Ok(())
}
