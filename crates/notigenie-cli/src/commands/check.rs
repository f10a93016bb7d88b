use anyhow::Result;
use colored::Colorize;

use crate::bootstrap::AppBootstrap;

pub async fn run(app: &AppBootstrap) -> Result<()> {
    println!("{} {}", "config dir:".bright_black(), app.paths.config_dir().display());
    println!(
        "{} {} registered",
        "schemas:".bright_black(),
        app.registry.len()
    );

    match app.language_model() {
        Ok(_) => println!("{} {}", "gemini:".bright_black(), "key found".green()),
        Err(e) => println!("{} {}", "gemini:".bright_black(), e.to_string().red()),
    }

    match app.record_store() {
        Ok(store) => match store.validate_connection().await {
            Ok(()) => println!("{} {}", "notion:".bright_black(), "connected".green()),
            Err(e) => println!("{} {}", "notion:".bright_black(), e.to_string().red()),
        },
        Err(e) => println!("{} {}", "notion:".bright_black(), e.to_string().red()),
    }

    Ok(())
}
