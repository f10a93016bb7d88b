use colored::Colorize;

use crate::bootstrap::AppBootstrap;

pub fn run(app: &AppBootstrap) {
    if app.registry.is_empty() {
        println!(
            "{}",
            format!(
                "No schemas found in {}",
                app.paths.schemas_dir(&app.config).display()
            )
            .yellow()
        );
        return;
    }

    for schema in app.registry.iter() {
        println!("{}", schema.summary_line().bright_cyan());
        for prop in &schema.properties {
            let options = if prop.options.is_empty() {
                String::new()
            } else {
                format!(" [{}]", prop.options.join(", "))
            };
            println!(
                "    {} {}{}",
                prop.name,
                format!("({})", prop.property_type).bright_black(),
                options
            );
        }
    }
}
