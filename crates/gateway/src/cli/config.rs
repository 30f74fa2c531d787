use hub_domain::config::{Config, ConfigSeverity, DirectoryBackend};

/// Parse and validate the config, printing issues and a short summary of
/// what the gateway would boot with.
///
/// Returns `false` when any error-level issue was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    for issue in &issues {
        println!("{issue}");
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    if issues.is_empty() {
        println!("Config OK ({config_path})");
    } else {
        println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");
    }

    println!();
    for line in summary(config) {
        println!("  {line}");
    }

    error_count == 0
}

fn summary(config: &Config) -> Vec<String> {
    let directory = match config.directory.backend {
        DirectoryBackend::Airtable => format!(
            "airtable ({}/{})",
            config.directory.airtable.base_id, config.directory.airtable.table
        ),
        DirectoryBackend::Static => format!("static ({} people)", config.directory.people.len()),
    };
    let notifier = match config.notify.resolve_webhook_url() {
        Some(_) => "webhook",
        None => "log only",
    };
    let secret = match std::env::var(&config.auth.secret_env) {
        Ok(v) if !v.trim().is_empty() => "set",
        _ => "NOT SET (random per process)",
    };
    let bypass = match &config.auth.bypass {
        Some(b) => format!("configured for {} (${})", b.email, b.pin_env),
        None => "off".to_string(),
    };

    vec![
        format!("public url:   {}", config.server.public_base()),
        format!("directory:    {directory}"),
        format!("login mail:   {notifier}"),
        format!("token secret: ${} {secret}", config.auth.secret_env),
        format!("bypass:       {bypass}"),
        format!("classifier:   {}", config.classifier.model),
    ]
}

/// Dump the resolved config (with all defaults filled in) as TOML.
/// Inline secret values are masked.
pub fn show(config: &Config) {
    let mut redacted = config.clone();
    for key in [
        &mut redacted.classifier.api_key.key,
        &mut redacted.directory.airtable.api_key.key,
    ] {
        if key.is_some() {
            *key = Some("********".into());
        }
    }

    match toml::to_string_pretty(&redacted) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}
