use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    /// Graphviz, for `plan` only.
    Dot,
}

/// Machine output: compact JSON for `json`, pretty JSON otherwise.
pub fn print_result<T: Serialize>(format: OutputFormat, quiet: bool, result: &T) {
    if quiet {
        return;
    }
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(result),
        OutputFormat::Text | OutputFormat::Dot => serde_json::to_string_pretty(result),
    };
    if let Ok(s) = rendered {
        println!("{s}");
    }
}

pub fn print_error(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Json => {
            let err = serde_json::json!({"error": message});
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
        }
        OutputFormat::Text | OutputFormat::Dot => eprintln!("error: {message}"),
    }
}

/// Prints human text unless quiet or a machine format was asked for.
pub fn print_text(format: OutputFormat, quiet: bool, text: &str) -> bool {
    if quiet || format != OutputFormat::Text {
        return false;
    }
    print!("{text}");
    true
}
