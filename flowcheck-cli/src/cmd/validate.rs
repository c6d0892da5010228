use std::path::Path;

use flowcheck_core::{
    parse_environment_str, parse_flow_str, validate_environment, DocumentFormat, Validate,
};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::read_file;
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(path: &Path, env_path: Option<&Path>, output: OutputArgs) -> i32 {
    let Some(content) = read_file(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let parsed = match parse_flow_str(&content, DocumentFormat::Auto) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let mut errors: Vec<String> = match parsed.value.validate() {
        Ok(()) => Vec::new(),
        Err(err) => err.violations.iter().map(ToString::to_string).collect(),
    };

    if let Some(env_path) = env_path {
        let Some(env_content) = read_file(env_path, &output) else {
            return exit_codes::RUNTIME_ERROR;
        };
        match parse_environment_str(&env_content, DocumentFormat::Auto) {
            Ok(env) => {
                if let Err(err) = validate_environment(&env.value) {
                    errors.extend(err.violations.iter().map(|v| format!("env: {v}")));
                }
            }
            Err(e) => errors.push(format!("env: {e}")),
        }
    }

    let result = ValidateResult {
        valid: errors.is_empty(),
        format: format!("{:?}", parsed.format),
        errors,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        if result.valid {
            println!("ok: flow `{}` is valid ({:?})", parsed.value.flow_id, parsed.format);
        } else {
            eprintln!("error: validation failed");
            for e in &result.errors {
                eprintln!("- {e}");
            }
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}
