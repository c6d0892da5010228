use crate::expressions::is_valid_variable_name;
use crate::types::Environment;
use crate::validate::validator::Validator;

pub(crate) fn validate_environment(v: &mut Validator, env: &Environment) {
    let base = env.base_url.trim();
    if base.is_empty() {
        v.push("baseUrl", "must not be empty");
    } else if !(base.starts_with("http://") || base.starts_with("https://")) {
        v.push("baseUrl", "must be an absolute http(s) URL");
    }

    for name in env.variables.keys() {
        if !is_valid_variable_name(name) {
            v.push(
                format!("variables.{name}"),
                "variable names must match [A-Za-z_][A-Za-z0-9_.-]*",
            );
        }
    }
}
