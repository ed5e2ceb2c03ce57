//! Runs declared `validator` rules and flattens every violation.

use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::ValidationFailure;

/// Key `validator` uses for struct-level (`schema`) errors.
const STRUCT_LEVEL: &str = "__all__";

/// Validates every field of `value` and returns all violations, ordered by
/// field path.
pub fn validate<T: Validate>(value: &T) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    if let Err(errors) = value.validate() {
        collect(&errors, None, &mut failures);
    }
    failures
}

fn collect(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<ValidationFailure>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (field, kind) in fields {
        let field = field.to_string();
        let path = match (prefix, field == STRUCT_LEVEL) {
            (Some(prefix), true) => prefix.to_string(),
            (Some(prefix), false) => format!("{prefix}.{field}"),
            (None, _) => field,
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let failure = if path == STRUCT_LEVEL {
                        ValidationFailure::new(describe("value", error))
                    } else {
                        ValidationFailure::for_field(&path, describe(&path, error))
                    };
                    out.push(failure);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, Some(&format!("{path}[{index}]")), out);
                }
            }
        }
    }
}

/// The rule's own message, or a default one derived from its code.
fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name).map(|v| render_number(&v.to_string()));

    match error.code.as_ref() {
        "required" => format!("The {field} field is required."),
        "length" => match (param("min"), param("max"), param("equal")) {
            (_, _, Some(equal)) => {
                format!("The field {field} must be exactly {equal} characters long.")
            }
            (Some(min), None, None) if min == "1" => format!("The {field} field is required."),
            (Some(min), Some(max), None) => {
                format!("The field {field} must be between {min} and {max} characters long.")
            }
            (Some(min), None, None) => {
                format!("The field {field} must be at least {min} characters long.")
            }
            (None, Some(max), None) => {
                format!("The field {field} must be at most {max} characters long.")
            }
            (None, None, None) => format!("The field {field} has an invalid length."),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => {
                format!("The field {field} must be in the range {min} to {max}.")
            }
            (Some(min), None) => format!("The field {field} must be at least {min}."),
            (None, Some(max)) => format!("The field {field} must be at most {max}."),
            (None, None) => format!("The field {field} is out of range."),
        },
        "email" => format!("The {field} field is not a valid e-mail address."),
        "url" => format!("The {field} field is not a valid URL."),
        code => format!("The {field} field is invalid ({code})."),
    }
}

/// `1.0` → `1`; other renderings pass through.
fn render_number(raw: &str) -> String {
    raw.strip_suffix(".0").unwrap_or(raw).to_string()
}
