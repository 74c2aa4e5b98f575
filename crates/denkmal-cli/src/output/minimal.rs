use serde_json::Value;

use super::{format_scalar, result_of};

/// Key answers in order of priority, as paths into the result object.
const PRIORITY_PATHS: [&[&str]; 6] = [
    &["kpis", "irr", "rate"],
    &["kpis", "total_profit"],
    &["investment", "total_investment"],
    &["subsidized_loan_base"],
    &["total_special"],
    &["years"],
];

/// Print just the key answer of a command.
///
/// Walks the priority paths and prints the first non-null hit, falling back
/// to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    for path in PRIORITY_PATHS {
        if let Some(hit) = lookup(result, path).filter(|v| !v.is_null()) {
            match hit {
                Value::Array(items) => println!("{} rows", items.len()),
                _ => println!("{}", format_scalar(hit)),
            }
            return;
        }
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, format_scalar(val));
        return;
    }

    println!("{}", format_scalar(result));
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}
