pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Load a record from `--input`, falling back to piped stdin.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<T, Box<dyn std::error::Error>> {
    let value = load_value(path)?;
    Ok(serde_json::from_value(value)?)
}

/// Load a raw JSON value from `--input`, falling back to piped stdin.
pub fn load_value(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_value(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err("--input <file.json|file.yaml> or stdin required".into())
    }
}
