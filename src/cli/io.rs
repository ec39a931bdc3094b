//! JSON output for the CLI
//!
//! One JSON object per command on stdout. Logs go to stdout/stderr as
//! separate JSON lines.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response to `out`
pub fn write_response_to<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write an error response to `out`
pub fn write_error_to<W: Write>(
    out: &mut W,
    code: &str,
    message: &str,
    requeue: bool,
) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message,
        "requeue": requeue
    });
    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_response_to(&mut io::stdout(), data)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str, requeue: bool) -> CliResult<()> {
    write_error_to(&mut io::stdout(), code, message, requeue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let mut buffer = Vec::new();
        write_response_to(&mut buffer, serde_json::json!({"summary": "OK"})).unwrap();

        let line = String::from_utf8(buffer).unwrap();
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["summary"], "OK");
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_error_shape() {
        let mut buffer = Vec::new();
        write_error_to(&mut buffer, "AddNodeFailed", "boom", true).unwrap();

        let value: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "AddNodeFailed");
        assert_eq!(value["requeue"], true);
    }
}
