//! Reply printing shared by the handlers.

use serde::Serialize;

use crate::error::Result;
use crate::manager::Reply;

/// Print `reply` as pretty JSON when `json` is set, otherwise hand a
/// successful reply to `human` and print failures to stderr.
pub(crate) fn emit<T: Serialize>(
    reply: &Reply<T>,
    json: bool,
    human: impl FnOnce(&T, Option<&str>),
) -> Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
        return Ok(reply.is_success());
    }

    match reply.data() {
        Some(data) if reply.is_success() => human(data, reply.message()),
        _ => eprintln!("Error: {}", reply.message().unwrap_or("operation failed")),
    }
    Ok(reply.is_success())
}
