//! Remote diagnostic commands
//!
//! Everything runs through `jcmd` inside the target container: one
//! invocation to list JVMs and find the right pid, then one per
//! diagnostic against that pid.

use crate::error::DiagError;
use crate::models::{DiagnosticKind, ProcessHint};

/// The jcmd tool lists its own JVM under this main class; it is never a
/// diagnostic candidate.
const JCMD_SELF: &str = "sun.tools.jcmd.JCmd";

/// Command that lists the JVMs running inside a container.
pub fn jvm_list_command() -> Vec<String> {
    vec!["jcmd".to_string(), "-l".to_string()]
}

/// Command that produces the given diagnostic for a pid.
pub fn diagnostic_command(kind: DiagnosticKind, pid: &str) -> Vec<String> {
    vec![
        "jcmd".to_string(),
        pid.to_string(),
        kind.jcmd_subcommand().to_string(),
    ]
}

/// Pick the single JVM pid out of a `jcmd -l` listing.
///
/// Listing lines are `<pid> <main class and args>`. Lines without a
/// numeric pid are ignored, as is the jcmd process itself. The hint, if
/// given, must substring-match the command line. Anything other than
/// exactly one surviving candidate is an error; the pid is never picked
/// arbitrarily.
pub fn find_jvm_pid(listing: &str, hint: Option<&ProcessHint>) -> Result<String, DiagError> {
    let mut candidates = Vec::new();

    for line in listing.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let pid = parts.next().unwrap_or("");
        let command_line = parts.next().unwrap_or("").trim();

        if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if command_line.contains(JCMD_SELF) {
            continue;
        }
        if let Some(hint) = hint {
            if !hint.matches(command_line) {
                continue;
            }
        }

        candidates.push(pid.to_string());
    }

    match candidates.as_slice() {
        [] => Err(DiagError::ProcessNotFound {
            hint: hint.map(|h| h.as_str().to_string()),
        }),
        [pid] => Ok(pid.clone()),
        several => Err(DiagError::AmbiguousProcess {
            count: several.len(),
            hint: hint.map(|h| h.as_str().to_string()),
        }),
    }
}
