//! Script input and replay loop

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::command::parse_command;
use crate::handler::{CommandHandler, Reply};

/// Counters for one replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub executed: usize,
    pub malformed: usize,
}

/// Open the script at `path`, or stdin when no path is given
pub fn open_script(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Execute every line of `input`, writing one reply line per command
///
/// Malformed lines produce an `ERR` reply and the run continues.
pub fn run_script<R: BufRead, W: Write>(
    handler: &CommandHandler,
    input: R,
    mut output: W,
) -> Result<Summary> {
    let mut summary = Summary::default();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_no))?;

        let reply = match parse_command(&line) {
            Ok(Some(cmd)) => {
                summary.executed += 1;
                handler.handle(cmd)
            }
            Ok(None) => continue,
            Err(msg) => {
                warn!(line = line_no, error = %msg, "malformed command");
                summary.malformed += 1;
                Reply::Error(msg)
            }
        };

        writeln!(output, "{}", reply)?;
    }

    output.flush()?;
    debug!(
        executed = summary.executed,
        malformed = summary.malformed,
        "script finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrucache::SharedLruCache;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn handler(capacity: usize) -> CommandHandler {
        CommandHandler::new(Arc::new(SharedLruCache::new(capacity).unwrap()))
    }

    fn replay(capacity: usize, script: &str) -> (String, Summary) {
        let mut out = Vec::new();
        let summary = run_script(&handler(capacity), script.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn test_run_eviction_script() {
        let script = "\
# capacity 2
SET a 1
SET b 2
GET a
SET c 3
GET b
GET a
GET c
LEN
";
        let (out, summary) = replay(2, script);

        assert_eq!(out, "OK\nOK\n1\nOK\n(nil)\n1\n3\n2\n");
        assert_eq!(summary, Summary { executed: 8, malformed: 0 });
    }

    #[test]
    fn test_run_overwrite_script() {
        let script = "SET a 1\nSET b 2\nSET a 9\nSET c 3\nKEYS\nGET a\n";
        let (out, _) = replay(2, script);

        assert_eq!(out, "OK\nOK\nOK\nOK\na c\n9\n");
    }

    #[test]
    fn test_run_continues_after_error() {
        let script = "SET a 1\nBOGUS\nGET\nGET a\n";
        let (out, summary) = replay(4, script);

        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "OK");
        assert_eq!(lines[1], "ERR unknown command 'BOGUS'");
        assert!(lines[2].starts_with("ERR wrong number"));
        assert_eq!(lines[3], "1");
        assert_eq!(summary, Summary { executed: 2, malformed: 2 });
    }

    #[test]
    fn test_open_script_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SET k v").unwrap();
        writeln!(file, "GET k").unwrap();

        let input = open_script(Some(file.path())).unwrap();
        let mut out = Vec::new();
        run_script(&handler(2), input, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "OK\nv\n");
    }

    #[test]
    fn test_open_missing_script() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.txt");

        let err = open_script(Some(missing.as_path())).err().unwrap();
        assert!(err.to_string().contains("failed to open script"));
    }
}
