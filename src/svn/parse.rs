//! Parsers for the plain-text output of the `svn` client.
//!
//! The client is always run with `LC_ALL=C` so the labels below are stable.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{ChangeAction, ChangedPath, LogEntry, Revision};
use crate::error::{Result, SvnFlowError};
use crate::svn::{RepositoryInfo, StatusEntry, StatusKind};

/// Error codes that mean "this path does not exist (at that revision)"
const NOT_FOUND_CODES: &[u32] = &[
    155010, // working-copy path not found
    160006, // no such revision
    160013, // path not found in the filesystem
    170000, // URL non-existent in revision
    200009, // targets don't exist
];

/// Messages that mean "not found" when no error code was printed
const NOT_FOUND_MESSAGES: &[&str] = &[
    "non-existent",
    "was not found.",
    "path not found:",
    "doesn't exist",
];

/// Warning printed by `svn propget` when the property is not set
const PROPERTY_NOT_FOUND: &str = "W200017";

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn log_header_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^r(\d+) \| (.*?) \| (.*?) \| (\d+) lines?$")
}

fn changed_path_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^\s+([ADMR]) (.+?)(?: \(from (.+):(\d+)\))?$")
}

fn error_code_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"\b[EW](\d{6}):")
}

fn committed_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"Committed revision (\d+)\.")
}

/// Parse `svn info` output (`Key: Value` lines)
pub fn parse_info(output: &str) -> Result<RepositoryInfo> {
    let fields: HashMap<&str, &str> = output
        .lines()
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let field = |key: &str| {
        fields
            .get(key)
            .copied()
            .ok_or_else(|| SvnFlowError::parse(format!("svn info output lacks '{}'", key)))
    };

    let revision: Revision = field("Revision")?.parse()?;
    let last_changed_revision = match fields.get("Last Changed Rev") {
        Some(rev) => rev.parse()?,
        None => revision,
    };

    Ok(RepositoryInfo {
        url: field("URL")?.to_string(),
        repository_root: field("Repository Root")?.to_string(),
        revision,
        last_changed_revision,
    })
}

/// Parse `svn status` output
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
    output
        .lines()
        .filter(|line| line.len() > 8 && line.as_bytes()[7] == b' ')
        .filter(|line| !line.starts_with("Performing") && !line.starts_with("Summary"))
        .filter_map(|line| {
            let mut codes = line.chars();
            let item = codes.next()?;
            let props = codes.next()?;
            let kind = match (item, props) {
                (' ', 'M') => StatusKind::Modified,
                (code, _) => StatusKind::from_code(code),
            };
            let path = line.get(8..)?.trim();
            if path.is_empty() || path.starts_with('>') {
                return None;
            }
            Some(StatusEntry {
                path: PathBuf::from(path),
                kind,
            })
        })
        .collect()
}

/// Parse `svn list` output into entry names
pub fn parse_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().trim_end_matches('/'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `svn log -v` output, newest entry first
pub fn parse_log(output: &str) -> Result<Vec<LogEntry>> {
    let (Some(header_re), Some(path_re)) = (log_header_re(), changed_path_re()) else {
        return Err(SvnFlowError::parse("Invalid svn log patterns"));
    };

    let lines: Vec<&str> = output.lines().collect();
    let mut entries = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = header_re.captures(lines[i]) else {
            i += 1;
            continue;
        };

        let revision: u64 = caps[1]
            .parse()
            .map_err(|_| SvnFlowError::parse(format!("Invalid log header '{}'", lines[i])))?;
        let message_lines: usize = caps[4].parse().unwrap_or(0);

        let mut entry = LogEntry::new(revision);
        entry.author = caps[2].to_string();
        i += 1;

        if lines.get(i).is_some_and(|l| l.starts_with("Changed paths:")) {
            i += 1;
            while let Some(path_caps) = lines.get(i).and_then(|l| path_re.captures(l)) {
                let action = path_caps[1]
                    .chars()
                    .next()
                    .and_then(ChangeAction::from_code)
                    .unwrap_or(ChangeAction::Modified);
                let change = match (path_caps.get(3), path_caps.get(4)) {
                    (Some(from), Some(rev)) => ChangedPath {
                        action,
                        copy_from_path: Some(from.as_str().to_string()),
                        copy_from_revision: rev.as_str().parse().ok().map(Revision),
                    },
                    _ => ChangedPath::new(action),
                };
                entry.changed_paths.insert(path_caps[2].to_string(), change);
                i += 1;
            }
        }

        // blank line between header block and message
        if lines.get(i).is_some_and(|l| l.is_empty()) {
            i += 1;
        }

        let end = (i + message_lines).min(lines.len());
        entry.message = lines[i..end].join("\n");
        i = end;

        entries.push(entry);
    }

    Ok(entries)
}

/// Revision reported by `svn commit` / `svn copy`, if anything was committed
pub fn parse_committed_revision(output: &str) -> Option<Revision> {
    committed_re()?
        .captures(output)
        .and_then(|caps| caps[1].parse().ok())
        .map(Revision)
}

/// Numeric `E`/`W` codes printed on stderr, in order of appearance
pub fn error_codes(stderr: &str) -> Vec<u32> {
    let Some(re) = error_code_re() else {
        return Vec::new();
    };
    re.captures_iter(stderr)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// True when `svn propget` failed only because the property is unset
pub fn is_missing_property(stderr: &str) -> bool {
    stderr.contains(PROPERTY_NOT_FOUND)
}

/// Map a failed svn invocation to an error kind.
///
/// The numeric error codes are authoritative. Inspecting the human-readable
/// message is a compatibility shim for output without codes.
pub fn classify_error(context: &str, stderr: &str) -> SvnFlowError {
    let message = format!("{}: {}", context, stderr.trim());
    let codes = error_codes(stderr);

    let not_found = if codes.is_empty() {
        NOT_FOUND_MESSAGES.iter().any(|m| stderr.contains(m))
    } else {
        codes.iter().any(|code| NOT_FOUND_CODES.contains(code))
    };

    if not_found {
        SvnFlowError::not_found(message)
    } else {
        SvnFlowError::backend(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = "\
Path: nodered-live
URL: http://svn.local/svn/repo/branches/feature
Relative URL: ^/branches/feature
Repository Root: http://svn.local/svn/repo
Repository UUID: 0b5f3a5e-1111-2222-3333-444455556666
Revision: 42
Node Kind: directory
Last Changed Author: tom
Last Changed Rev: 40
Last Changed Date: 2022-10-14 12:00:00 +0200 (Fri, 14 Oct 2022)
";

    const LOG: &str = "\
------------------------------------------------------------------------
r12 | tom | 2022-10-15 09:00:00 +0200 (Sat, 15 Oct 2022) | 2 lines
Changed paths:
   M /branches/feature/flows.json

Update flow
second line
------------------------------------------------------------------------
r9 | tom | 2022-10-14 12:00:00 +0200 (Fri, 14 Oct 2022) | 1 line
Changed paths:
   A /branches/feature (from /trunk/nodered-live:8)

Branch created
------------------------------------------------------------------------
";

    #[test]
    fn test_parse_info() {
        let info = parse_info(INFO).unwrap();
        assert_eq!(info.url, "http://svn.local/svn/repo/branches/feature");
        assert_eq!(info.repository_root, "http://svn.local/svn/repo");
        assert_eq!(info.revision, Revision(42));
        assert_eq!(info.last_changed_revision, Revision(40));
    }

    #[test]
    fn test_parse_info_missing_field() {
        assert!(parse_info("Path: x\n").is_err());
    }

    #[test]
    fn test_parse_status() {
        let output = "\
M       /home/tom/.node-red/flows.json
?       /home/tom/.node-red/notes.txt
 M      /home/tom/.node-red
!       /home/tom/.node-red/gone.js
";
        let entries = parse_status(output);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].kind, StatusKind::Modified);
        assert_eq!(entries[0].path, PathBuf::from("/home/tom/.node-red/flows.json"));
        assert_eq!(entries[1].kind, StatusKind::Unversioned);
        assert_eq!(entries[2].kind, StatusKind::Modified);
        assert_eq!(entries[3].kind, StatusKind::Other('!'));
    }

    #[test]
    fn test_parse_list() {
        let names = parse_list("feature/\nhotfix/\n\n");
        assert_eq!(names, vec!["feature".to_string(), "hotfix".to_string()]);
    }

    #[test]
    fn test_parse_log() {
        let entries = parse_log(LOG).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].revision, Revision(12));
        assert_eq!(entries[0].message, "Update flow\nsecond line");
        assert!(!entries[0].copies("/branches/feature"));

        let creation = &entries[1];
        assert_eq!(creation.revision, Revision(9));
        assert_eq!(creation.author, "tom");
        let path = &creation.changed_paths["/branches/feature"];
        assert_eq!(path.action, ChangeAction::Added);
        assert_eq!(path.copy_from_path.as_deref(), Some("/trunk/nodered-live"));
        assert_eq!(path.copy_from_revision, Some(Revision(8)));
    }

    #[test]
    fn test_parse_log_without_changed_paths() {
        let output = "\
------------------------------------------------------------------------
r3 | (no author) | (no date) | 1 line

Initial import
------------------------------------------------------------------------
";
        let entries = parse_log(output).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Initial import");
        assert!(entries[0].changed_paths.is_empty());
    }

    #[test]
    fn test_parse_log_message_resembling_header() {
        let output = "\
------------------------------------------------------------------------
r5 | tom | 2022-10-14 | 1 line

r4 | fake | header | 1 line
------------------------------------------------------------------------
";
        let entries = parse_log(output).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].revision, Revision(5));
    }

    #[test]
    fn test_parse_committed_revision() {
        let output = "Sending        flows.json\n\
                      Transmitting file data .done\n\
                      Committing transaction...\n\
                      Committed revision 43.\n";
        assert_eq!(parse_committed_revision(output), Some(Revision(43)));
        assert_eq!(parse_committed_revision(""), None);
    }

    #[test]
    fn test_classify_by_code() {
        let err = classify_error(
            "export",
            "svn: E160013: '/svn/repo/!svn/rvr/5/branches/x/flows.json' path not found",
        );
        assert!(err.is_not_found());

        let err = classify_error("info", "svn: E170013: Unable to connect to a repository at URL");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("E170013"));
    }

    #[test]
    fn test_classify_warning_code() {
        let stderr = "svn: warning: W170000: URL 'http://x/flows.json' \
                      non-existent in revision 12\n\
                      svn: E200009: Could not display info for all targets \
                      because some targets don't exist";
        assert!(classify_error("info", stderr).is_not_found());
    }

    #[test]
    fn test_classify_auth_error_with_misleading_text() {
        // code wins over message text
        let stderr = "svn: E215004: Authentication failed and path not found: \
                      interactive prompting disabled";
        assert!(!classify_error("info", stderr).is_not_found());
    }

    #[test]
    fn test_classify_by_message_shim() {
        let stderr = "uibuilder/dash/src/index.js was not found.";
        assert!(classify_error("export", stderr).is_not_found());
        assert!(!classify_error("export", "connection reset").is_not_found());
    }

    #[test]
    fn test_missing_property() {
        assert!(is_missing_property(
            "svn: warning: W200017: Property 'svn:mergeinfo' not found on 'x'"
        ));
        assert!(!is_missing_property("svn: E170013: Unable to connect"));
    }

    #[test]
    fn test_patterns_compile() {
        assert!(log_header_re().is_some());
        assert!(changed_path_re().is_some());
        assert!(error_code_re().is_some());
        assert!(committed_re().is_some());
    }
}
