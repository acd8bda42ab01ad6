use std::collections::BTreeMap;

use crate::domain::branch::{join_url, urls_match};
use crate::domain::Revision;
use crate::error::{Result, SvnFlowError};

/// A contiguous span of source revisions recorded as merged
///
/// Both ends are inclusive, the way they are written in the
/// `svn:mergeinfo` property (`5-12` covers r5 through r12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start: Revision,
    pub end: Revision,
    /// Written with a trailing `*` in the property
    pub non_inheritable: bool,
}

impl MergeRange {
    pub fn new(start: u64, end: u64) -> Self {
        MergeRange {
            start: Revision(start),
            end: Revision(end),
            non_inheritable: false,
        }
    }

    /// Parse one range token: `7`, `5-12` or `5-12*`
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let (body, non_inheritable) = match token.strip_suffix('*') {
            Some(body) => (body, true),
            None => (token, false),
        };

        let invalid = || SvnFlowError::parse(format!("Invalid merge range '{}'", token));

        let (start, end) = match body.split_once('-') {
            Some((start, end)) => (
                start.parse::<u64>().map_err(|_| invalid())?,
                end.parse::<u64>().map_err(|_| invalid())?,
            ),
            None => {
                let rev = body.parse::<u64>().map_err(|_| invalid())?;
                (rev, rev)
            }
        };

        if start > end {
            return Err(invalid());
        }

        Ok(MergeRange {
            start: Revision(start),
            end: Revision(end),
            non_inheritable,
        })
    }
}

/// Merge metadata recorded for a target: source URL -> merged ranges
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeInfo {
    sources: BTreeMap<String, Vec<MergeRange>>,
}

impl MergeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a merged range for a source URL
    pub fn insert(&mut self, source_url: impl Into<String>, range: MergeRange) {
        self.sources.entry(source_url.into()).or_default().push(range);
    }

    /// Builder-style variant of [MergeInfo::insert]
    pub fn with_range(mut self, source_url: impl Into<String>, start: u64, end: u64) -> Self {
        self.insert(source_url, MergeRange::new(start, end));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &[MergeRange])> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parse the text of an `svn:mergeinfo` property.
    ///
    /// Each line reads `/repo/relative/path:5-12,20-34*`; source paths are
    /// turned into URLs by prefixing the repository root.
    pub fn from_property(text: &str, repository_root: &str) -> Result<Self> {
        let mut info = MergeInfo::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (path, ranges) = line.rsplit_once(':').ok_or_else(|| {
                SvnFlowError::parse(format!("Invalid mergeinfo line '{}'", line))
            })?;

            let source_url = join_url(repository_root, path);
            for token in ranges.split(',').filter(|t| !t.trim().is_empty()) {
                info.insert(source_url.clone(), MergeRange::parse(token)?);
            }
        }

        Ok(info)
    }

    /// Highest merged revision recorded for `source_url`.
    ///
    /// Source URLs compare case-insensitively. Gaps between ranges are
    /// ignored; only the most recent merged point is reported.
    pub fn latest_merged_revision(&self, source_url: &str) -> Option<Revision> {
        self.sources
            .iter()
            .filter(|(url, _)| urls_match(url, source_url))
            .flat_map(|(_, ranges)| ranges.iter().map(|r| r.end))
            .max()
            .filter(|rev| !rev.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUNK: &str = "http://svn.local/svn/repo/trunk/nodered-live";

    #[test]
    fn test_parse_range_tokens() {
        assert_eq!(MergeRange::parse("5-12").unwrap(), MergeRange::new(5, 12));
        assert_eq!(MergeRange::parse("7").unwrap(), MergeRange::new(7, 7));

        let nonheritable = MergeRange::parse("20-34*").unwrap();
        assert_eq!(nonheritable.end, Revision(34));
        assert!(nonheritable.non_inheritable);

        assert!(MergeRange::parse("12-5").is_err());
        assert!(MergeRange::parse("x-5").is_err());
    }

    #[test]
    fn test_from_property() {
        let text = "/svn/repo/trunk/nodered-live:5-12,20-34\n/svn/repo/branches/old:3\n";
        let info = MergeInfo::from_property(text, "http://svn.local").unwrap();

        let sources: Vec<_> = info.sources().map(|(url, r)| (url.to_string(), r.len())).collect();
        assert_eq!(sources.len(), 2);
        assert!(sources.contains(&(TRUNK.to_string(), 2)));
        assert!(sources.contains(&("http://svn.local/svn/repo/branches/old".to_string(), 1)));
    }

    #[test]
    fn test_from_property_empty() {
        let info = MergeInfo::from_property("\n  \n", "http://svn.local").unwrap();
        assert!(info.is_empty());
    }

    #[test]
    fn test_from_property_rejects_garbage() {
        assert!(MergeInfo::from_property("no-colon-here", "http://svn.local").is_err());
    }

    #[test]
    fn test_latest_merged_revision_takes_max_end() {
        let info = MergeInfo::new().with_range(TRUNK, 20, 34).with_range(TRUNK, 5, 12);
        assert_eq!(info.latest_merged_revision(TRUNK), Some(Revision(34)));
    }

    #[test]
    fn test_latest_merged_revision_case_insensitive() {
        let info = MergeInfo::new().with_range(TRUNK.to_uppercase(), 5, 9);
        assert_eq!(info.latest_merged_revision(TRUNK), Some(Revision(9)));
    }

    #[test]
    fn test_latest_merged_revision_other_source() {
        let info = MergeInfo::new().with_range("http://svn.local/svn/repo/branches/x", 5, 9);
        assert_eq!(info.latest_merged_revision(TRUNK), None);
    }
}
