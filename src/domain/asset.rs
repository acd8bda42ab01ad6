use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::domain::Revision;
use crate::error::{Result, SvnFlowError};

/// Name of the flow definition file at the root of a NodeRED project
pub const FLOWS_FILE: &str = "flows.json";

/// The files tracked for a NodeRED project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowAsset {
    Flows,
    UiHtml,
    UiJs,
    UiCss,
}

impl FlowAsset {
    pub const ALL: [FlowAsset; 4] = [
        FlowAsset::Flows,
        FlowAsset::UiHtml,
        FlowAsset::UiJs,
        FlowAsset::UiCss,
    ];

    pub const UI: [FlowAsset; 3] = [FlowAsset::UiHtml, FlowAsset::UiJs, FlowAsset::UiCss];

    pub fn is_ui(&self) -> bool {
        !matches!(self, FlowAsset::Flows)
    }

    /// File name inside its directory
    pub fn file_name(&self) -> &'static str {
        match self {
            FlowAsset::Flows => FLOWS_FILE,
            FlowAsset::UiHtml => "index.html",
            FlowAsset::UiJs => "index.js",
            FlowAsset::UiCss => "index.css",
        }
    }

    /// Path relative to the project root; UI assets live under the uibuilder path
    pub fn relative_path(&self, ui_path: &str) -> String {
        match self {
            FlowAsset::Flows => FLOWS_FILE.to_string(),
            _ => format!("uibuilder/{}/src/{}", ui_path, self.file_name()),
        }
    }
}

impl fmt::Display for FlowAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for FlowAsset {
    type Err = SvnFlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flows" | "flows.json" => Ok(FlowAsset::Flows),
            "html" | "index.html" => Ok(FlowAsset::UiHtml),
            "js" | "index.js" => Ok(FlowAsset::UiJs),
            "css" | "index.css" => Ok(FlowAsset::UiCss),
            other => Err(SvnFlowError::parse(format!(
                "Unknown asset '{}' (expected flows, html, js or css)",
                other
            ))),
        }
    }
}

/// Last-changed revision of each tracked file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetRevisions {
    pub flows: Revision,
    pub html: Revision,
    pub js: Revision,
    pub css: Revision,
}

impl AssetRevisions {
    pub fn get(&self, asset: FlowAsset) -> Revision {
        match asset {
            FlowAsset::Flows => self.flows,
            FlowAsset::UiHtml => self.html,
            FlowAsset::UiJs => self.js,
            FlowAsset::UiCss => self.css,
        }
    }

    pub fn set(&mut self, asset: FlowAsset, revision: Revision) {
        match asset {
            FlowAsset::Flows => self.flows = revision,
            FlowAsset::UiHtml => self.html = revision,
            FlowAsset::UiJs => self.js = revision,
            FlowAsset::UiCss => self.css = revision,
        }
    }
}

/// The uibuilder `url` declared in a flows.json document.
///
/// When several uibuilder nodes exist the last one wins.
pub fn uibuilder_path(flow: &str) -> Result<Option<String>> {
    let nodes: Vec<Value> = serde_json::from_str(flow)?;

    Ok(nodes
        .iter()
        .filter_map(Value::as_object)
        .filter(|node| {
            node.get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("uibuilder"))
        })
        .filter_map(|node| node.get("url").and_then(Value::as_str))
        .last()
        .map(str::to_string))
}
