//! Documentation tools exposed over `tools/list` and `tools/call`.
//!
//! Each tool resolves its URLs, fetches them through the [`CachedFetcher`] and
//! renders the bodies as a single text block. Fetch failures are rendered as
//! text as well, so a failed download is still a successful tool call.

use itertools::Itertools;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool, object};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::resources::CachedFetcher;

pub const ANGULAR_DOCS: &str = "get_angular_docs";
pub const TECH_DOCS: &str = "get_tech_docs";
pub const CUSTOM_RESOURCE: &str = "get_custom_resource";

/// Placed between the bodies of a multi-URL result.
pub const SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The two canonical Angular documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngularSources {
    pub summary: String,
    pub full: String,
}

impl Default for AngularSources {
    fn default() -> Self {
        Self {
            summary: "https://angular.dev/llms.txt".to_string(),
            full: "https://angular.dev/llms-full.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Full,
    Summary,
    #[default]
    Both,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Full => "full",
            Section::Summary => "summary",
            Section::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AngularDocsArgs {
    #[serde(default)]
    pub section: Section,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechDocsArgs {
    pub technology: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceArgs {
    pub url: String,
    #[serde(default)]
    pub cache_key: Option<String>,
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    tool: &'static str,
    arguments: Option<JsonObject>,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

/// The documentation tool set.
#[derive(Clone)]
pub struct DocTools {
    fetcher: CachedFetcher,
    catalog: Arc<Catalog>,
    angular: AngularSources,
}

impl DocTools {
    pub fn new(fetcher: CachedFetcher, catalog: Arc<Catalog>, angular: AngularSources) -> Self {
        Self {
            fetcher,
            catalog,
            angular,
        }
    }

    /// Tool definitions in advertised order. The technology and category
    /// enumerations are taken from the catalog.
    pub fn definitions(&self) -> Vec<Tool> {
        let technologies: Vec<&str> = self.catalog.technology_names().collect();
        let categories: Vec<&str> = self
            .catalog
            .technologies()
            .iter()
            .flat_map(|tech| tech.categories.iter().map(|c| c.name.as_str()))
            .unique()
            .collect();

        vec![
            Tool::new(
                ANGULAR_DOCS,
                "Fetch the official Angular documentation from angular.dev. \
                 Choose the concise summary, the full reference, or both.",
                object(json!({
                    "type": "object",
                    "properties": {
                        "section": {
                            "type": "string",
                            "enum": ["full", "summary", "both"],
                            "description": "Which Angular document to return (default: both)"
                        }
                    },
                    "required": []
                })),
            ),
            Tool::new(
                TECH_DOCS,
                "Fetch documentation for a web development technology, optionally \
                 narrowed to one category.",
                object(json!({
                    "type": "object",
                    "properties": {
                        "technology": {
                            "type": "string",
                            "enum": technologies,
                            "description": "Technology to fetch documentation for"
                        },
                        "category": {
                            "type": "string",
                            "enum": categories,
                            "description": "Documentation category; all categories are returned when omitted"
                        }
                    },
                    "required": ["technology"]
                })),
            ),
            Tool::new(
                CUSTOM_RESOURCE,
                "Fetch any documentation resource by URL. Results are cached for the day.",
                object(json!({
                    "type": "object",
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "URL of the resource to fetch"
                        },
                        "cacheKey": {
                            "type": "string",
                            "description": "Optional cache key; defaults to the URL plus the current day"
                        }
                    },
                    "required": ["url"]
                })),
            ),
        ]
    }

    /// Runs a tool by name.
    ///
    /// An unknown name is answered with empty text content rather than an
    /// error, which existing clients rely on.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ToolError> {
        let text = match name {
            ANGULAR_DOCS => self.angular_docs(parse_args(ANGULAR_DOCS, arguments)?).await,
            TECH_DOCS => self.tech_docs(parse_args(TECH_DOCS, arguments)?).await,
            CUSTOM_RESOURCE => {
                self.custom_resource(parse_args(CUSTOM_RESOURCE, arguments)?)
                    .await
            }
            other => {
                tracing::warn!("Unknown tool requested: {}", other);
                String::new()
            }
        };
        Ok(text_result(text))
    }

    pub fn angular_urls(&self, section: Section) -> Vec<String> {
        match section {
            Section::Full => vec![self.angular.full.clone()],
            Section::Summary => vec![self.angular.summary.clone()],
            Section::Both => vec![self.angular.summary.clone(), self.angular.full.clone()],
        }
    }

    pub async fn angular_docs(&self, args: AngularDocsArgs) -> String {
        let urls = self.angular_urls(args.section);
        match self.fetcher.fetch_each(&urls).await.into_all() {
            Ok(bodies) => format!(
                "# Angular Documentation ({})\n\n{}",
                args.section.as_str(),
                bodies.join(SEPARATOR)
            ),
            Err(err) => format!("Error fetching Angular documentation: {}", err),
        }
    }

    pub async fn tech_docs(&self, args: TechDocsArgs) -> String {
        let category = args.category.as_deref();
        let Some(urls) = self.catalog.urls(&args.technology, category) else {
            return format!(
                "Unknown technology \"{}\". Available technologies: {}",
                args.technology,
                self.catalog.technology_names().join(", ")
            );
        };

        let tech = args.technology.to_uppercase();
        match self.fetcher.fetch_each(&urls).await.into_all() {
            Ok(bodies) => {
                let title = match category {
                    Some(category) => format!("# {} Documentation - {}", tech, category),
                    None => format!("# {} Documentation", tech),
                };
                format!("{}\n\n{}", title, bodies.join(SEPARATOR))
            }
            Err(err) => format!("Error fetching {} documentation: {}", tech, err),
        }
    }

    pub async fn custom_resource(&self, args: CustomResourceArgs) -> String {
        match self
            .fetcher
            .fetch(&args.url, args.cache_key.as_deref())
            .await
        {
            Ok(body) => format!("# Resource: {}\n\n{}", args.url, body),
            Err(err) => format!("Error fetching resource {}: {}", args.url, err),
        }
    }
}
