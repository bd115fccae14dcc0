//! Resource catalog: which documentation URLs belong to which technology and
//! category.
//!
//! The catalog is an immutable value built once at start-up, either from the
//! built-in table or from a JSON file, and shared by the tool handlers.
//! Lookups are exact and case-sensitive.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog contains no technologies")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub categories: Vec<Category>,
}

impl Technology {
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Every URL of every category, in catalog order.
    pub fn all_urls(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|c| c.urls.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    technologies: Vec<Technology>,
}

impl Catalog {
    pub fn new(technologies: Vec<Technology>) -> Result<Self, CatalogError> {
        if technologies.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { technologies })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let technologies: Vec<Technology> = serde_json::from_str(json)?;
        Self::new(technologies)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn technologies(&self) -> &[Technology] {
        &self.technologies
    }

    pub fn technology(&self, name: &str) -> Option<&Technology> {
        self.technologies.iter().find(|t| t.name == name)
    }

    pub fn technology_names(&self) -> impl Iterator<Item = &str> {
        self.technologies.iter().map(|t| t.name.as_str())
    }

    /// Resolves the URLs for a technology.
    ///
    /// With a category that exists under the technology, only that category's
    /// URLs are returned. A missing or unknown category yields every URL of
    /// the technology. Returns `None` for an unknown technology.
    pub fn urls(&self, technology: &str, category: Option<&str>) -> Option<Vec<String>> {
        let tech = self.technology(technology)?;
        let urls = match category.and_then(|c| tech.category(c)) {
            Some(category) => category.urls.clone(),
            None => tech.all_urls(),
        };
        Some(urls)
    }
}

fn entry(name: &str, categories: Vec<(&str, Vec<&str>)>) -> Technology {
    Technology {
        name: name.to_string(),
        categories: categories
            .into_iter()
            .map(|(category, urls)| Category {
                name: category.to_string(),
                urls: urls.into_iter().map(str::to_string).collect(),
            })
            .collect(),
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            technologies: vec![
                entry(
                    "angular",
                    vec![
                        ("docs", vec!["https://angular.dev/llms.txt"]),
                        ("guides", vec!["https://angular.dev/llms-full.txt"]),
                        (
                            "api",
                            vec!["https://raw.githubusercontent.com/angular/angular/main/adev/src/content/reference/api/README.md"],
                        ),
                        (
                            "cli",
                            vec!["https://raw.githubusercontent.com/angular/angular-cli/main/README.md"],
                        ),
                    ],
                ),
                entry(
                    "typescript",
                    vec![
                        (
                            "docs",
                            vec!["https://raw.githubusercontent.com/microsoft/TypeScript/main/README.md"],
                        ),
                        (
                            "handbook",
                            vec![
                                "https://raw.githubusercontent.com/microsoft/TypeScript-Website/v2/packages/documentation/copy/en/handbook-v2/Basics.md",
                                "https://raw.githubusercontent.com/microsoft/TypeScript-Website/v2/packages/documentation/copy/en/handbook-v2/Everyday%20Types.md",
                            ],
                        ),
                    ],
                ),
                entry(
                    "rxjs",
                    vec![
                        (
                            "docs",
                            vec!["https://raw.githubusercontent.com/ReactiveX/rxjs/master/README.md"],
                        ),
                        (
                            "operators",
                            vec!["https://raw.githubusercontent.com/ReactiveX/rxjs/master/apps/rxjs.dev/content/guide/operators.md"],
                        ),
                    ],
                ),
                entry(
                    "testing",
                    vec![
                        (
                            "jest",
                            vec!["https://raw.githubusercontent.com/jestjs/jest/main/docs/GettingStarted.md"],
                        ),
                        (
                            "jasmine",
                            vec!["https://raw.githubusercontent.com/jasmine/jasmine/main/README.md"],
                        ),
                    ],
                ),
                entry(
                    "nx",
                    vec![
                        ("docs", vec!["https://nx.dev/llms.txt"]),
                        ("recipes", vec!["https://nx.dev/llms-full.txt"]),
                    ],
                ),
            ],
        }
    }
}
