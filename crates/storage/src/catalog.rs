//! Read-only view of the scanner output (`projects.json`): a tree of
//! school → class → projects, indexed by project id.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::ProjectRecord;

/// One project as written by the catalog scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

pub type CatalogTree = BTreeMap<String, BTreeMap<String, Vec<CatalogEntry>>>;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tree: CatalogTree,
    index: HashMap<String, ProjectRecord>,
    order: Vec<String>,
}

impl Catalog {
    pub fn new(tree: CatalogTree) -> Self {
        let mut index = HashMap::new();
        let mut order = Vec::new();

        for (school, classes) in &tree {
            for (class, entries) in classes {
                for entry in entries {
                    if index.contains_key(&entry.id) {
                        tracing::warn!(
                            "Duplicate project id '{}' in catalog, keeping the first occurrence",
                            entry.id
                        );
                        continue;
                    }

                    order.push(entry.id.clone());
                    index.insert(
                        entry.id.clone(),
                        ProjectRecord {
                            id: entry.id.clone(),
                            name: entry.name.clone(),
                            school: school.clone(),
                            class: class.clone(),
                            description: entry.description.clone(),
                        },
                    );
                }
            }
        }

        Self { tree, index, order }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tree: CatalogTree = serde_json::from_str(json)?;
        Ok(Self::new(tree))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub fn find(&self, project_id: &str) -> Option<&ProjectRecord> {
        self.index.get(project_id)
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.index.contains_key(project_id)
    }

    /// Every known project, in school / class / listing order.
    pub fn records(&self) -> impl Iterator<Item = &ProjectRecord> + '_ {
        self.order.iter().filter_map(|id| self.index.get(id))
    }

    pub fn tree(&self) -> &CatalogTree {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
