//! The WebStack link catalog (`data/webstack.yml`).
//!
//! The document is kept as a raw YAML tree so key order and fields this tool
//! does not know about survive a rewrite. A typed view of categories and
//! links is built on load; every [`Link`] carries a [`LinkId`] that points
//! back into the raw tree, and all mutation goes through [`Catalog::set_logo`].

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_yaml::{Mapping, Value};

const DEFAULT_HEADER: &str = "---\n\n";

/// Position of a link inside the raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkId {
    /// `categories[category].links[index]`
    Direct { category: usize, index: usize },
    /// `categories[category].list[term].links[index]`
    Grouped {
        category: usize,
        term: usize,
        index: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub url: String,
    pub title: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermGroup {
    pub term: Option<String>,
    pub links: Vec<Link>,
}

/// A category holds direct `links`, a `list` of term groups, both, or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: Option<String>,
    pub links: Option<Vec<Link>>,
    pub terms: Option<Vec<TermGroup>>,
}

impl Category {
    /// Direct links first, then each term group's links, in document order.
    pub fn all_links(&self) -> impl Iterator<Item = &Link> {
        let grouped = self.terms.iter().flatten().flat_map(|g| g.links.iter());
        self.links.iter().flatten().chain(grouped)
    }
}

#[derive(Debug)]
pub struct Catalog {
    header: String,
    root: Vec<Value>,
    categories: Vec<Category>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let header = leading_header(content);

        let root = if header.len() == content.len() {
            Vec::new()
        } else {
            match serde_yaml::from_str::<Value>(content)? {
                Value::Null => Vec::new(),
                Value::Sequence(seq) => seq,
                other => bail!(
                    "expected a list of categories at the top level, found {}",
                    kind(&other)
                ),
            }
        };

        let categories = root
            .iter()
            .enumerate()
            .map(|(i, value)| read_category(i, value))
            .collect();

        Ok(Self {
            header,
            root,
            categories,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.categories.iter().flat_map(|c| c.all_links())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links().find(|link| link.id == id)
    }

    /// Header lines (comments, `---`) kept verbatim on save.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Overwrite one link's `logo`. Other fields and their order are left alone;
    /// a link without a `logo` key gets one appended.
    pub fn set_logo(&mut self, id: LinkId, filename: &str) -> Result<()> {
        let Some(mapping) = raw_link_mut(&mut self.root, id) else {
            bail!("No link at {:?}", id);
        };
        mapping.insert(Value::from("logo"), Value::from(filename));

        if let Some(link) = typed_link_mut(&mut self.categories, id) {
            link.logo = Some(filename.to_string());
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        let body = if self.root.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(&self.root)?
        };
        let header = if self.header.is_empty() {
            DEFAULT_HEADER
        } else {
            self.header.as_str()
        };
        Ok(format!("{header}{body}"))
    }

    /// Serialize, then replace `path` in one rename. On any error the
    /// existing file is left as it was.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
        if let Ok(meta) = std::fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.persist(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn leading_header(content: &str) -> String {
    let mut end = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" {
            end += line.len();
        } else {
            break;
        }
    }
    content[..end].to_string()
}

fn read_category(category: usize, value: &Value) -> Category {
    Category {
        name: value.get("taxonomy").and_then(scalar_string),
        links: direct_links(category, value),
        terms: term_groups(category, value),
    }
}

fn direct_links(category: usize, value: &Value) -> Option<Vec<Link>> {
    let seq = sequence(value, "links")?;
    let links = read_links(seq, |index| LinkId::Direct { category, index });
    Some(links)
}

fn term_groups(category: usize, value: &Value) -> Option<Vec<TermGroup>> {
    let seq = sequence(value, "list")?;
    let mut groups = Vec::with_capacity(seq.len());
    for (term, item) in seq.iter().enumerate() {
        let links = sequence(item, "links").unwrap_or_default();
        groups.push(TermGroup {
            term: item.get("term").and_then(scalar_string),
            links: read_links(links, |index| LinkId::Grouped {
                category,
                term,
                index,
            }),
        });
    }
    Some(groups)
}

fn sequence<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value.get(key)?.as_sequence().map(Vec::as_slice)
}

/// Entries without a string `url` and `title` are not links and are skipped.
fn read_links(seq: &[Value], id: impl Fn(usize) -> LinkId) -> Vec<Link> {
    seq.iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let url = value.get("url")?.as_str()?;
            let title = value.get("title")?.as_str()?;
            Some(Link {
                id: id(index),
                url: url.to_string(),
                title: title.to_string(),
                logo: value.get("logo").and_then(scalar_string),
            })
        })
        .collect()
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn raw_link_mut(root: &mut [Value], id: LinkId) -> Option<&mut Mapping> {
    match id {
        LinkId::Direct { category, index } => root
            .get_mut(category)?
            .get_mut("links")?
            .as_sequence_mut()?
            .get_mut(index)?
            .as_mapping_mut(),
        LinkId::Grouped {
            category,
            term,
            index,
        } => root
            .get_mut(category)?
            .get_mut("list")?
            .as_sequence_mut()?
            .get_mut(term)?
            .get_mut("links")?
            .as_sequence_mut()?
            .get_mut(index)?
            .as_mapping_mut(),
    }
}

fn typed_link_mut(categories: &mut [Category], id: LinkId) -> Option<&mut Link> {
    let category = match id {
        LinkId::Direct { category, .. } | LinkId::Grouped { category, .. } => category,
    };
    let category = categories.get_mut(category)?;
    let links = match id {
        LinkId::Direct { .. } => category.links.as_mut()?,
        LinkId::Grouped { term, .. } => &mut category.terms.as_mut()?.get_mut(term)?.links,
    };
    links.iter_mut().find(|link| link.id == id)
}
