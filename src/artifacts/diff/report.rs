use crate::artifacts::diff::manifest_diff::ManifestDiff;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Markdown,
}

pub const FORMATS: phf::Map<&'static str, Format> = phf::phf_map! {
    "text" => Format::Text,
    "markdown" => Format::Markdown,
};

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FORMATS
            .get(s)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unsupported format {}", s))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Markdown => write!(f, "markdown"),
        }
    }
}

impl ManifestDiff {
    pub fn summary(&self) -> String {
        format!(
            "{} files changed: {} removed, {} renamed, {} added, {} changed content",
            self.len(),
            self.removed().len(),
            self.renamed().len(),
            self.added().len(),
            self.changed_content().len(),
        )
    }

    pub fn render(&self, format: Format) -> String {
        match format {
            Format::Text => self.render_text(),
            Format::Markdown => self.render_markdown(),
        }
    }

    fn render_text(&self) -> String {
        let mut out = format!("{}\n", self.summary());

        if !self.removed().is_empty() {
            out.push_str("\nFiles removed:\n\n");
            for node in self.removed().values() {
                out.push_str(&format!("- {node}\n"));
            }
        }
        if !self.renamed().is_empty() {
            out.push_str("\nFiles renamed:\n\n");
            for change in self.renamed().values() {
                out.push_str(&format!("- {}\n+ {}\n", change.from(), change.to()));
            }
        }
        if !self.added().is_empty() {
            out.push_str("\nFiles added:\n\n");
            for node in self.added().values() {
                out.push_str(&format!("+ {node}\n"));
            }
        }
        if !self.changed_content().is_empty() {
            out.push_str("\nFiles changed content:\n\n");
            for change in self.changed_content().values() {
                out.push_str(change.diff());
                out.push('\n');
            }
        }

        out
    }

    fn render_markdown(&self) -> String {
        let mut out = format!("> _{}_\n", self.summary());

        if !self.removed().is_empty() {
            out.push_str("\n# Files removed:\n\n```diff\n");
            for node in self.removed().values() {
                out.push_str(&format!("- {node}\n"));
            }
            out.push_str("```\n");
        }
        if !self.renamed().is_empty() {
            out.push_str("\n# Files renamed:\n\n```diff\n");
            for change in self.renamed().values() {
                out.push_str(&format!("- {}\n+ {}\n", change.from(), change.to()));
            }
            out.push_str("```\n");
        }
        if !self.added().is_empty() {
            out.push_str("\n# Files added:\n\n```diff\n");
            for node in self.added().values() {
                out.push_str(&format!("+ {node}\n"));
            }
            out.push_str("```\n");
        }
        if !self.changed_content().is_empty() {
            out.push_str("\n# Files changed content:\n\n");
            for (path, change) in self.changed_content() {
                out.push_str(&format!("## `{path}`:\n```diff\n{}\n```\n", change.diff()));
            }
        }

        out
    }
}
