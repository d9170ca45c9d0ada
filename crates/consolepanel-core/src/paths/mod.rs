//! Separator-agnostic directory paths for the folder picker.
//!
//! Directory strings come back from the host tools in whatever convention the
//! host uses. [`PathSegments`] holds them as a root plus a list of components
//! so breadcrumbs and navigation never split on a separator character.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRoot {
    /// No root; the path is relative
    Relative,
    /// `/` on Unix-style paths, `\` on rooted Windows paths without a drive
    Separator,
    /// Drive prefix such as `C:`
    Drive(String),
}

/// One breadcrumb column: a display name and the full path it navigates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments {
    root: PathRoot,
    components: Vec<String>,
    separator: char,
}

impl PathSegments {
    /// Parse a path written with `/`, `\`, or a mix of both.
    ///
    /// Empty and `.` components are dropped; `..` pops the previous component.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut chars = raw.chars();

        let (root, rest) = match (chars.next(), chars.next()) {
            (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
                (PathRoot::Drive(format!("{}:", letter.to_ascii_uppercase())), &raw[2..])
            }
            (Some('/' | '\\'), _) => (PathRoot::Separator, &raw[1..]),
            _ => (PathRoot::Relative, raw),
        };

        let separator = match root {
            PathRoot::Drive(_) => '\\',
            _ if raw.contains('\\') && !raw.contains('/') => '\\',
            _ => '/',
        };

        let mut components: Vec<String> = Vec::new();
        for part in rest.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    components.pop();
                }
                name => components.push(name.to_string()),
            }
        }

        Self {
            root,
            components,
            separator,
        }
    }

    pub fn root(&self) -> &PathRoot {
        &self.root
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty() && self.root != PathRoot::Relative
    }

    /// Last component, or the root label for a bare root.
    pub fn name(&self) -> String {
        match self.components.last() {
            Some(last) => last.clone(),
            None => self.root_label(),
        }
    }

    /// A child path one level down.
    pub fn join(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.components.extend(Self::parse(name).components);
        next
    }

    /// The containing directory, or `None` at the top.
    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.components.pop();
        Some(parent)
    }

    /// Every ancestor from the root down to this path, inclusive.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = Vec::with_capacity(self.components.len() + 1);
        let mut current = Self {
            root: self.root.clone(),
            components: Vec::new(),
            separator: self.separator,
        };

        if self.root != PathRoot::Relative {
            crumbs.push(Breadcrumb {
                name: self.root_label(),
                path: current.to_path_string(),
            });
        }

        for component in &self.components {
            current.components.push(component.clone());
            crumbs.push(Breadcrumb {
                name: component.clone(),
                path: current.to_path_string(),
            });
        }
        crumbs
    }

    pub fn to_path_string(&self) -> String {
        let sep = self.separator.to_string();
        let body = self.components.join(&sep);
        match &self.root {
            PathRoot::Relative => body,
            PathRoot::Separator => format!("{sep}{body}"),
            PathRoot::Drive(drive) => format!("{drive}{sep}{body}"),
        }
    }

    fn root_label(&self) -> String {
        match &self.root {
            PathRoot::Relative => String::new(),
            PathRoot::Separator => self.separator.to_string(),
            PathRoot::Drive(drive) => drive.clone(),
        }
    }
}

impl fmt::Display for PathSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}
