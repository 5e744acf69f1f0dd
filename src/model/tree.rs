use serde::{Deserialize, Serialize};

/// A regular file with its full text content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    /// Slash-separated path relative to the staging root, no leading slash.
    pub path: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    /// Empty for the root; otherwise the parent path joined with `name`.
    pub path: String,
    pub directories: Vec<DirectoryNode>,
    pub files: Vec<FileNode>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
}

/// Join a node name onto its parent's relative path.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

impl DirectoryNode {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    /// All files below this directory as `(path, content)` pairs, sorted by path.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(dir) = stack.pop() {
            for f in &dir.files {
                out.push((f.path.clone(), f.content.clone()));
            }
            stack.extend(dir.directories.iter());
        }
        out.sort();
        out
    }

    /// Counts for everything below this directory. The directory itself is not counted.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut stack = vec![self];
        while let Some(dir) = stack.pop() {
            for f in &dir.files {
                stats.files += 1;
                stats.bytes += f.content.len() as u64;
            }
            stats.dirs += dir.directories.len() as u64;
            stack.extend(dir.directories.iter());
        }
        stats
    }

    pub fn find_dir(&self, path: &str) -> Option<&DirectoryNode> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Some(self);
        }
        let mut cur = self;
        for part in path.split('/') {
            cur = cur.directories.iter().find(|d| d.name == part)?;
        }
        Some(cur)
    }

    pub fn find_file(&self, path: &str) -> Option<&FileNode> {
        let path = path.trim_matches('/');
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path),
        };
        self.find_dir(parent)?.files.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
#[path = "../tests/model/tree_tests.rs"]
mod tests;
