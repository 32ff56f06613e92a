//! Author registry read from `AUTHORS.txt` at the tree root.
//!
//! One `Full Name <email>` per line. `#` starts a comment, either on its own
//! line or after the address.

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// File name of the registry inside the tree root.
pub const AUTHORS_FILE_NAME: &str = "AUTHORS.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Authors keyed by lowercased email address.
#[derive(Debug, Clone, Default)]
pub struct Authors {
    by_email: HashMap<String, Author>,
}

impl Authors {
    /// Load the registry file; a missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let mut authors = Authors::default();
        match std::fs::File::open(path) {
            Ok(file) => {
                authors.add_from(file)?;
                Ok(authors)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(authors),
            Err(e) => Err(BuildError::io(path, e)),
        }
    }

    /// Parse entries from `r` and add them, later entries winning.
    pub fn add_from(&mut self, r: impl Read) -> Result<(), BuildError> {
        for author in Self::parse(r)? {
            self.by_email.insert(author.email.to_lowercase(), author);
        }
        Ok(())
    }

    pub fn parse(r: impl Read) -> Result<Vec<Author>, BuildError> {
        let mut authors = Vec::new();
        for (idx, line) in BufReader::new(r).lines().enumerate() {
            let line = line.map_err(|e| BuildError::io(AUTHORS_FILE_NAME, e))?;
            let content = match line.split_once('#') {
                Some((before, _)) => before,
                None => line.as_str(),
            }
            .trim();
            if content.is_empty() {
                continue;
            }
            let author = parse_entry(content).ok_or_else(|| BuildError::Authors {
                line: idx + 1,
                content: content.to_string(),
            })?;
            authors.push(author);
        }
        Ok(authors)
    }

    /// Look up an author by email address, ignoring case.
    pub fn get(&self, email: &str) -> Option<&Author> {
        self.by_email.get(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

fn parse_entry(content: &str) -> Option<Author> {
    let open = content.find('<')?;
    let close = content.rfind('>')?;
    if close != content.len() - 1 || close <= open + 1 {
        return None;
    }
    let name = content[..open].trim();
    let email = content[open + 1..close].trim();
    if name.is_empty() || !email.contains('@') {
        return None;
    }
    Some(Author {
        name: name.to_string(),
        email: email.to_string(),
    })
}
