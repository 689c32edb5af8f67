use crate::error::{Error, FieldRef, Result};
use ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Case-insensitive view of a profile's `[section]` / `key = value` structure.
///
/// Section names and keys are lowercased once while the table is built, so
/// every lookup is case-insensitive without callers normalizing anything.
/// Values keep their original text; comparisons against tokens go through
/// [`SectionView::is`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTable {
    path: PathBuf,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl SectionTable {
    /// Read and parse a profile from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &text)
    }

    /// Parse profile text. `path` is only used to label errors.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        // Values are taken verbatim: profiles carry no quoting and some hold backslashes.
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, opt).map_err(|e| Error::Parse {
            path: path.clone(),
            detail: e.to_string(),
        })?;

        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (name, props) in ini.iter() {
            // rust-ini folds a line without a delimiter into the next key.
            if let Some((key, _)) = props.iter().find(|(key, _)| key.contains(['\n', '\r'])) {
                let line = key.lines().next().unwrap_or_default().trim();
                return Err(Error::Parse {
                    path,
                    detail: format!("line '{}' has no '=' or ':' delimiter", line),
                });
            }

            let Some(name) = name else {
                if let Some((key, _)) = props.iter().next() {
                    return Err(Error::Parse {
                        path,
                        detail: format!("key '{}' appears before any section header", key),
                    });
                }
                continue;
            };

            let name = normalize(name);
            if name.is_empty() {
                return Err(Error::Parse {
                    path,
                    detail: "empty section header".to_string(),
                });
            }

            let entries = sections.entry(name).or_default();
            for (key, value) in props.iter() {
                // Later duplicates win.
                entries.insert(normalize(key), value.trim().to_string());
            }
        }

        Ok(Self { path, sections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn section(&self, name: &str) -> Option<SectionView<'_>> {
        let name = normalize(name);
        self.sections
            .get_key_value(&name)
            .map(|(name, entries)| SectionView {
                path: &self.path,
                name: name.as_str(),
                entries,
            })
    }

    /// Like [`section`](Self::section), but a missing section is a `MissingField` error.
    pub fn require_section(&self, name: &str) -> Result<SectionView<'_>> {
        self.section(name).ok_or_else(|| Error::MissingField {
            path: self.path.clone(),
            field: FieldRef::section(normalize(name)),
            reason: "section is absent",
        })
    }

    /// Normalized names of all sections, sorted.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Borrowed view of one section of a [`SectionTable`].
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    path: &'a Path,
    name: &'a str,
    entries: &'a BTreeMap<String, String>,
}

impl<'a> SectionView<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.entries.get(&normalize(key)).map(String::as_str)
    }

    /// Look up a key that must be present.
    pub fn require(&self, key: &str) -> Result<&'a str> {
        self.get(key).ok_or_else(|| Error::MissingField {
            path: self.path.to_path_buf(),
            field: self.field(key),
            reason: "is absent",
        })
    }

    /// True iff the key is present and equals `token`, ignoring case.
    pub fn is(&self, key: &str, token: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case(token))
    }

    /// Parse a present value, reporting failures as `FieldFormat`.
    pub fn parse<T: std::str::FromStr>(&self, key: &str, value: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        value.parse::<T>().map_err(|e| self.format_error(key, value, e.to_string()))
    }

    pub fn field(&self, key: &str) -> FieldRef {
        FieldRef::key(self.name, normalize(key))
    }

    pub fn format_error(&self, key: &str, value: &str, detail: impl Into<String>) -> Error {
        Error::FieldFormat {
            path: self.path.to_path_buf(),
            field: self.field(key),
            value: value.to_string(),
            detail: detail.into(),
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
