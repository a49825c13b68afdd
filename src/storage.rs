//! Persistence of relations, one flat text resource per relation.
//!
//! The on-disk format is a header line of comma-separated field names
//! followed by one comma-separated line per tuple. There is no quoting, so
//! values must not contain commas or newlines. Saving always rewrites the
//! whole resource.

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::relation::Relation;

pub trait Storage {
    /// Returns `Ok(None)` when no resource exists for `name`, as opposed to
    /// an existing relation with no tuples.
    fn load(&self, name: &str) -> Result<Option<Relation>>;

    /// Replaces the stored copy of `relation`, keyed by its name.
    fn save(&mut self, relation: &Relation) -> Result<()>;
}

/// Stores each relation as `<dir>/<name>.csv`.
#[derive(Clone, Debug)]
pub struct DirStorage {
    dir: PathBuf,
}

impl DirStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

fn io_error(name: &str) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        relation: name.to_owned(),
        source,
    }
}

impl Storage for DirStorage {
    fn load(&self, name: &str) -> Result<Option<Relation>> {
        let path = self.path(name);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no resource for {:?} at {}", name, path.display());
                return Ok(None);
            }
            Err(e) => return Err(io_error(name)(e)),
        };

        read_relation(name, BufReader::new(file)).map(Some)
    }

    fn save(&mut self, relation: &Relation) -> Result<()> {
        let name = relation.name();
        fs::create_dir_all(&self.dir).map_err(io_error(name))?;
        let file = fs::File::create(self.path(name)).map_err(io_error(name))?;
        let mut writer = BufWriter::new(file);
        write_relation(relation, &mut writer)
            .and_then(|()| writer.flush())
            .map_err(io_error(name))
    }
}

pub fn read_relation(name: &str, reader: impl BufRead) -> Result<Relation> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(io_error(name))?,
        None => return Err(Error::Parse(format!("relation {:?} has no header", name))),
    };

    let mut relation = Relation::new(name, split_line(&header))?;
    for (i, line) in lines.enumerate() {
        let line = line.map_err(io_error(name))?;
        // A single-field relation stores the empty value as an empty line.
        if line.trim_end_matches('\r').is_empty() && relation.arity() != 1 {
            continue;
        }
        let tuple = split_line(&line);
        if tuple.len() != relation.arity() {
            // Line 1 is the header.
            warn!(
                "{}: line {} has {} values, expected {}",
                name,
                i + 2,
                tuple.len(),
                relation.arity()
            );
        }
        relation.insert(tuple);
    }
    Ok(relation)
}

pub fn write_relation(relation: &Relation, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "{}", relation.fields().join(","))?;
    for tuple in relation.tuples() {
        writeln!(writer, "{}", tuple.join(","))?;
    }
    Ok(())
}

fn split_line(line: &str) -> Vec<String> {
    line.trim_end_matches('\r')
        .split(',')
        .map(str::to_owned)
        .collect()
}

/// Keeps relations in memory; used by tests and when embedding the engine.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    relations: HashMap<String, Relation>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FromIterator<Relation> for MemoryStorage {
    fn from_iter<I: IntoIterator<Item = Relation>>(relations: I) -> Self {
        Self {
            relations: relations
                .into_iter()
                .map(|relation| (relation.name().to_owned(), relation))
                .collect(),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self, name: &str) -> Result<Option<Relation>> {
        Ok(self.relations.get(name).cloned())
    }

    fn save(&mut self, relation: &Relation) -> Result<()> {
        self.relations
            .insert(relation.name().to_owned(), relation.clone());
        Ok(())
    }
}
