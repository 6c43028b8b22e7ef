//! Named seed routines and the in-memory `FixtureLoader`.

use crate::{Map, Shared};
use common::{
    Criteria, DbError, DbResult,
    ports::{DataAccess, FixtureLoader},
};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::trace;

/// A routine that populates baseline data.
pub trait SeedRoutine {
    fn run(&self, ctx: &mut SeedContext<'_>) -> DbResult<()>;
}

impl<F> SeedRoutine for F
where
    F: Fn(&mut SeedContext<'_>) -> DbResult<()>,
{
    fn run(&self, ctx: &mut SeedContext<'_>) -> DbResult<()> {
        self(ctx)
    }
}

pub(crate) type SeedSets = Map<PathBuf, Map<String, Rc<dyn SeedRoutine>>>;

/// What a running seed can touch: the database, and its sibling seeds.
pub struct SeedContext<'a> {
    db: &'a mut dyn DataAccess,
    sets: &'a Shared<SeedSets>,
    source: &'a Path,
}

impl SeedContext<'_> {
    pub fn db(&mut self) -> &mut dyn DataAccess {
        &mut *self.db
    }

    pub fn insert(&mut self, table: &str, data: Criteria) -> DbResult<()> {
        self.db.insert(table, &data)
    }

    /// Run another seed from the same source.
    pub fn call(&mut self, name: &str) -> DbResult<()> {
        run_seed(self.sets, self.source, name, &mut *self.db)
    }
}

/// Looks the routine up and releases the registry before running it, so a
/// routine may register further seeds.
fn run_seed(
    sets: &Shared<SeedSets>,
    source: &Path,
    name: &str,
    db: &mut dyn DataAccess,
) -> DbResult<()> {
    let routine = sets
        .borrow()
        .get(source)
        .and_then(|seeds| seeds.get(name))
        .cloned()
        .ok_or_else(|| {
            DbError::Seed(format!(
                "seed '{name}' not found in '{}'",
                source.display()
            ))
        })?;
    trace!(seed = name, "running");
    let mut ctx = SeedContext { db, sets, source };
    routine.run(&mut ctx)
}

/// `FixtureLoader` handle over the server's registered seeds.
pub struct MemorySeeder {
    sets: Shared<SeedSets>,
    source: PathBuf,
}

impl MemorySeeder {
    pub(crate) fn new(sets: Shared<SeedSets>, source: PathBuf) -> Self {
        Self { sets, source }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl FixtureLoader for MemorySeeder {
    fn set_source(&mut self, path: &Path) {
        self.source = path.to_path_buf();
    }

    fn run(&mut self, name: &str, db: &mut dyn DataAccess) -> DbResult<()> {
        run_seed(&self.sets, &self.source, name, db)
    }
}
