//! Cellar boxes - a single physical bin of same-size bottles.
//!
//! A [`CellarBox`] keeps its beers sorted by drink date, earliest first. The
//! box takes its size from the first beer put into it and refuses beers of
//! the other size, as well as any beer once it reaches the size's capacity
//! (20 bombers or 30 smalls).
//!
//! Each box is persisted as its own file, one record line per beer:
//!
//! ```text
//! 1234~01/01/16~bomber
//! 1234~01/02/16~bomber
//! ```

use crate::beer::{Beer, BeerSize};
use crate::error::{CellarError, Result};
use std::fmt;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Score reported by an empty box; always worse than any real slot
pub const EMPTY_BOX_COST: usize = i16::MAX as usize;

/// Why a box refused a beer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The box already holds beers of the other size
    WrongSize { held: BeerSize, offered: BeerSize },
    /// The box is at capacity for its size
    Full { size: BeerSize, capacity: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongSize { held, offered } => {
                write!(f, "box holds {} bottles, not {}", held, offered)
            }
            Rejection::Full { size, capacity } => {
                write!(f, "box is full ({} {} bottles)", capacity, size)
            }
        }
    }
}

/// Outcome of asking a box what it would cost to take a beer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertCost {
    /// Box is empty; usable, but only as a last resort
    Empty,
    /// Beer would land at this zero-based position
    Slot(usize),
    Rejected(Rejection),
}

impl InsertCost {
    /// Comparable score, `None` when the box refuses the beer
    pub fn score(&self) -> Option<usize> {
        match self {
            InsertCost::Empty => Some(EMPTY_BOX_COST),
            InsertCost::Slot(position) => Some(*position),
            InsertCost::Rejected(_) => None,
        }
    }
}

/// One line of a box diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added(Beer),
    Removed(Beer),
}

impl Change {
    pub fn beer(&self) -> &Beer {
        match self {
            Change::Added(beer) | Change::Removed(beer) => beer,
        }
    }

    pub fn sign(&self) -> char {
        match self {
            Change::Added(_) => '+',
            Change::Removed(_) => '-',
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sign(), self.beer())
    }
}

/// A single storage box of the cellar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellarBox {
    path: PathBuf,
    contents: Vec<Beer>,
}

impl CellarBox {
    /// Create an empty box persisted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            contents: Vec::with_capacity(BeerSize::Small.capacity()),
        }
    }

    /// Build a box from its file, skipping lines that do not parse
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = fs::File::open(&path).map_err(|e| CellarError::persistence(&path, e))?;

        let mut cellar_box = Self::new(path);
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| CellarError::persistence(&cellar_box.path, e))?;
            if line.trim().is_empty() {
                continue;
            }

            match Beer::parse(&line) {
                Ok(beer) => cellar_box.insert(beer),
                Err(e) if e.is_record_error() => {
                    tracing::warn!("Unable to parse beer in {}: {}", cellar_box.path.display(), e)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(cellar_box)
    }

    /// Write every beer, in order, to the box file
    pub fn save(&self) -> Result<()> {
        let file =
            fs::File::create(&self.path).map_err(|e| CellarError::persistence(&self.path, e))?;
        let mut writer = BufWriter::new(file);

        for beer in &self.contents {
            writeln!(writer, "{}", beer).map_err(|e| CellarError::persistence(&self.path, e))?;
        }
        writer
            .flush()
            .map_err(|e| CellarError::persistence(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name of the box (its file name)
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn beers(&self) -> &[Beer] {
        &self.contents
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Size category of the box, fixed by its first beer
    pub fn box_size(&self) -> Option<BeerSize> {
        self.contents.first().map(|b| b.size)
    }

    /// Free (bomber, small) slots; an empty box could still go either way
    pub fn free_slots(&self) -> (usize, usize) {
        match self.box_size() {
            None => (BeerSize::Bomber.capacity(), BeerSize::Small.capacity()),
            Some(BeerSize::Bomber) => (BeerSize::Bomber.capacity().saturating_sub(self.size()), 0),
            Some(BeerSize::Small) => (0, BeerSize::Small.capacity().saturating_sub(self.size())),
        }
    }

    /// Position that keeps the box sorted; goes after beers with the same date
    fn insert_point(&self, beer: &Beer) -> usize {
        self.contents.partition_point(|b| !b.drinks_after(beer))
    }

    /// What it would cost to put `beer` in this box
    pub fn insert_cost(&self, beer: &Beer) -> InsertCost {
        let Some(held) = self.box_size() else {
            return InsertCost::Empty;
        };

        if held != beer.size {
            return InsertCost::Rejected(Rejection::WrongSize {
                held,
                offered: beer.size,
            });
        }

        if self.size() >= held.capacity() {
            return InsertCost::Rejected(Rejection::Full {
                size: held,
                capacity: held.capacity(),
            });
        }

        InsertCost::Slot(self.insert_point(beer))
    }

    /// Insert `beer` at its sorted position.
    ///
    /// Size and capacity are not checked here; callers go through
    /// [`insert_cost`](Self::insert_cost) or use [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, beer: Beer) {
        let at = self.insert_point(&beer);
        self.contents.insert(at, beer);
    }

    /// Insert `beer` if the box accepts it, returning the position used
    pub fn try_insert(&mut self, beer: Beer) -> Result<usize> {
        if let InsertCost::Rejected(reason) = self.insert_cost(&beer) {
            return Err(CellarError::BinRejected(reason));
        }

        let at = self.insert_point(&beer);
        self.contents.insert(at, beer);
        Ok(at)
    }

    /// Position of the first beer with this id
    pub fn remove_cost(&self, id: u32) -> Option<usize> {
        self.contents.iter().position(|b| b.id == id)
    }

    /// Remove the first beer with this id; absent ids are a no-op
    pub fn remove(&mut self, id: u32) -> Option<Beer> {
        let at = self.remove_cost(id)?;
        Some(self.contents.remove(at))
    }

    /// Take the beer due soonest
    pub fn take_next(&mut self) -> Option<Beer> {
        if self.contents.is_empty() {
            None
        } else {
            Some(self.contents.remove(0))
        }
    }

    /// Number of beers in the box with this id
    pub fn count(&self, id: u32) -> usize {
        self.contents.iter().filter(|b| b.id == id).count()
    }

    /// Changes from `other` to `self`: additions first, then removals
    pub fn diff(&self, other: &CellarBox) -> Vec<Change> {
        let added = self
            .contents
            .iter()
            .filter(|b| !other.contents.contains(b))
            .map(|b| Change::Added(*b));
        let removed = other
            .contents
            .iter()
            .filter(|b| !self.contents.contains(b))
            .map(|b| Change::Removed(*b));

        added.chain(removed).collect()
    }
}

/// Merge every box of the given size into one list ordered by drink date
pub fn merge_boxes<'a>(size: BeerSize, boxes: impl IntoIterator<Item = &'a CellarBox>) -> Vec<Beer> {
    let mut merged: Vec<Beer> = boxes
        .into_iter()
        .filter(|b| b.box_size() == Some(size))
        .flat_map(|b| b.contents.iter().copied())
        .collect();

    // Stable, so equal dates keep box order
    merged.sort_by_key(|b| b.drink_date);
    merged
}
