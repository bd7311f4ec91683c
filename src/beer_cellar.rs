//! The whole beer cellar - a fixed row of eight cellar boxes.
//!
//! [`BeerCellar`] decides which box a new bottle goes into, lists what is due
//! to be drunk, removes bottles reported as drunk and persists itself.
//!
//! # Allocation
//!
//! Every box is asked for its [`InsertCost`](crate::cellar::InsertCost). The
//! lowest score wins and ties go to the lowest box index. An occupied box
//! scores the position the beer would land at, so beers gravitate to boxes
//! where they sit near the front. Empty boxes score
//! [`EMPTY_BOX_COST`](crate::cellar::EMPTY_BOX_COST) and are only used when
//! nothing else fits. When every box refuses, the caller gets
//! [`CellarError::NoBinAvailable`].
//!
//! # Files
//!
//! ```text
//! <dir>/<name>1.cellar .. <dir>/<name>8.cellar   one per box
//! <dir>/<name>.metadata                          version~name~sync~key~secret
//! ```

use crate::beer::{self, Beer, BeerSize, DELIMITER};
use crate::cellar::{CellarBox, Change, merge_boxes};
use crate::error::{CellarError, Result};
use anyhow::anyhow;
use chrono::{Days, Months, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Version tag written to new metadata files
pub const CELLAR_VERSION: &str = "0.3";

/// Number of boxes in every cellar
pub const BOX_COUNT: usize = 8;

/// Path of box `number` (1-based)
pub fn box_path(dir: &Path, name: &str, number: usize) -> PathBuf {
    dir.join(format!("{}{}.cellar", name, number))
}

pub fn metadata_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.metadata", name))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Untappd API key and secret, stored with the cellar metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Spacing between bottles added as a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Days(u32),
    Years(u32),
}

impl Interval {
    /// Date of the `n`th bottle of a series starting at `start`
    ///
    /// Year steps are counted from the start date, so a 29 Feb start lands
    /// on 28 Feb in common years and back on 29 Feb in leap years.
    pub fn nth(self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Interval::Days(days) => start.checked_add_days(Days::new(u64::from(days) * u64::from(n))),
            Interval::Years(years) => years
                .checked_mul(n)
                .and_then(|y| y.checked_mul(12))
                .and_then(|months| start.checked_add_months(Months::new(months))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeerCellar {
    version: String,
    name: String,
    dir: PathBuf,
    sync_time: NaiveDate,
    credentials: Credentials,
    boxes: [CellarBox; BOX_COUNT],
}

impl BeerCellar {
    /// Create an empty cellar; nothing is written until [`save`](Self::save)
    pub fn new(name: &str, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let boxes = std::array::from_fn(|i| CellarBox::new(box_path(&dir, name, i + 1)));

        Self {
            version: CELLAR_VERSION.to_string(),
            name: name.to_string(),
            dir,
            sync_time: today(),
            credentials: Credentials::default(),
            boxes,
        }
    }

    /// Load a cellar, failing if its metadata is missing or malformed
    pub fn load(name: &str, dir: impl Into<PathBuf>) -> Result<Self> {
        match Self::load_lenient(name, dir)? {
            (cellar, None) => Ok(cellar),
            (_, Some(issue)) => Err(issue),
        }
    }

    /// Load a cellar, falling back to fresh metadata when the metadata file
    /// is missing or malformed.
    ///
    /// The metadata problem comes back alongside the cellar so the caller can
    /// tell "no prior state" ([`CellarError::MissingMetadata`]) from
    /// "ambiguous state" ([`CellarError::MalformedMetadata`]). Box files that
    /// do not exist load as empty boxes; any other read failure is an error.
    pub fn load_lenient(
        name: &str,
        dir: impl Into<PathBuf>,
    ) -> Result<(Self, Option<CellarError>)> {
        let mut cellar = Self::new(name, dir);

        for (i, slot) in cellar.boxes.iter_mut().enumerate() {
            let path = box_path(&cellar.dir, name, i + 1);
            match CellarBox::load(&path) {
                Ok(loaded) => *slot = loaded,
                Err(CellarError::PersistenceUnavailable { ref source, .. })
                    if source.kind() == ErrorKind::NotFound =>
                {
                    tracing::debug!("No box file at {}, starting empty", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        let issue = cellar.read_metadata().err();
        if let Some(e) = &issue {
            tracing::warn!("Using default cellar metadata: {}", e);
        }

        Ok((cellar, issue))
    }

    /// Load the cellar if it has been saved before, otherwise create it
    pub fn load_or_new(name: &str, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if metadata_path(&dir, name).exists() {
            Self::load(name, dir)
        } else {
            Ok(Self::new(name, dir))
        }
    }

    fn read_metadata(&mut self) -> Result<()> {
        let path = metadata_path(&self.dir, &self.name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CellarError::MissingMetadata(path));
            }
            Err(e) => return Err(CellarError::persistence(path, e)),
        };

        let malformed = |reason: String| CellarError::MalformedMetadata {
            path: path.clone(),
            reason,
        };

        let line = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| malformed("file is empty".to_string()))?;

        let elems: Vec<&str> = line.split(DELIMITER).collect();
        if elems.len() != 5 {
            return Err(malformed(format!("expected 5 fields, found {}", elems.len())));
        }

        let sync_time = beer::parse_date(elems[2])
            .ok_or_else(|| malformed(format!("bad sync date '{}'", elems[2])))?;

        if elems[1] != self.name {
            tracing::warn!(
                "Metadata names cellar '{}' but it was loaded as '{}'",
                elems[1],
                self.name
            );
        }

        self.version = elems[0].to_string();
        self.sync_time = sync_time;
        self.credentials = Credentials::new(elems[3], elems[4]);

        Ok(())
    }

    /// Save every box, then the metadata.
    ///
    /// A box that fails to save does not stop the others; the first failure
    /// is returned once everything has been attempted.
    pub fn save(&self) -> Result<()> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("Cannot create cellar directory {}: {}", self.dir.display(), e);
        }

        let mut first_error = None;
        for cellar_box in &self.boxes {
            if let Err(e) = cellar_box.save() {
                tracing::warn!("Failed to save {}: {}", cellar_box.name(), e);
                first_error.get_or_insert(e);
            }
        }

        let path = metadata_path(&self.dir, &self.name);
        let line = format!(
            "{v}{d}{n}{d}{t}{d}{k}{d}{s}\n",
            v = self.version,
            n = self.name,
            t = beer::format_date(self.sync_time),
            k = self.credentials.key,
            s = self.credentials.secret,
            d = DELIMITER
        );
        if let Err(e) = fs::write(&path, line) {
            tracing::warn!("Error saving metadata file {}: {}", path.display(), e);
            first_error.get_or_insert(CellarError::persistence(path, e));
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sync_time(&self) -> NaiveDate {
        self.sync_time
    }

    pub fn set_sync_time(&mut self, sync_time: NaiveDate) {
        self.sync_time = sync_time;
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    pub fn boxes(&self) -> &[CellarBox] {
        &self.boxes
    }

    /// Box by zero-based index
    pub fn cellar_box(&self, index: usize) -> Option<&CellarBox> {
        self.boxes.get(index)
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Total number of beers across all boxes
    pub fn size(&self) -> usize {
        self.boxes.iter().map(CellarBox::size).sum()
    }

    pub fn empty_box_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.is_empty()).count()
    }

    /// Free (bomber, small) slots summed over every box
    pub fn free_slots(&self) -> (usize, usize) {
        self.boxes.iter().fold((0, 0), |(bombers, smalls), b| {
            let (large, small) = b.free_slots();
            (bombers + large, smalls + small)
        })
    }

    /// Put `beer` in the cheapest box that takes it, returning the box index
    pub fn add_beer_to_cellar(&mut self, beer: Beer) -> Result<usize> {
        let mut best: Option<(usize, usize)> = None;

        for (i, cellar_box) in self.boxes.iter().enumerate() {
            let cost = cellar_box.insert_cost(&beer);
            tracing::debug!("Insert cost for {} in box {}: {:?}", beer, i, cost);

            if let Some(score) = cost.score() {
                if best.is_none_or(|(_, best_score)| score < best_score) {
                    best = Some((i, score));
                }
            }
        }

        let (index, _) = best.ok_or(CellarError::NoBinAvailable(beer))?;
        self.boxes[index].insert(beer);
        Ok(index)
    }

    /// Add a beer from its parts. Negative ids mean "no beer" and add nothing.
    pub fn add_beer(&mut self, id: i64, drink_date: NaiveDate, size: BeerSize) -> Result<Option<usize>> {
        if id < 0 {
            tracing::debug!("Ignoring beer with negative id {}", id);
            return Ok(None);
        }

        let id = u32::try_from(id).map_err(|_| CellarError::MalformedRecord(id.to_string()))?;
        self.add_beer_to_cellar(Beer::new(id, drink_date, size))
            .map(Some)
    }

    /// Add `count` bottles of one beer, spaced by `interval`.
    ///
    /// Each bottle is allocated on its own. A failure part way through keeps
    /// the bottles already added.
    pub fn add_beer_repeating(
        &mut self,
        id: i64,
        start: NaiveDate,
        size: BeerSize,
        interval: Interval,
        count: u32,
    ) -> Result<Vec<usize>> {
        let mut placed = Vec::new();
        for n in 0..count {
            let date = interval
                .nth(start, n)
                .ok_or_else(|| anyhow!("bottle {} of the series falls outside the calendar", n + 1))?;
            if let Some(index) = self.add_beer(id, date, size)? {
                placed.push(index);
            }
        }
        Ok(placed)
    }

    pub fn add_beer_by_days(
        &mut self,
        id: i64,
        start: NaiveDate,
        size: BeerSize,
        days: u32,
        count: u32,
    ) -> Result<Vec<usize>> {
        self.add_beer_repeating(id, start, size, Interval::Days(days), count)
    }

    pub fn add_beer_by_years(
        &mut self,
        id: i64,
        start: NaiveDate,
        size: BeerSize,
        years: u32,
        count: u32,
    ) -> Result<Vec<usize>> {
        self.add_beer_repeating(id, start, size, Interval::Years(years), count)
    }

    /// Number of bottles of this beer across every box
    pub fn count_beers(&self, id: u32) -> usize {
        self.boxes.iter().map(|b| b.count(id)).sum()
    }

    /// Remove one bottle of this beer from the box where it sits nearest the
    /// front. Returns the box index and the bottle, or `None` if absent.
    pub fn remove_beer(&mut self, id: u32) -> Option<(usize, Beer)> {
        let mut best: Option<(usize, usize)> = None;
        for (i, cellar_box) in self.boxes.iter().enumerate() {
            if let Some(cost) = cellar_box.remove_cost(id) {
                if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                    best = Some((i, cost));
                }
            }
        }

        let (index, _) = best?;
        tracing::info!("Removing {} from box {}", id, index + 1);
        self.boxes[index].remove(id).map(|beer| (index, beer))
    }

    /// Beers of `size` due to be drunk before `date`, earliest first.
    ///
    /// The boxes of that size are merged by date and the list is cut after
    /// the last entry that is both within the first `num` entries and dated
    /// strictly before `date`.
    pub fn list_beers(&self, num: usize, size: BeerSize, date: NaiveDate) -> Vec<Beer> {
        let mut merged = merge_boxes(size, &self.boxes);

        let mut pointer = None;
        for (i, beer) in merged.iter().enumerate() {
            if i < num && beer.drink_date < date {
                pointer = Some(i);
            }
        }

        merged.truncate(pointer.map_or(0, |p| p + 1));
        merged
    }

    /// Remove one bottle per reported drink, then move the sync time to today.
    ///
    /// Ids with no bottle in the cellar are skipped. Returns the bottles
    /// removed.
    ///
    /// The sync time is a date, and check-ins are read from that date on.
    /// A drink checked in on the day of the previous sync is therefore
    /// reported again, and with duplicate bottles a second one is removed.
    /// Sync at most once per day, after the day's drinking, to avoid this.
    pub fn sync_consumed(&mut self, drunk: &[u32]) -> Vec<Beer> {
        tracing::info!("Syncing {} drinks since {}", drunk.len(), self.sync_time);

        let removed = drunk
            .iter()
            .filter_map(|id| self.remove_beer(*id).map(|(_, beer)| beer))
            .collect();

        self.sync_time = today();
        removed
    }

    /// Per-box changes from `other` to `self`, matched by box index
    pub fn diff(&self, other: &BeerCellar) -> [Vec<Change>; BOX_COUNT] {
        std::array::from_fn(|i| self.boxes[i].diff(&other.boxes[i]))
    }

    /// Changes relative to what is currently saved on disk
    pub fn diff_against_disk(&self) -> Result<[Vec<Change>; BOX_COUNT]> {
        let (saved, _) = Self::load_lenient(&self.name, &self.dir)?;
        Ok(self.diff(&saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        beer::parse_date(s).unwrap()
    }

    fn beer(line: &str) -> Beer {
        Beer::parse(line).unwrap()
    }

    #[test]
    fn test_new_cellar_has_eight_empty_boxes() {
        let cellar = BeerCellar::new("test", "unused");
        assert_eq!(cellar.box_count(), 8);
        assert_eq!(cellar.empty_box_count(), 8);
        assert_eq!(cellar.size(), 0);
        assert_eq!(cellar.version(), CELLAR_VERSION);
        assert_eq!(cellar.free_slots(), (160, 240));
    }

    #[test]
    fn test_same_size_beers_share_a_box() {
        let mut cellar = BeerCellar::new("test", "unused");
        cellar.add_beer_to_cellar(beer("1234~01/01/16~bomber")).unwrap();
        cellar.add_beer_to_cellar(beer("1234~01/02/16~bomber")).unwrap();
        cellar.add_beer_to_cellar(beer("1234~01/03/16~bomber")).unwrap();

        assert_eq!(cellar.empty_box_count(), 7);
        assert_eq!(cellar.boxes()[0].size(), 3);
    }

    #[test]
    fn test_sizes_go_to_separate_boxes() {
        let mut cellar = BeerCellar::new("test", "unused");
        assert_eq!(cellar.add_beer_to_cellar(beer("1~01/01/16~bomber")).unwrap(), 0);
        assert_eq!(cellar.add_beer_to_cellar(beer("2~01/01/16~small")).unwrap(), 1);
        assert_eq!(cellar.add_beer_to_cellar(beer("3~01/01/17~small")).unwrap(), 1);
        assert_eq!(cellar.empty_box_count(), 6);
    }

    #[test]
    fn test_allocation_prefers_front_slot() {
        let mut cellar = BeerCellar::new("test", "unused");
        // Fill box 0 so the next bomber opens box 1
        for _ in 0..20 {
            cellar.add_beer_to_cellar(beer("1~01/01/20~bomber")).unwrap();
        }
        assert_eq!(cellar.add_beer_to_cellar(beer("2~01/01/21~bomber")).unwrap(), 1);
        cellar.boxes[0].remove(1);
        cellar.boxes[0].remove(1);

        // Front of both boxes; the tie goes to box 0
        assert_eq!(cellar.add_beer_to_cellar(beer("3~01/01/15~bomber")).unwrap(), 0);
        // Back of box 0 but front of box 1
        assert_eq!(cellar.add_beer_to_cellar(beer("4~01/06/20~bomber")).unwrap(), 1);
    }

    #[test]
    fn test_no_box_available() {
        let mut cellar = BeerCellar::new("test", "unused");
        for _ in 0..(BOX_COUNT * 20) {
            cellar.add_beer_to_cellar(beer("1~01/01/16~bomber")).unwrap();
        }
        assert_eq!(cellar.empty_box_count(), 0);

        let small = beer("2~01/01/16~small");
        match cellar.add_beer_to_cellar(small) {
            Err(CellarError::NoBinAvailable(rejected)) => assert_eq!(rejected, small),
            other => panic!("expected NoBinAvailable, got {:?}", other),
        }
        assert!(matches!(
            cellar.add_beer_to_cellar(beer("1~01/01/16~bomber")),
            Err(CellarError::NoBinAvailable(_))
        ));
        assert_eq!(cellar.size(), BOX_COUNT * 20);
    }

    #[test]
    fn test_negative_id_adds_nothing() {
        let mut cellar = BeerCellar::new("test", "unused");
        let placed = cellar.add_beer(-1, date("01/01/16"), BeerSize::Bomber).unwrap();
        assert_eq!(placed, None);
        assert_eq!(cellar.size(), 0);
    }

    #[test]
    fn test_add_by_days() {
        let mut cellar = BeerCellar::new("test", "unused");
        let placed = cellar
            .add_beer_by_days(1234, date("01/01/16"), BeerSize::Bomber, 14, 5)
            .unwrap();
        assert_eq!(placed, vec![0; 5]);

        let dates: Vec<String> = cellar.boxes()[0]
            .beers()
            .iter()
            .map(|b| beer::format_date(b.drink_date))
            .collect();
        assert_eq!(
            dates,
            vec!["01/01/16", "15/01/16", "29/01/16", "12/02/16", "26/02/16"]
        );
    }

    #[test]
    fn test_add_by_years() {
        let mut cellar = BeerCellar::new("test", "unused");
        cellar
            .add_beer_by_years(1234, date("29/02/16"), BeerSize::Small, 1, 5)
            .unwrap();

        let dates: Vec<String> = cellar.boxes()[0]
            .beers()
            .iter()
            .map(|b| beer::format_date(b.drink_date))
            .collect();
        assert_eq!(
            dates,
            vec!["29/02/16", "28/02/17", "28/02/18", "28/02/19", "29/02/20"]
        );
    }

    #[test]
    fn test_repeating_keeps_partial_progress() {
        let mut cellar = BeerCellar::new("test", "unused");
        for i in 0..7 {
            cellar.boxes[i].insert(beer("9~01/01/16~small"));
        }
        // Only box 7 is open to bombers: 20 fit, the 21st fails
        let result = cellar.add_beer_by_days(1, date("01/01/16"), BeerSize::Bomber, 1, 25);
        assert!(matches!(result, Err(CellarError::NoBinAvailable(_))));
        assert_eq!(cellar.count_beers(1), 20);
    }

    #[test]
    fn test_remove_picks_earliest_position() {
        let mut cellar = BeerCellar::new("test", "unused");
        cellar.add_beer(1234, date("01/01/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(1235, date("01/02/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(1234, date("01/03/16"), BeerSize::Bomber).unwrap();

        let removed = cellar.remove_beer(1234);
        assert_eq!(removed, Some((0, beer("1234~01/01/16~bomber"))));
        assert_eq!(cellar.boxes()[0].size(), 2);
        assert_eq!(cellar.count_beers(1234), 1);

        assert_eq!(cellar.remove_beer(9999), None);
        assert_eq!(cellar.size(), 2);
    }

    #[test]
    fn test_remove_across_boxes() {
        let mut cellar = BeerCellar::new("test", "unused");
        cellar.add_beer(1, date("01/01/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(7, date("01/02/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(7, date("01/02/16"), BeerSize::Small).unwrap();

        // Position 1 in box 0 vs position 0 in box 1
        assert_eq!(cellar.remove_beer(7).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_list_beers_cuts_at_date() {
        let mut cellar = BeerCellar::new("test", "unused");
        cellar.add_beer_to_cellar(beer("1234~01/05/16~bomber")).unwrap();
        cellar.add_beer_to_cellar(beer("1234~01/01/16~bomber")).unwrap();

        let listed = cellar.list_beers(2, BeerSize::Bomber, date("02/02/16"));
        assert_eq!(listed, vec![beer("1234~01/01/16~bomber")]);
    }

    #[test]
    fn test_list_beers_cuts_at_count() {
        let mut cellar = BeerCellar::new("test", "unused");
        for line in ["1~01/01/16~small", "2~02/01/16~small", "3~03/01/16~small"] {
            cellar.add_beer_to_cellar(beer(line)).unwrap();
        }

        let listed = cellar.list_beers(2, BeerSize::Small, date("01/01/20"));
        let ids: Vec<u32> = listed.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert!(cellar.list_beers(0, BeerSize::Small, date("01/01/20")).is_empty());
        assert!(cellar.list_beers(5, BeerSize::Bomber, date("01/01/20")).is_empty());
        assert!(cellar.list_beers(5, BeerSize::Small, date("01/01/16")).is_empty());
    }

    #[test]
    fn test_sync_consumed() {
        let mut cellar = BeerCellar::new("testsync", "unused");
        cellar.add_beer(1234, date("01/01/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(791939, date("01/02/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(1234, date("01/03/16"), BeerSize::Bomber).unwrap();
        cellar.set_sync_time(date("28/02/16"));

        let removed = cellar.sync_consumed(&[791939, 5555]);
        assert_eq!(removed, vec![beer("791939~01/02/16~bomber")]);
        assert_eq!(cellar.size(), 2);
        assert_eq!(cellar.sync_time(), today());
    }

    #[test]
    fn test_diff_matches_by_index() {
        let mut mine = BeerCellar::new("a", "unused");
        let mut theirs = BeerCellar::new("b", "unused");
        mine.add_beer_to_cellar(beer("1~01/01/16~small")).unwrap();
        mine.add_beer_to_cellar(beer("2~01/02/16~small")).unwrap();
        theirs.add_beer_to_cellar(beer("1~01/01/16~small")).unwrap();
        theirs.add_beer_to_cellar(beer("3~01/03/16~small")).unwrap();

        let diffs = mine.diff(&theirs);
        assert_eq!(
            diffs[0],
            vec![
                Change::Added(beer("2~01/02/16~small")),
                Change::Removed(beer("3~01/03/16~small"))
            ]
        );
        assert!(diffs[1..].iter().all(Vec::is_empty));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let mut cellar = BeerCellar::new("cellar1", temp.path());
        cellar.add_beer(1234, date("01/01/16"), BeerSize::Bomber).unwrap();
        cellar.add_beer(1235, date("01/01/17"), BeerSize::Small).unwrap();
        cellar.set_sync_time(date("01/01/16"));
        cellar.set_credentials(Credentials::new("testkey", "testsecret"));
        cellar.save().unwrap();

        let reloaded = BeerCellar::load("cellar1", temp.path()).unwrap();
        assert_eq!(reloaded, cellar);
        assert_eq!(reloaded.size(), 2);
        assert_eq!(reloaded.sync_time(), date("01/01/16"));
        assert_eq!(reloaded.credentials().key, "testkey");
    }

    #[test]
    fn test_load_missing_metadata() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            BeerCellar::load("nothing", temp.path()),
            Err(CellarError::MissingMetadata(_))
        ));

        let (cellar, issue) = BeerCellar::load_lenient("nothing", temp.path()).unwrap();
        assert!(matches!(issue, Some(CellarError::MissingMetadata(_))));
        assert_eq!(cellar.box_count(), 8);
        assert_eq!(cellar.sync_time(), today());
    }

    #[test]
    fn test_load_malformed_metadata() {
        let temp = TempDir::new().unwrap();
        fs::write(metadata_path(temp.path(), "bad"), "0.3~bad~01/01/16\n").unwrap();

        let (cellar, issue) = BeerCellar::load_lenient("bad", temp.path()).unwrap();
        assert!(matches!(issue, Some(CellarError::MalformedMetadata { .. })));
        assert_eq!(cellar.credentials(), &Credentials::default());
    }

    #[test]
    fn test_load_or_new() {
        let temp = TempDir::new().unwrap();
        let cellar = BeerCellar::load_or_new("fresh", temp.path()).unwrap();
        assert_eq!(cellar.size(), 0);
        assert!(!metadata_path(temp.path(), "fresh").exists());
    }

    #[test]
    fn test_save_is_best_effort() {
        let temp = TempDir::new().unwrap();
        let mut cellar = BeerCellar::new("partial", temp.path());
        cellar.add_beer(1, date("01/01/16"), BeerSize::Small).unwrap();

        // A directory where box 3's file should go makes that one save fail
        fs::create_dir_all(box_path(temp.path(), "partial", 3)).unwrap();

        let result = cellar.save();
        assert!(matches!(
            result,
            Err(CellarError::PersistenceUnavailable { .. })
        ));
        assert!(box_path(temp.path(), "partial", 8).exists());
        assert!(metadata_path(temp.path(), "partial").exists());
    }

    #[test]
    fn test_diff_against_disk() {
        let temp = TempDir::new().unwrap();
        let mut cellar = BeerCellar::new("snap", temp.path());
        cellar.add_beer(1, date("01/01/16"), BeerSize::Small).unwrap();
        cellar.save().unwrap();

        cellar.add_beer(2, date("01/02/16"), BeerSize::Small).unwrap();
        let diffs = cellar.diff_against_disk().unwrap();
        assert_eq!(diffs[0], vec![Change::Added(beer("2~01/02/16~small"))]);
    }
}
