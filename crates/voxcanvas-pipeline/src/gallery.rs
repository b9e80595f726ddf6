//! Per-session gallery of finalized results

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use voxcanvas_core::{EntryId, Error, GalleryEntry, GalleryView, RatingCategory, Result};

/// Append-only store of a session's results.
///
/// Entries are never mutated or individually removed; hiding adult content is
/// a read-time filter, so toggling it is always reversible. Ids are never
/// reused within the session, not even after [`Gallery::clear`]. Once
/// [`Gallery::close`]d, every append is refused.
#[derive(Default)]
pub struct Gallery {
    inner: RwLock<GalleryInner>,
}

#[derive(Default)]
struct GalleryInner {
    entries: Vec<Arc<GalleryEntry>>,
    issued: HashSet<EntryId>,
    closed: bool,
}

impl Gallery {
    /// Create an empty gallery
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, assigning a fresh id if it has none
    pub fn append(&self, entry: GalleryEntry) -> Result<EntryId> {
        self.insert(entry).map(|(id, _)| id)
    }

    /// Append and hand back the stored entry
    pub(crate) fn insert(&self, entry: GalleryEntry) -> Result<(EntryId, Arc<GalleryEntry>)> {
        if entry.blocked() {
            return Err(Error::BlockedEntry);
        }

        let mut inner = self.inner.write();
        if inner.closed {
            return Err(Error::Cancelled);
        }

        let id = match entry.id() {
            Some(id) if inner.issued.contains(&id) => return Err(Error::DuplicateEntry(id)),
            Some(id) => id,
            None => loop {
                let id = EntryId::generate();
                if !inner.issued.contains(&id) {
                    break id;
                }
            },
        };

        let stored = Arc::new(entry.with_id(id));
        inner.issued.insert(id);
        inner.entries.push(Arc::clone(&stored));
        debug!(%id, size = inner.entries.len(), "Gallery entry appended");

        Ok((id, stored))
    }

    /// Snapshot of the entries admitted by `view`, in insertion order
    pub fn list(&self, view: GalleryView) -> GalleryListing {
        GalleryListing {
            entries: self.inner.read().entries.clone(),
            view,
        }
    }

    /// Look up an entry by id
    pub fn get(&self, id: EntryId) -> Option<Arc<GalleryEntry>> {
        self.inner
            .read()
            .entries
            .iter()
            .find(|entry| entry.id() == Some(id))
            .cloned()
    }

    /// Number of entries per rating
    pub fn counts(&self) -> BTreeMap<RatingCategory, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.inner.read().entries {
            *counts.entry(entry.rating()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop every entry; later appends are still accepted
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        debug!(size = inner.entries.len(), "Gallery cleared");
        inner.entries.clear();
    }

    /// Drop every entry and refuse later appends; returns how many were
    /// dropped. Closing and clearing happen under one write lock, so no
    /// append can land in between.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.write();
        inner.closed = true;
        let dropped = inner.entries.len();
        inner.entries.clear();
        debug!(size = dropped, "Gallery closed");
        dropped
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

/// Filtered, restartable view of a gallery snapshot.
///
/// Later appends are not visible; iterate as many times as needed.
#[derive(Clone)]
pub struct GalleryListing {
    entries: Vec<Arc<GalleryEntry>>,
    view: GalleryView,
}

impl GalleryListing {
    /// Admitted entries, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<GalleryEntry>> + '_ {
        self.entries
            .iter()
            .filter(move |entry| self.view.admits(entry))
    }

    /// Admitted entries, newest first (display order)
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &Arc<GalleryEntry>> + '_ {
        self.iter().rev()
    }

    /// Filter this listing was built with
    pub fn view(&self) -> GalleryView {
        self.view
    }

    /// Number of admitted entries
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Entries in the snapshot hidden by the filter
    pub fn hidden(&self) -> usize {
        self.entries.len() - self.len()
    }
}

impl<'a> IntoIterator for &'a GalleryListing {
    type Item = &'a Arc<GalleryEntry>;
    type IntoIter = Box<dyn DoubleEndedIterator<Item = &'a Arc<GalleryEntry>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use voxcanvas_core::{ImageHandle, Prompt};

    fn entry(text: &str, rating: RatingCategory) -> GalleryEntry {
        GalleryEntry::new(
            Prompt::new(text).unwrap(),
            ImageHandle::new(vec![0u8; 8], "image/png"),
            rating,
            false,
            Vec::new(),
        )
    }

    #[test]
    fn test_append_assigns_unique_ids() {
        let gallery = Gallery::new();
        let a = gallery.append(entry("one", RatingCategory::General)).unwrap();
        let b = gallery.append(entry("two", RatingCategory::General)).unwrap();

        assert_ne!(a, b);
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.get(a).unwrap().prompt().text(), "one");
        assert!(gallery.list(GalleryView::all()).iter().all(|e| e.id().is_some()));
    }

    #[test]
    fn test_preassigned_id_kept_and_duplicates_rejected() {
        let gallery = Gallery::new();
        let id = EntryId::generate();

        assert_eq!(gallery.append(entry("one", RatingCategory::Teen).with_id(id)).unwrap(), id);
        assert!(matches!(
            gallery.append(entry("two", RatingCategory::Teen).with_id(id)),
            Err(Error::DuplicateEntry(dup)) if dup == id
        ));
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn test_blocked_entry_rejected() {
        let gallery = Gallery::new();
        let blocked = GalleryEntry::new(
            Prompt::new("anything").unwrap(),
            ImageHandle::new(vec![0u8; 8], "image/png"),
            RatingCategory::Adult,
            true,
            vec!["policy violation".to_string()],
        );

        assert!(matches!(gallery.append(blocked), Err(Error::BlockedEntry)));
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let gallery = Gallery::new();
        let id = EntryId::generate();
        gallery.append(entry("one", RatingCategory::General).with_id(id)).unwrap();

        gallery.clear();
        assert!(gallery.is_empty());
        assert!(gallery.append(entry("again", RatingCategory::General).with_id(id)).is_err());
    }

    #[test]
    fn test_closed_gallery_refuses_appends() {
        let gallery = Gallery::new();
        gallery.append(entry("one", RatingCategory::General)).unwrap();

        assert_eq!(gallery.close(), 1);
        assert!(gallery.is_closed());
        assert!(matches!(
            gallery.append(entry("late", RatingCategory::General)),
            Err(Error::Cancelled)
        ));
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_filter_is_reversible() {
        let gallery = Gallery::new();
        gallery.append(entry("calm lake", RatingCategory::General)).unwrap();
        gallery.append(entry("explicit", RatingCategory::Adult)).unwrap();
        gallery.append(entry("battle", RatingCategory::Mature)).unwrap();

        let hidden = gallery.list(GalleryView::hide_adult());
        assert_eq!(hidden.len(), 2);
        assert_eq!(hidden.hidden(), 1);

        let shown = gallery.list(GalleryView::all());
        assert_eq!(shown.len(), 3);
        assert_eq!(gallery.len(), 3);
    }

    #[test]
    fn test_listing_is_restartable_snapshot() {
        let gallery = Gallery::new();
        gallery.append(entry("first", RatingCategory::General)).unwrap();
        let listing = gallery.list(GalleryView::all());
        gallery.append(entry("second", RatingCategory::General)).unwrap();

        assert_eq!(listing.len(), 1);
        let first_pass: Vec<_> = listing.iter().map(|e| e.id()).collect();
        let second_pass: Vec<_> = (&listing).into_iter().map(|e| e.id()).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_newest_first_and_counts() {
        let gallery = Gallery::new();
        gallery.append(entry("first", RatingCategory::Teen)).unwrap();
        gallery.append(entry("second", RatingCategory::Teen)).unwrap();
        gallery.append(entry("third", RatingCategory::Adult)).unwrap();

        let listing = gallery.list(GalleryView::all());
        let texts: Vec<_> = listing.iter_newest_first().map(|e| e.prompt().text()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);

        let counts = gallery.counts();
        assert_eq!(counts.get(&RatingCategory::Teen), Some(&2));
        assert_eq!(counts.get(&RatingCategory::Adult), Some(&1));
        assert_eq!(counts.get(&RatingCategory::General), None);
    }

    fn rating() -> impl Strategy<Value = RatingCategory> {
        prop_oneof![
            Just(RatingCategory::General),
            Just(RatingCategory::Teen),
            Just(RatingCategory::Mature),
            Just(RatingCategory::Adult),
        ]
    }

    proptest! {
        #[test]
        fn prop_hide_adult_excludes_exactly_adult(
            ratings in prop::collection::vec(rating(), 0..40)
        ) {
            let gallery = Gallery::new();
            let mut ids = Vec::new();
            for (i, rating) in ratings.iter().enumerate() {
                ids.push(gallery.append(entry(&format!("entry {}", i), *rating)).unwrap());
            }

            let all: Vec<_> = gallery
                .list(GalleryView::all())
                .iter()
                .map(|e| e.id().unwrap())
                .collect();
            prop_assert_eq!(&all, &ids);

            let visible: Vec<_> = gallery
                .list(GalleryView::hide_adult())
                .iter()
                .map(|e| e.id().unwrap())
                .collect();
            let expected: Vec<_> = ids
                .iter()
                .zip(&ratings)
                .filter(|(_, rating)| **rating != RatingCategory::Adult)
                .map(|(id, _)| *id)
                .collect();
            prop_assert_eq!(visible, expected);
        }
    }
}
