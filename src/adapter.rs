//! Binding of category records to reusable list rows.
//!
//! The host list widget owns row recycling. It asks the adapter for a row
//! count, for fresh row holders, and to bind a holder to a position. Cover
//! images are handed off to an [`ImageLoader`] and never awaited here.

use std::rc::Rc;

use crate::models::CategoryRecord;

/// A reusable row: one text element for the name, one image element for the cover.
pub trait RowHolder {
    type Cover: ?Sized;

    fn set_name(&self, name: &str);

    fn cover(&self) -> &Self::Cover;
}

/// Builds standalone row holders. The caller attaches them to its container.
pub trait RowFactory {
    type Parent: ?Sized;
    type Holder: RowHolder;

    fn create_row(&self, parent: &Self::Parent) -> Self::Holder;
}

/// Fire-and-forget image loading into a target element.
///
/// Failures, retries and cancellation of stale loads are the loader's business.
pub trait ImageLoader<T: ?Sized> {
    fn load(&self, url: &str, target: &T);
}

impl<T: ?Sized, L: ImageLoader<T> + ?Sized> ImageLoader<T> for Rc<L> {
    fn load(&self, url: &str, target: &T) {
        (**self).load(url, target)
    }
}

/// Splice counts returned when the backing records are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsChanged {
    pub removed: usize,
    pub added: usize,
}

pub struct CategoryListAdapter<F, L> {
    records: Rc<[CategoryRecord]>,
    factory: F,
    loader: L,
}

impl<F, L> CategoryListAdapter<F, L>
where
    F: RowFactory,
    L: ImageLoader<<F::Holder as RowHolder>::Cover>,
{
    pub fn new(records: impl Into<Rc<[CategoryRecord]>>, factory: F, loader: L) -> Self {
        Self {
            records: records.into(),
            factory,
            loader,
        }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Create a new, unbound row holder. Holders are not tied to a position.
    pub fn create_row_holder(&self, parent: &F::Parent) -> F::Holder {
        self.factory.create_row(parent)
    }

    /// Show the record at `position` in `holder` and request its cover.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.row_count()`. The host widget only binds
    /// positions it was told exist.
    pub fn bind_row(&self, holder: &F::Holder, position: usize) {
        let record = &self.records[position];
        holder.set_name(record.name());
        self.loader.load(record.cover_url(), holder.cover());
    }

    pub fn record(&self, position: usize) -> Option<&CategoryRecord> {
        self.records.get(position)
    }

    pub fn records(&self) -> &Rc<[CategoryRecord]> {
        &self.records
    }

    /// Swap in a new backing sequence. The host must splice its model with
    /// the returned counts before trusting `row_count` again.
    pub fn replace_records(&mut self, records: impl Into<Rc<[CategoryRecord]>>) -> RowsChanged {
        let removed = self.records.len();
        self.records = records.into();
        RowsChanged {
            removed,
            added: self.records.len(),
        }
    }
}
