use std::sync::atomic::{AtomicU32, Ordering};

use crate::metadata::tables::{MetadataEntity, RowId, TableId};

/// Explicit layout of a type
pub struct ClassLayout {
    pub(crate) row: RowId,
    /// Field alignment, a power of two up to 128 or 0
    pub packing_size: AtomicU32,
    /// Size of the type in bytes, 0 if not specified
    pub class_size: AtomicU32,
}

impl MetadataEntity for ClassLayout {
    const TABLE: TableId = TableId::ClassLayout;

    fn row_id(&self) -> &RowId {
        &self.row
    }
}

impl ClassLayout {
    /// Create a new layout
    #[must_use]
    pub fn new(packing_size: u16, class_size: u32) -> Self {
        ClassLayout {
            row: RowId::user(),
            packing_size: AtomicU32::new(u32::from(packing_size)),
            class_size: AtomicU32::new(class_size),
        }
    }

    /// The current packing size
    #[must_use]
    pub fn packing_size(&self) -> u32 {
        self.packing_size.load(Ordering::Acquire)
    }

    /// The current class size
    #[must_use]
    pub fn class_size(&self) -> u32 {
        self.class_size.load(Ordering::Acquire)
    }
}
