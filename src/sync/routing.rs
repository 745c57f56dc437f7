//! Business tag to index routing

use crate::search::{Biz, IndexView};
use crate::sync::error::{SyncError, SyncResult};
use std::str::FromStr;

/// Fixed tag -> index table for one view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRoutes {
    view: IndexView,
}

impl IndexRoutes {
    pub fn for_view(view: IndexView) -> Self {
        Self { view }
    }

    pub fn view(&self) -> IndexView {
        self.view
    }

    /// Entity and index for `tag`
    pub fn resolve(&self, tag: &str) -> SyncResult<(Biz, &'static str)> {
        let biz = Biz::from_str(tag).map_err(|_| SyncError::UnknownBiz(tag.to_string()))?;
        Ok((biz, biz.index_name(self.view)))
    }
}
