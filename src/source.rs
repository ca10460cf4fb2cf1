pub mod http;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{data::PageResult, error::Result, genre::Genre};

/// Something that can fetch one page of a genre ranking
pub trait RankingSource {
    /// Fetch a 1-based `page` of `genre`.
    ///
    /// Implementations should give up with [`crate::error::RankingError::Cancelled`]
    /// once `cancel` fires.
    fn fetch_page(
        &self,
        genre: Genre,
        page: u32,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<PageResult>> + Send;
}
