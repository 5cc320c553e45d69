//! Raw token transfers and the fetcher that pages through them.

mod event;
mod fetcher;

pub use event::RawTransferEvent;
pub use fetcher::TransactionFetcher;
