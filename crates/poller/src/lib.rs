pub mod fetcher;
pub mod poller;
pub mod response;
pub mod verdict;
