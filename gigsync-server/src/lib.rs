pub mod catalog;
pub mod config;
pub mod db;
pub mod gigs;
pub mod o11y;
pub mod rest_api;
pub mod shutdown;
pub mod sync;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseMedia {
    Json,
    MsgPack,
}
