pub mod account;
pub mod campaign;
pub mod constants;
pub mod error;
pub mod event;
pub mod genesis;
pub mod governance;
pub mod nft;
pub mod primitives;
pub mod roles;
pub mod transition;
