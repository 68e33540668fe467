pub mod account;
pub mod book;
pub mod preference;
pub mod review;
pub mod summary;
