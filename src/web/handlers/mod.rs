pub mod export;
pub mod pages;
pub mod search;
