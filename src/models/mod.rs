mod client;
mod phone;

pub use client::{Client, ClientChanges, ClientFilter, NewClient};
pub use phone::Phone;
