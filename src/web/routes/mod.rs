pub mod account;
pub mod auth;
pub mod location;
pub mod pages;
pub mod settings;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
