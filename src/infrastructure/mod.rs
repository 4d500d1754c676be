pub mod mailer;
pub mod models;
pub mod order_repo;
pub mod payment;
pub mod settings_repo;

#[cfg(test)]
pub(crate) mod test_db;
