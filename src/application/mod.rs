pub mod checkout_service;
pub mod notifier;
pub mod order_service;
pub mod payment_confirmation;

#[cfg(test)]
pub(crate) mod testing;
