use async_trait::async_trait;
use log::info;

use crate::domain::errors::GatewayError;
use crate::domain::payment::{PaymentInitiation, PaymentRequest};
use crate::domain::ports::PaymentGateway;

/// Payment is collected by the courier, so there is nothing to set up online.
#[derive(Debug, Default, Clone, Copy)]
pub struct CashOnDeliveryGateway;

#[async_trait]
impl PaymentGateway for CashOnDeliveryGateway {
    fn name(&self) -> &'static str {
        "cash-on-delivery"
    }

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError> {
        info!("Order {} will be paid on delivery", request.order_id);
        Ok(PaymentInitiation::none())
    }
}
