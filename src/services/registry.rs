//! Consumer and merchant registration

use std::sync::Arc;
use std::time::Duration;

use super::with_deadline;
use crate::error::CreditError;
use crate::models::{
    Consumer, CreateConsumerRequest, CreateMerchantRequest, Merchant, PaginatedResponse,
    PaginationParams,
};
use crate::repository::{ConsumerRepository, MerchantRepository, Repositories};

#[derive(Clone)]
pub struct RegistryService {
    consumers: Arc<dyn ConsumerRepository>,
    merchants: Arc<dyn MerchantRepository>,
    deadline: Duration,
}

impl RegistryService {
    pub fn new(repos: &Repositories, deadline: Duration) -> Self {
        Self {
            consumers: repos.consumers.clone(),
            merchants: repos.merchants.clone(),
            deadline,
        }
    }

    pub async fn create_consumer(&self, request: CreateConsumerRequest) -> Result<Consumer, CreditError> {
        with_deadline(self.deadline, async {
            let consumer = self.consumers.create_consumer(request).await?;
            tracing::info!(consumer_id = %consumer.id, "Consumer registered");
            Ok(consumer)
        })
        .await
    }

    pub async fn get_consumer_by_id(&self, id: i64) -> Result<Consumer, CreditError> {
        with_deadline(self.deadline, async {
            self.consumers
                .get_consumer_by_id(id)
                .await?
                .ok_or(CreditError::ConsumerNotFound(id))
        })
        .await
    }

    pub async fn list_consumers(
        &self,
        params: PaginationParams,
    ) -> Result<PaginatedResponse<Consumer>, CreditError> {
        let (page, limit, offset) = params.resolve();
        with_deadline(self.deadline, async {
            let (data, total) = self.consumers.list_consumers(limit, offset).await?;
            Ok(PaginatedResponse {
                data,
                total,
                page,
                limit,
            })
        })
        .await
    }

    pub async fn create_merchant(&self, request: CreateMerchantRequest) -> Result<Merchant, CreditError> {
        with_deadline(self.deadline, async {
            let merchant = self.merchants.create_merchant(request).await?;
            tracing::info!(merchant_id = %merchant.id, "Merchant registered");
            Ok(merchant)
        })
        .await
    }

    pub async fn get_merchant_by_id(&self, id: i64) -> Result<Merchant, CreditError> {
        with_deadline(self.deadline, async {
            self.merchants
                .get_merchant_by_id(id)
                .await?
                .ok_or(CreditError::MerchantNotFound(id))
        })
        .await
    }
}
