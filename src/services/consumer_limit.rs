//! Consumer limit management

use std::sync::Arc;
use std::time::Duration;

use super::{with_deadline, LimitLedger};
use crate::error::CreditError;
use crate::models::{
    fits_money_scale, ConsumerLimit, ConsumerLimitRequest, NewConsumerLimit, RemainingLimit,
    Tenure, MONEY_SCALE,
};
use crate::repository::{ConsumerLimitRepository, ConsumerRepository, Repositories};

#[derive(Clone)]
pub struct ConsumerLimitService {
    consumers: Arc<dyn ConsumerRepository>,
    limits: Arc<dyn ConsumerLimitRepository>,
    ledger: LimitLedger,
    deadline: Duration,
}

impl ConsumerLimitService {
    pub fn new(repos: &Repositories, deadline: Duration) -> Self {
        Self {
            consumers: repos.consumers.clone(),
            limits: repos.limits.clone(),
            ledger: LimitLedger::new(repos),
            deadline,
        }
    }

    /// Create the limit for (consumer, tenure), or replace its amount if one exists
    pub async fn create_or_update_consumer_limit(
        &self,
        request: ConsumerLimitRequest,
    ) -> Result<ConsumerLimit, CreditError> {
        with_deadline(self.deadline, async {
            let tenure = Tenure::new(request.tenure)?;
            if request.limit_amount.is_sign_negative() && !request.limit_amount.is_zero() {
                return Err(CreditError::InvalidAmount(format!(
                    "limit amount must not be negative, got {}",
                    request.limit_amount
                )));
            }
            if !fits_money_scale(&request.limit_amount) {
                return Err(CreditError::InvalidAmount(format!(
                    "limit amount {} has more than {} decimal places",
                    request.limit_amount, MONEY_SCALE
                )));
            }

            self.consumers
                .get_consumer_by_id(request.consumer_id)
                .await?
                .ok_or(CreditError::ConsumerNotFound(request.consumer_id))?;

            let existing = self
                .limits
                .get_limit_by_tenure_and_consumer_id(tenure, request.consumer_id)
                .await?;

            let limit = match existing {
                Some(limit) => {
                    self.limits
                        .update_limit_amount(limit.id, request.limit_amount)
                        .await?
                }
                None => {
                    self.limits
                        .create_limit(NewConsumerLimit {
                            consumer_id: request.consumer_id,
                            tenure,
                            limit_amount: request.limit_amount,
                        })
                        .await?
                }
            };

            tracing::info!(
                limit_id = %limit.id,
                consumer_id = %limit.consumer_id,
                tenure = %limit.tenure,
                limit_amount = %limit.limit_amount,
                "Consumer limit saved"
            );

            Ok(limit)
        })
        .await
    }

    pub async fn get_consumer_limits_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> Result<Vec<ConsumerLimit>, CreditError> {
        with_deadline(self.deadline, async {
            Ok(self.limits.get_limits_by_consumer_id(consumer_id).await?)
        })
        .await
    }

    /// Limit for one (consumer, tenure) with the amount still free under it
    pub async fn get_remaining_limit(
        &self,
        consumer_id: i64,
        tenure: i16,
    ) -> Result<RemainingLimit, CreditError> {
        with_deadline(self.deadline, self.ledger.remaining_limit(consumer_id, tenure)).await
    }

    pub async fn delete_consumer_limit(&self, id: i64) -> Result<(), CreditError> {
        with_deadline(self.deadline, async {
            if !self.limits.delete_limit(id).await? {
                return Err(CreditError::ConsumerLimitNotFound(id));
            }
            tracing::info!(limit_id = %id, "Consumer limit deleted");
            Ok(())
        })
        .await
    }
}
