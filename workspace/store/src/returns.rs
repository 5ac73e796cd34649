use chrono::{DateTime, Utc};
use model::entities::{
    deal,
    sales_return::{self, ReturnStatus},
    user,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, EntityTrait, IntoActiveModel, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::Store;
use crate::error::{Result, StoreError};
use crate::filters::{PageWindow, ReturnFilter};

/// A return with the deal it belongs to, the deal's manager and whoever
/// processed the return.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnWithDeal {
    pub ret: sales_return::Model,
    pub deal: deal::Model,
    pub manager: Option<user::Model>,
    pub processor: Option<user::Model>,
}

#[derive(Debug, Clone)]
pub struct NewReturn {
    pub deal_id: Uuid,
    pub return_date: DateTime<Utc>,
    pub return_amount: Decimal,
    pub return_reason: String,
    pub status: ReturnStatus,
    pub processed_by: Option<Uuid>,
}

/// Changes to an existing return. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ReturnChanges {
    pub return_date: Option<DateTime<Utc>>,
    pub return_amount: Option<Decimal>,
    pub return_reason: Option<String>,
    pub status: Option<ReturnStatus>,
    pub processed_by: Option<Option<Uuid>>,
}

/// Returns joined with their deal and the deal's manager, so that deal
/// constraints (ownership, project, manager search) can be applied.
fn joined_returns(filter: &ReturnFilter) -> Select<sales_return::Entity> {
    sales_return::Entity::find()
        .join(JoinType::InnerJoin, sales_return::Relation::Deal.def())
        .join(JoinType::LeftJoin, deal::Relation::Manager.def())
        .filter(filter.condition())
}

impl Store {
    #[instrument(skip(self))]
    pub async fn get_return(&self, id: Uuid) -> Result<ReturnWithDeal> {
        let row = sales_return::Entity::find_by_id(id)
            .find_also_related(deal::Entity)
            .one(&self.db)
            .await?;

        let Some((ret, Some(deal))) = row else {
            return Err(StoreError::not_found("return", id));
        };

        self.enrich_returns(vec![(ret, deal)])
            .await?
            .pop()
            .ok_or_else(|| StoreError::not_found("return", id))
    }

    /// Returns matching the filter, newest first, optionally one page of them.
    #[instrument(skip(self))]
    pub async fn list_returns(
        &self,
        filter: &ReturnFilter,
        window: Option<PageWindow>,
    ) -> Result<Vec<ReturnWithDeal>> {
        let mut query = sales_return::Entity::find()
            .find_also_related(deal::Entity)
            .join(JoinType::LeftJoin, deal::Relation::Manager.def())
            .filter(filter.condition())
            .order_by_desc(sales_return::Column::CreatedAt)
            .order_by_desc(sales_return::Column::Id);

        if let Some(window) = window {
            query = query.limit(window.limit).offset(window.offset());
        }

        let rows: Vec<_> = query
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(ret, deal)| deal.map(|deal| (ret, deal)))
            .collect();
        debug!("Listed {} returns", rows.len());

        self.enrich_returns(rows).await
    }

    #[instrument(skip(self))]
    pub async fn count_returns(&self, filter: &ReturnFilter) -> Result<u64> {
        Ok(joined_returns(filter).count(&self.db).await?)
    }

    /// Plain return rows with their deal, for aggregation.
    #[instrument(skip(self))]
    pub async fn find_returns(
        &self,
        filter: &ReturnFilter,
    ) -> Result<Vec<(sales_return::Model, deal::Model)>> {
        Ok(sales_return::Entity::find()
            .find_also_related(deal::Entity)
            .join(JoinType::LeftJoin, deal::Relation::Manager.def())
            .filter(filter.condition())
            .order_by_asc(sales_return::Column::ReturnDate)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(ret, deal)| deal.map(|deal| (ret, deal)))
            .collect())
    }

    /// Stores a return as given. The deal's paid amount is left alone:
    /// returns are tracked as their own ledger.
    #[instrument(skip(self, new_return), fields(deal_id = %new_return.deal_id))]
    pub async fn create_return(&self, new_return: NewReturn) -> Result<ReturnWithDeal> {
        let model = sales_return::ActiveModel {
            deal_id: Set(new_return.deal_id),
            return_date: Set(new_return.return_date),
            return_amount: Set(new_return.return_amount),
            return_reason: Set(new_return.return_reason),
            status: Set(new_return.status),
            processed_by: Set(new_return.processed_by),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(return_id = %model.id, "Created return");
        self.get_return(model.id).await
    }

    #[instrument(skip(self, changes))]
    pub async fn update_return(&self, id: Uuid, changes: ReturnChanges) -> Result<ReturnWithDeal> {
        let existing = sales_return::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("return", id))?;

        let mut active = existing.into_active_model();
        if let Some(return_date) = changes.return_date {
            active.return_date = Set(return_date);
        }
        if let Some(return_amount) = changes.return_amount {
            active.return_amount = Set(return_amount);
        }
        if let Some(return_reason) = changes.return_reason {
            active.return_reason = Set(return_reason);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(processed_by) = changes.processed_by {
            active.processed_by = Set(processed_by);
        }

        let updated = active.update(&self.db).await?;
        debug!(return_id = %updated.id, status = ?updated.status, "Updated return");
        self.get_return(updated.id).await
    }

    async fn enrich_returns(
        &self,
        rows: Vec<(sales_return::Model, deal::Model)>,
    ) -> Result<Vec<ReturnWithDeal>> {
        let user_ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|(ret, deal)| [Some(deal.manager_id), ret.processed_by])
            .flatten()
            .collect();
        let users = self.users_by_ids(&user_ids).await?;

        Ok(rows
            .into_iter()
            .map(|(ret, deal)| ReturnWithDeal {
                manager: users.get(&deal.manager_id).cloned(),
                processor: ret.processed_by.and_then(|id| users.get(&id).cloned()),
                ret,
                deal,
            })
            .collect())
    }
}
