use model::entities::{
    deal::{self, DealStatus, Gender, Project},
    sales_return, user,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::Store;
use crate::error::{Result, StoreError};
use crate::filters::{DealFilter, PageWindow};
use crate::money::normalize;

/// A deal together with its owning manager (absent only if the row vanished).
#[derive(Debug, Clone, PartialEq)]
pub struct DealWithManager {
    pub deal: deal::Model,
    pub manager: Option<user::Model>,
}

#[derive(Debug, Clone)]
pub struct NewDeal {
    pub client_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub project: Project,
    pub program: String,
    pub manager_id: Uuid,
    pub status: DealStatus,
    pub amount: Decimal,
    /// Defaults to zero
    pub paid_amount: Option<Decimal>,
    pub source: Option<String>,
    pub marketing_channel: Option<String>,
    pub payment_method: Option<String>,
    pub gender: Option<Gender>,
    pub client_segment: Option<String>,
    pub comments: Option<String>,
    pub bank_order_number: Option<String>,
}

/// Changes to an existing deal. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct DealChanges {
    /// Re-checked against the locked row; the update fails with
    /// `OwnerMismatch` when the deal is owned by someone else.
    pub expected_manager: Option<Uuid>,
    pub client_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Option<String>>,
    pub project: Option<Project>,
    pub program: Option<String>,
    pub manager_id: Option<Uuid>,
    pub status: Option<DealStatus>,
    pub amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub source: Option<Option<String>>,
    pub marketing_channel: Option<Option<String>>,
    pub payment_method: Option<Option<String>>,
    pub gender: Option<Option<Gender>>,
    pub client_segment: Option<Option<String>>,
    pub comments: Option<Option<String>>,
    pub bank_order_number: Option<Option<String>>,
}

fn check_amounts(amount: Decimal, paid: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(StoreError::invalid("amount", "Amount cannot be negative"));
    }
    if paid.is_sign_negative() && !paid.is_zero() {
        return Err(StoreError::invalid("paidAmount", "Paid amount cannot be negative"));
    }
    if paid > amount {
        return Err(StoreError::invalid(
            "paidAmount",
            "Paid amount cannot exceed the deal amount",
        ));
    }
    Ok(())
}

impl Store {
    /// Loads one deal with its manager.
    #[instrument(skip(self))]
    pub async fn get_deal(&self, id: Uuid) -> Result<DealWithManager> {
        let (deal, manager) = deal::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("deal", id))?;

        Ok(DealWithManager { deal, manager })
    }

    /// Deals matching the filter, newest first, optionally one page of them.
    #[instrument(skip(self))]
    pub async fn list_deals(
        &self,
        filter: &DealFilter,
        window: Option<PageWindow>,
    ) -> Result<Vec<DealWithManager>> {
        let mut query = deal::Entity::find()
            .find_also_related(user::Entity)
            .filter(filter.condition())
            .order_by_desc(deal::Column::CreatedAt)
            .order_by_desc(deal::Column::Id);

        if let Some(window) = window {
            query = query.limit(window.limit).offset(window.offset());
        }

        let rows = query.all(&self.db).await?;
        debug!("Listed {} deals", rows.len());

        Ok(rows
            .into_iter()
            .map(|(deal, manager)| DealWithManager { deal, manager })
            .collect())
    }

    /// Number of deals matching the filter.
    #[instrument(skip(self))]
    pub async fn count_deals(&self, filter: &DealFilter) -> Result<u64> {
        Ok(deal::Entity::find()
            .join(JoinType::LeftJoin, deal::Relation::Manager.def())
            .filter(filter.condition())
            .count(&self.db)
            .await?)
    }

    /// Plain deal rows for aggregation, oldest first.
    #[instrument(skip(self))]
    pub async fn find_deals(&self, filter: &DealFilter) -> Result<Vec<deal::Model>> {
        Ok(deal::Entity::find()
            .join(JoinType::LeftJoin, deal::Relation::Manager.def())
            .filter(filter.condition())
            .order_by_asc(deal::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Inserts a deal with `remaining = amount - paid`.
    #[instrument(skip(self, new_deal), fields(manager_id = %new_deal.manager_id))]
    pub async fn create_deal(&self, new_deal: NewDeal) -> Result<DealWithManager> {
        let amount = new_deal.amount;
        let paid = new_deal.paid_amount.unwrap_or(Decimal::ZERO);
        check_amounts(amount, paid)?;

        let model = deal::ActiveModel {
            client_name: Set(new_deal.client_name),
            phone: Set(new_deal.phone),
            email: Set(new_deal.email),
            project: Set(new_deal.project),
            program: Set(new_deal.program),
            manager_id: Set(new_deal.manager_id),
            status: Set(new_deal.status),
            amount: Set(amount),
            paid_amount: Set(paid),
            remaining_amount: Set(amount - paid),
            source: Set(new_deal.source),
            marketing_channel: Set(new_deal.marketing_channel),
            payment_method: Set(new_deal.payment_method),
            gender: Set(new_deal.gender),
            client_segment: Set(new_deal.client_segment),
            comments: Set(new_deal.comments),
            bank_order_number: Set(new_deal.bank_order_number),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(deal_id = %model.id, "Created deal");
        self.get_deal(model.id).await
    }

    /// Merges the changes into the stored deal and recomputes the remaining
    /// amount from the merged values.
    ///
    /// The read-merge-write runs in one transaction holding an exclusive lock
    /// on the row, so concurrent payment updates cannot overwrite each other.
    #[instrument(skip(self, changes))]
    pub async fn update_deal(&self, id: Uuid, changes: DealChanges) -> Result<DealWithManager> {
        let txn = self.db.begin().await?;

        let existing = deal::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::not_found("deal", id))?;
        if changes
            .expected_manager
            .is_some_and(|owner| owner != existing.manager_id)
        {
            return Err(StoreError::OwnerMismatch { entity: "deal", id });
        }

        let amount = changes.amount.unwrap_or_else(|| normalize(existing.amount));
        let paid = changes
            .paid_amount
            .unwrap_or_else(|| normalize(existing.paid_amount));
        check_amounts(amount, paid)?;

        let mut active = existing.into_active_model();
        if let Some(client_name) = changes.client_name {
            active.client_name = Set(client_name);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(phone);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(project) = changes.project {
            active.project = Set(project);
        }
        if let Some(program) = changes.program {
            active.program = Set(program);
        }
        if let Some(manager_id) = changes.manager_id {
            active.manager_id = Set(manager_id);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(source) = changes.source {
            active.source = Set(source);
        }
        if let Some(marketing_channel) = changes.marketing_channel {
            active.marketing_channel = Set(marketing_channel);
        }
        if let Some(payment_method) = changes.payment_method {
            active.payment_method = Set(payment_method);
        }
        if let Some(gender) = changes.gender {
            active.gender = Set(gender);
        }
        if let Some(client_segment) = changes.client_segment {
            active.client_segment = Set(client_segment);
        }
        if let Some(comments) = changes.comments {
            active.comments = Set(comments);
        }
        if let Some(bank_order_number) = changes.bank_order_number {
            active.bank_order_number = Set(bank_order_number);
        }
        active.amount = Set(amount);
        active.paid_amount = Set(paid);
        active.remaining_amount = Set(amount - paid);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        debug!(
            deal_id = %updated.id,
            amount = %amount,
            paid = %paid,
            "Updated deal"
        );
        self.get_deal(updated.id).await
    }

    /// Deletes a deal and its returns in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_deal(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;

        if deal::Entity::find_by_id(id).one(&txn).await?.is_none() {
            warn!(deal_id = %id, "Deal to delete not found");
            return Err(StoreError::not_found("deal", id));
        }

        let removed = sales_return::Entity::delete_many()
            .filter(sales_return::Column::DealId.eq(id))
            .exec(&txn)
            .await?;
        deal::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            deal_id = %id,
            returns_removed = removed.rows_affected,
            "Deleted deal"
        );
        Ok(())
    }
}
