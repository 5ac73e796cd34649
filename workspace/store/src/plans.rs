use model::entities::{
    deal::Project,
    plan::{self, PlanType},
    user,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::Store;
use crate::error::{Result, StoreError};
use crate::filters::PlanFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanWithManager {
    pub plan: plan::Model,
    pub manager: Option<user::Model>,
}

#[derive(Debug, Clone)]
pub struct NewPlan {
    pub project: Project,
    pub manager_id: Uuid,
    pub plan_type: PlanType,
    pub year: i32,
    pub month: i32,
    pub planned_amount: Decimal,
    pub planned_deals: i32,
    pub is_active: bool,
}

/// Changes to an existing plan. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PlanChanges {
    pub project: Option<Project>,
    pub manager_id: Option<Uuid>,
    pub plan_type: Option<PlanType>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub planned_amount: Option<Decimal>,
    pub planned_deals: Option<i32>,
    pub is_active: Option<bool>,
}

impl Store {
    /// Plans matching the filter, most recent period first.
    #[instrument(skip(self))]
    pub async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<PlanWithManager>> {
        Ok(plan::Entity::find()
            .find_also_related(user::Entity)
            .filter(filter.condition())
            .order_by_desc(plan::Column::Year)
            .order_by_desc(plan::Column::Month)
            .order_by_asc(plan::Column::PlanType)
            .order_by_asc(user::Column::FullName)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(plan, manager)| PlanWithManager { plan, manager })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_plan(&self, id: Uuid) -> Result<PlanWithManager> {
        let (plan, manager) = plan::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("plan", id))?;

        Ok(PlanWithManager { plan, manager })
    }

    #[instrument(skip(self, new_plan), fields(manager_id = %new_plan.manager_id))]
    pub async fn create_plan(&self, new_plan: NewPlan) -> Result<PlanWithManager> {
        let model = plan::ActiveModel {
            project: Set(new_plan.project),
            manager_id: Set(new_plan.manager_id),
            plan_type: Set(new_plan.plan_type),
            year: Set(new_plan.year),
            month: Set(new_plan.month),
            planned_amount: Set(new_plan.planned_amount),
            planned_deals: Set(new_plan.planned_deals),
            is_active: Set(new_plan.is_active),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(plan_id = %model.id, "Created plan");
        self.get_plan(model.id).await
    }

    #[instrument(skip(self, changes))]
    pub async fn update_plan(&self, id: Uuid, changes: PlanChanges) -> Result<PlanWithManager> {
        let existing = plan::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found("plan", id))?;

        let mut active = existing.into_active_model();
        if let Some(project) = changes.project {
            active.project = Set(project);
        }
        if let Some(manager_id) = changes.manager_id {
            active.manager_id = Set(manager_id);
        }
        if let Some(plan_type) = changes.plan_type {
            active.plan_type = Set(plan_type);
        }
        if let Some(year) = changes.year {
            active.year = Set(year);
        }
        if let Some(month) = changes.month {
            active.month = Set(month);
        }
        if let Some(planned_amount) = changes.planned_amount {
            active.planned_amount = Set(planned_amount);
        }
        if let Some(planned_deals) = changes.planned_deals {
            active.planned_deals = Set(planned_deals);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(&self.db).await?;
        self.get_plan(updated.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_manager, dec, setup_store};

    fn new_plan(manager_id: Uuid, year: i32, month: i32, plan_type: PlanType) -> NewPlan {
        NewPlan {
            project: Project::Amazon,
            manager_id,
            plan_type,
            year,
            month,
            planned_amount: dec("10000.00"),
            planned_deals: 5,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_plan_crud_and_ordering() {
        let store = setup_store().await;
        let m1 = create_manager(&store, "m1").await;
        let m2 = create_manager(&store, "m2").await;

        store
            .create_plan(new_plan(m1.id, 2024, 1, PlanType::FirstHalf))
            .await
            .unwrap();
        let latest = store
            .create_plan(new_plan(m2.id, 2024, 3, PlanType::SecondHalf))
            .await
            .unwrap();
        assert_eq!(latest.manager.as_ref().unwrap().id, m2.id);

        let plans = store.list_plans(&PlanFilter::default()).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].plan.id, latest.plan.id);

        let own = PlanFilter {
            manager_id: Some(m1.id),
            ..Default::default()
        };
        assert_eq!(store.list_plans(&own).await.unwrap().len(), 1);

        let march = store
            .list_plans(&PlanFilter::active_in_month(2024, 3))
            .await
            .unwrap();
        assert_eq!(march.len(), 1);

        let updated = store
            .update_plan(
                latest.plan.id,
                PlanChanges {
                    planned_amount: Some(dec("12000.00")),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.plan.planned_amount, dec("12000.00"));
        assert!(
            store
                .list_plans(&PlanFilter::active_in_month(2024, 3))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_missing_plan_is_not_found() {
        let store = setup_store().await;
        assert!(matches!(
            store.get_plan(Uuid::new_v4()).await.unwrap_err(),
            StoreError::NotFound { entity: "plan", .. }
        ));
    }
}
