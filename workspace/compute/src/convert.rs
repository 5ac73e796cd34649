//! Mapping store rows onto the response DTOs.

use common::{
    DealDto, PlanDto, ReturnDealSummary, ReturnDto, UserDto, format_money,
};
use model::entities::user;
use sea_orm::ActiveEnum;
use store::{DealWithManager, PlanWithManager, ReturnWithDeal};

pub fn user_dto(user: &user::Model) -> UserDto {
    UserDto {
        id: user.id,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        role: user.role.to_value(),
        project: user.project.map(|p| p.to_value()),
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub fn deal_dto(row: &DealWithManager) -> DealDto {
    let deal = &row.deal;
    DealDto {
        id: deal.id,
        client_name: deal.client_name.clone(),
        phone: deal.phone.clone(),
        email: deal.email.clone(),
        project: deal.project.to_value(),
        program: deal.program.clone(),
        manager_id: deal.manager_id,
        manager_name: row.manager.as_ref().map(|m| m.full_name.clone()),
        status: deal.status.to_value(),
        amount: format_money(deal.amount),
        paid_amount: format_money(deal.paid_amount),
        remaining_amount: format_money(deal.remaining_amount),
        source: deal.source.clone(),
        marketing_channel: deal.marketing_channel.clone(),
        payment_method: deal.payment_method.clone(),
        gender: deal.gender.map(|g| g.to_value()),
        client_segment: deal.client_segment.clone(),
        comments: deal.comments.clone(),
        bank_order_number: deal.bank_order_number.clone(),
        created_at: deal.created_at,
        updated_at: deal.updated_at,
    }
}

pub fn return_dto(row: &ReturnWithDeal) -> ReturnDto {
    let ret = &row.ret;
    ReturnDto {
        id: ret.id,
        deal_id: ret.deal_id,
        return_date: ret.return_date,
        return_amount: format_money(ret.return_amount),
        return_reason: ret.return_reason.clone(),
        status: ret.status.to_value(),
        processed_by: ret.processed_by,
        processor_name: row.processor.as_ref().map(|p| p.full_name.clone()),
        deal: ReturnDealSummary {
            id: row.deal.id,
            client_name: row.deal.client_name.clone(),
            project: row.deal.project.to_value(),
            program: row.deal.program.clone(),
            manager_id: row.deal.manager_id,
            manager_name: row.manager.as_ref().map(|m| m.full_name.clone()),
            paid_amount: format_money(row.deal.paid_amount),
        },
        created_at: ret.created_at,
        updated_at: ret.updated_at,
    }
}

pub fn plan_dto(row: &PlanWithManager) -> PlanDto {
    let plan = &row.plan;
    PlanDto {
        id: plan.id,
        project: plan.project.to_value(),
        manager_id: plan.manager_id,
        manager_name: row.manager.as_ref().map(|m| m.full_name.clone()),
        plan_type: plan.plan_type.to_value(),
        year: plan.year,
        month: plan.month,
        planned_amount: format_money(plan.planned_amount),
        planned_deals: plan.planned_deals,
        is_active: plan.is_active,
        created_at: plan.created_at,
        updated_at: plan.updated_at,
    }
}
