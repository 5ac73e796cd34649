use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, Iterable};

use super::deal::Project;

/// What a user is allowed to do in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "financist")]
    Financist,
}

impl Role {
    /// Parses the wire value (`admin`, `manager`, `financist`).
    pub fn parse(value: &str) -> Option<Self> {
        Self::iter().find(|role| role.to_value() == value)
    }
}

/// A person who can sign in: administrators, sales managers and financists.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2id PHC string. Never leaves the store layer.
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    /// Only meaningful for managers.
    pub project: Option<Project>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A manager owns many deals.
    #[sea_orm(has_many = "super::deal::Entity")]
    Deal,
    /// A manager has many plans.
    #[sea_orm(has_many = "super::plan::Entity")]
    Plan,
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            if self.id.is_not_set() {
                self.id = Set(uuid::Uuid::new_v4());
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
