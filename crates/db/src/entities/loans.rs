//! `SeaORM` Entity for the loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LoanStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub principal: Decimal,
    pub rate: Decimal,
    pub total_payable: Decimal,
    pub status: LoanStatus,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loan_votes::Entity")]
    LoanVotes,
    #[sea_orm(has_many = "super::loan_repayments::Entity")]
    LoanRepayments,
}

impl Related<super::loan_votes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanVotes.def()
    }
}

impl Related<super::loan_repayments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanRepayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
