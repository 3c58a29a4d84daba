//! Incident report entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: String,
    /// `pending` or `completed`.
    pub status: String,
    pub location: String,
    pub incident_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::officer::Entity",
        from = "Column::CreatedBy",
        to = "super::officer::Column::Id"
    )]
    Officer,
    #[sea_orm(has_many = "super::suspect::Entity")]
    Suspects,
    #[sea_orm(has_many = "super::evidence::Entity")]
    Evidence,
}

impl Related<super::officer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Officer.def()
    }
}

impl Related<super::suspect::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suspects.def()
    }
}

impl Related<super::evidence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evidence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
