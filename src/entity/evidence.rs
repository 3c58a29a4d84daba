//! Evidence entity: one stored media file per row.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "evidence")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub suspect_id: Uuid,
    /// Report the evidence belongs to.
    pub case_id: Uuid,
    pub added_by: String,
    /// `image` or `audio`.
    #[sea_orm(column_name = "type")]
    pub evidence_type: String,
    pub file_url: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suspect::Entity",
        from = "Column::SuspectId",
        to = "super::suspect::Column::Id"
    )]
    Suspect,
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::CaseId",
        to = "super::report::Column::Id"
    )]
    Report,
}

impl Related<super::suspect::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suspect.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
