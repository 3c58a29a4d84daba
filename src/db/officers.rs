//! Database operations for officers.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};

use crate::entity::officer::{self, ActiveModel as OfficerActiveModel, Entity as OfficerEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewOfficer, Officer, OfficerId};

use super::DbPool;

impl DbPool {
    /// Officer id registered for `email` (exact match).
    pub async fn find_officer_id_by_email(&self, email: &str) -> AppResult<Option<OfficerId>> {
        let id: Option<String> = OfficerEntity::find()
            .select_only()
            .column(officer::Column::Id)
            .filter(officer::Column::Email.eq(email))
            .into_tuple()
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up officer: {}", e)))?;

        Ok(id.map(OfficerId::new))
    }

    pub async fn get_officer(&self, id: &OfficerId) -> AppResult<Option<Officer>> {
        let result = OfficerEntity::find_by_id(id.as_str().to_string())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get officer: {}", e)))?;

        Ok(result.map(model_to_officer))
    }

    pub async fn insert_officer(&self, new: NewOfficer) -> AppResult<Officer> {
        let model = OfficerActiveModel {
            id: Set(new.id.as_str().to_string()),
            name: Set(new.name),
            badge_number: Set(new.badge_number),
            rank: Set(new.rank),
            email: Set(new.email),
            contact: Set(new.contact),
            profile_picture: Set(new.profile_picture),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert officer: {}", e)))?;

        Ok(model_to_officer(result))
    }

    pub async fn update_officer_contact(&self, id: &OfficerId, contact: &str) -> AppResult<Officer> {
        let mut active = self.find_officer_model(id).await?;
        active.contact = Set(contact.to_string());
        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update contact: {}", e)))?;

        Ok(model_to_officer(updated))
    }

    pub async fn update_officer_picture(&self, id: &OfficerId, url: &str) -> AppResult<Officer> {
        let mut active = self.find_officer_model(id).await?;
        active.profile_picture = Set(Some(url.to_string()));
        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update profile picture: {}", e)))?;

        Ok(model_to_officer(updated))
    }

    async fn find_officer_model(&self, id: &OfficerId) -> AppResult<OfficerActiveModel> {
        let model = OfficerEntity::find_by_id(id.as_str().to_string())
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get officer: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Officer {}", id)))?;

        Ok(model.into())
    }
}

fn model_to_officer(m: officer::Model) -> Officer {
    Officer {
        id: OfficerId::new(m.id),
        name: m.name,
        badge_number: m.badge_number,
        rank: m.rank,
        email: m.email,
        contact: m.contact,
        profile_picture: m.profile_picture,
    }
}
