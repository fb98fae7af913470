use crate::{domain::UserId, users::UserRegistry, Result};

/// Ordinal rank derived from a user's stored flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    #[default]
    None = 0,
    Moderator = 1,
    Admin = 2,
}

impl Privilege {
    pub fn from_flags(is_admin: bool, is_moderator: bool) -> Self {
        if is_admin {
            Self::Admin
        } else if is_moderator {
            Self::Moderator
        } else {
            Self::None
        }
    }

    /// Requirement implied by a command's schema flags.
    pub fn required_by(requires_moderator: bool, requires_admin: bool) -> Self {
        Self::from_flags(requires_admin, requires_moderator)
    }
}

/// Look the user up and rank them. Users without a record rank `None`.
///
/// Always reads the store; privileges are never cached.
pub async fn privilege_level(users: &UserRegistry, user_id: UserId) -> Result<Privilege> {
    Ok(users
        .find(user_id)
        .await?
        .map(|u| Privilege::from_flags(u.is_admin, u.is_moderator))
        .unwrap_or_default())
}
