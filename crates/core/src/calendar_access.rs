//! Calendar sharing model: roles, guards, and role transitions.
//!
//! A calendar aggregate carries a single owner plus two disjoint id sets,
//! `editors` (may write events) and `members` (read-only). Every mutation of
//! those sets goes through [`CalendarAccess::set_role`] or
//! [`CalendarAccess::remove_member`] so the disjointness holds after any
//! sequence of operations.
//!
//! Main calendars (one per user, created at registration) and holiday
//! calendars can never be shared. Main calendars additionally can never be
//! deleted, hidden, or renamed.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Role name accepted by invite / role-update requests for write access.
pub const SHARE_ROLE_EDITOR: &str = "editor";

/// Role name accepted by invite / role-update requests for read access.
pub const SHARE_ROLE_MEMBER: &str = "member";

/// The relationship a user has with a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarRole {
    Owner,
    Editor,
    Member,
}

/// A role the owner can grant to another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareRole {
    Editor,
    Member,
}

impl ShareRole {
    /// `"editor"` grants write access; anything else is read-only membership.
    pub fn from_request(role: &str) -> Self {
        if role == SHARE_ROLE_EDITOR {
            ShareRole::Editor
        } else {
            ShareRole::Member
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShareRole::Editor => SHARE_ROLE_EDITOR,
            ShareRole::Member => SHARE_ROLE_MEMBER,
        }
    }
}

// ---------------------------------------------------------------------------
// Actions and denials
// ---------------------------------------------------------------------------

/// An operation a user asks to perform on a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    View,
    Update,
    Delete,
    Hide,
    Show,
    /// Invite a user or change an existing user's role.
    Share { target: DbId },
    /// Remove a user from both role sets.
    RemoveMember { target: DbId },
}

/// Why a [`CalendarAction`] was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("Calendar is not visible to this user")]
    NotVisible,

    #[error("Only the calendar owner can {0} it")]
    NotOwner(&'static str),

    #[error("Only the calendar owner or the member themself can remove a member")]
    NotOwnerOrSelf,

    #[error("The main calendar cannot be {0}")]
    MainCalendar(&'static str),

    #[error("The holiday calendar cannot be {0}")]
    HolidayCalendar(&'static str),

    #[error("The calendar owner cannot be given a shared role")]
    TargetIsOwner,
}

impl AccessDenied {
    /// Convert into the domain error used by the HTTP layer.
    ///
    /// Invisible calendars report as missing so their existence is not leaked.
    pub fn into_core(self, calendar_id: DbId) -> CoreError {
        match self {
            AccessDenied::NotVisible => CoreError::NotFound {
                entity: "Calendar",
                id: calendar_id,
            },
            AccessDenied::NotOwner(_) | AccessDenied::NotOwnerOrSelf => {
                CoreError::Forbidden(self.to_string())
            }
            AccessDenied::MainCalendar(_)
            | AccessDenied::HolidayCalendar(_)
            | AccessDenied::TargetIsOwner => CoreError::Validation(self.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// The access-relevant slice of a calendar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarAccess {
    pub owner_id: DbId,
    pub editors: Vec<DbId>,
    pub members: Vec<DbId>,
    pub is_main: bool,
    pub is_holiday_calendar: bool,
    pub is_hidden: bool,
}

impl CalendarAccess {
    /// Access state of a freshly created, unshared calendar.
    pub fn new_owned(owner_id: DbId) -> Self {
        Self {
            owner_id,
            editors: Vec::new(),
            members: Vec::new(),
            is_main: false,
            is_holiday_calendar: false,
            is_hidden: false,
        }
    }

    pub fn role_of(&self, user_id: DbId) -> Option<CalendarRole> {
        if self.owner_id == user_id {
            Some(CalendarRole::Owner)
        } else if self.editors.contains(&user_id) {
            Some(CalendarRole::Editor)
        } else if self.members.contains(&user_id) {
            Some(CalendarRole::Member)
        } else {
            None
        }
    }

    pub fn can_view(&self, user_id: DbId) -> bool {
        self.role_of(user_id).is_some()
    }

    fn is_owner(&self, user_id: DbId) -> bool {
        self.owner_id == user_id
    }

    fn unshareable(&self) -> Result<(), AccessDenied> {
        if self.is_main {
            return Err(AccessDenied::MainCalendar("shared"));
        }
        if self.is_holiday_calendar {
            return Err(AccessDenied::HolidayCalendar("shared"));
        }
        Ok(())
    }

    /// Decide whether `requester` may perform `action`.
    ///
    /// Calendar-kind guards run before the ownership guard, so a main or
    /// holiday calendar refuses a protected action no matter who asks.
    pub fn authorize(&self, requester: DbId, action: CalendarAction) -> Result<(), AccessDenied> {
        match action {
            CalendarAction::View => {
                if self.can_view(requester) {
                    Ok(())
                } else {
                    Err(AccessDenied::NotVisible)
                }
            }
            CalendarAction::Update => {
                if self.is_owner(requester) {
                    Ok(())
                } else {
                    Err(AccessDenied::NotOwner("update"))
                }
            }
            CalendarAction::Delete => {
                if self.is_main {
                    return Err(AccessDenied::MainCalendar("deleted"));
                }
                if self.is_holiday_calendar {
                    return Err(AccessDenied::HolidayCalendar("deleted"));
                }
                if !self.is_owner(requester) {
                    return Err(AccessDenied::NotOwner("delete"));
                }
                Ok(())
            }
            CalendarAction::Hide => {
                if self.is_main {
                    return Err(AccessDenied::MainCalendar("hidden"));
                }
                if !self.is_owner(requester) {
                    return Err(AccessDenied::NotOwner("hide"));
                }
                Ok(())
            }
            CalendarAction::Show => {
                if self.is_owner(requester) {
                    Ok(())
                } else {
                    Err(AccessDenied::NotOwner("show"))
                }
            }
            CalendarAction::Share { target } => {
                self.unshareable()?;
                if !self.is_owner(requester) {
                    return Err(AccessDenied::NotOwner("share"));
                }
                if target == self.owner_id {
                    return Err(AccessDenied::TargetIsOwner);
                }
                Ok(())
            }
            CalendarAction::RemoveMember { target } => {
                self.unshareable()?;
                if self.is_owner(requester) || requester == target {
                    Ok(())
                } else {
                    Err(AccessDenied::NotOwnerOrSelf)
                }
            }
        }
    }

    /// Place `user_id` in exactly one of the role sets.
    ///
    /// The user is removed from the other set first, so editors and members
    /// stay disjoint. Re-applying the current role is a no-op.
    pub fn set_role(&mut self, user_id: DbId, role: ShareRole) {
        let (grant, revoke) = match role {
            ShareRole::Editor => (&mut self.editors, &mut self.members),
            ShareRole::Member => (&mut self.members, &mut self.editors),
        };
        revoke.retain(|id| *id != user_id);
        if !grant.contains(&user_id) {
            grant.push(user_id);
        }
    }

    /// Remove `user_id` from both role sets. Returns `true` if it was present.
    pub fn remove_member(&mut self, user_id: DbId) -> bool {
        let before = self.editors.len() + self.members.len();
        self.editors.retain(|id| *id != user_id);
        self.members.retain(|id| *id != user_id);
        before != self.editors.len() + self.members.len()
    }
}

// ---------------------------------------------------------------------------
// Editable details
// ---------------------------------------------------------------------------

/// User-editable calendar fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDetails {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub holiday_country: Option<String>,
    pub holiday_year: Option<i32>,
}

/// Partial update of [`CalendarDetails`]. `None` keeps the stored value.
///
/// `description` and `color` are nullable: `Some(None)` (an explicit JSON
/// `null`) clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub color: Option<Option<String>>,
    pub holiday_country: Option<String>,
    pub holiday_year: Option<i32>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CalendarDetails {
    /// Merge a patch into the current details.
    ///
    /// A main calendar keeps its name and a holiday calendar keeps its
    /// holiday source, whatever the patch says.
    pub fn apply(&self, patch: CalendarPatch, access: &CalendarAccess) -> CalendarDetails {
        let mut next = CalendarDetails {
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            description: patch
                .description
                .unwrap_or_else(|| self.description.clone()),
            color: patch.color.unwrap_or_else(|| self.color.clone()),
            holiday_country: patch
                .holiday_country
                .or_else(|| self.holiday_country.clone()),
            holiday_year: patch.holiday_year.or(self.holiday_year),
        };

        if access.is_main {
            next.name = self.name.clone();
        }
        if access.is_holiday_calendar {
            next.holiday_country = self.holiday_country.clone();
            next.holiday_year = self.holiday_year;
        }
        next
    }
}
