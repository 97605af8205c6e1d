//! Outbound side effects that leave the process.
//!
//! - [`holidays`]: public-holiday feed client with an in-memory cache.
//! - [`delivery`]: email delivery for calendar invitations.
//!
//! Both are best-effort collaborators: a failure here is logged and never
//! fails the request that triggered it.

pub mod delivery;
pub mod holidays;

pub use delivery::email::{CalendarInviteEmail, EmailConfig, EmailDelivery};
pub use holidays::{HolidayClient, HolidaySource};
