use chrono::Utc;
use replydesk_core::domain::policy::default_policies;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    CommandResult::data("policies", &default_policies(Utc::now()))
}
