use tracing::{info, warn};

use crate::{
    commands::CommandContext, domain::UserId, errors::Error, schema::MessageKey,
    users::UserRegistry, Result,
};

/// Result of applying a flag change to several users.
///
/// Stops at the first failure. Users handled before it keep their new flag.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub applied: usize,
    pub failure: Option<(UserId, Error)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Set `is_moderator` on each distinct target in order.
pub async fn apply_moderator_flag(
    users: &UserRegistry,
    targets: &[UserId],
    is_moderator: bool,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut seen = Vec::with_capacity(targets.len());

    for &target in targets {
        if seen.contains(&target) {
            continue;
        }
        seen.push(target);

        if let Err(e) = users.set_moderator(target, is_moderator).await {
            outcome.failure = Some((target, e));
            break;
        }
        outcome.applied += 1;
    }

    outcome
}

pub async fn grant_moderator(
    ctx: &CommandContext<'_>,
    requester: UserId,
    targets: &[UserId],
) -> Result<Option<String>> {
    change_moderator(
        ctx,
        requester,
        targets,
        true,
        MessageKey::MadeUserMod,
        MessageKey::MakeModFail,
    )
    .await
}

pub async fn revoke_moderator(
    ctx: &CommandContext<'_>,
    requester: UserId,
    targets: &[UserId],
) -> Result<Option<String>> {
    change_moderator(
        ctx,
        requester,
        targets,
        false,
        MessageKey::RemovedUserMod,
        MessageKey::RemoveModFail,
    )
    .await
}

async fn change_moderator(
    ctx: &CommandContext<'_>,
    requester: UserId,
    targets: &[UserId],
    is_moderator: bool,
    ok: MessageKey,
    fail: MessageKey,
) -> Result<Option<String>> {
    match ctx.is_authorized(requester).await {
        Ok(true) => {}
        Ok(false) => return Ok(ctx.reply(MessageKey::NoPrivileges)),
        Err(e) => {
            warn!(requester = requester.0, error = %e, "privilege lookup failed");
            return Ok(ctx.reply(fail));
        }
    }
    if targets.is_empty() {
        return Ok(ctx.reply(fail));
    }

    let outcome = apply_moderator_flag(ctx.users, targets, is_moderator).await;
    match outcome.failure {
        None => {
            info!(
                requester = requester.0,
                applied = outcome.applied,
                is_moderator,
                "moderator flag updated"
            );
            Ok(ctx.reply(ok))
        }
        Some((target, e)) => {
            warn!(
                requester = requester.0,
                target = target.0,
                applied = outcome.applied,
                error = %e,
                "moderator flag update failed"
            );
            Ok(ctx.reply(fail))
        }
    }
}
