mod food;
mod helpers;
mod home;
mod import;
mod profile;
mod progress;
mod recipe;
mod tip;
mod user;

use anyhow::{Result, bail};

use crate::config::Config;
use sprout_core::models::Owner;
use sprout_core::service::SproutService;

pub(crate) use food::{cmd_food_introduce, cmd_food_list};
pub(crate) use home::cmd_home;
pub(crate) use import::cmd_import;
pub(crate) use profile::{ProfileArgs, cmd_profile_set, cmd_profile_show};
pub(crate) use progress::cmd_progress;
pub(crate) use recipe::{cmd_recipe_favorite, cmd_recipe_list, cmd_recipe_show, cmd_recipe_tried};
pub(crate) use tip::cmd_tip;
pub(crate) use user::{cmd_user_set, cmd_user_show};

/// Resolve the acting owner: `--user` beats the configured user, and a
/// missing user is an error telling the reader how to pick one.
pub(super) fn acting_owner(
    service: &SproutService,
    config: &Config,
    user_flag: Option<&str>,
) -> Result<Owner> {
    let name = match user_flag {
        Some(name) => name.to_string(),
        None => match config.current_user()? {
            Some(name) => name,
            None => bail!("No user selected. Run `sprout user set <name>` or pass --user <name>"),
        },
    };
    Ok(service.resolve_owner(&name)?)
}
