use anyhow::Result;

use crate::config::Config;
use sprout_core::service::SproutService;

pub(crate) fn cmd_user_set(
    service: &SproutService,
    config: &Config,
    name: &str,
    json: bool,
) -> Result<()> {
    let owner = service.resolve_owner(name)?;
    config.set_current_user(&owner.name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&owner)?);
    } else {
        let name = &owner.name;
        println!("Acting as {name}");
    }
    Ok(())
}

pub(crate) fn cmd_user_show(config: &Config, json: bool) -> Result<()> {
    let current = config.current_user()?;

    if json {
        println!("{}", serde_json::json!({ "user": current }));
    } else {
        match current {
            Some(name) => println!("{name}"),
            None => eprintln!("No user selected. Run `sprout user set <name>`"),
        }
    }
    Ok(())
}
