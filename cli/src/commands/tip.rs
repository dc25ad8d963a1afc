use anyhow::Result;

use sprout_core::service::SproutService;

pub(crate) fn cmd_tip(service: &SproutService, json: bool) -> Result<()> {
    let tip = service.random_tip()?;

    match tip {
        Some(tip) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tip)?);
            } else {
                println!("{}", tip.title);
                println!("  {}", tip.description);
                if let Some(ref range) = tip.age_range {
                    println!("  ({range})");
                }
            }
        }
        None => {
            if json {
                println!("{}", serde_json::json!({ "error": "No tips loaded" }));
            } else {
                eprintln!("No tips loaded. Seed them with `sprout import <catalog.json>`");
            }
        }
    }
    Ok(())
}
