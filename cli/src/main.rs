mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_food_introduce, cmd_food_list, cmd_home, cmd_import, cmd_profile_set, cmd_profile_show,
    cmd_progress, cmd_recipe_favorite, cmd_recipe_list, cmd_recipe_show, cmd_recipe_tried,
    cmd_tip, cmd_user_set, cmd_user_show,
};
use crate::config::Config;
use sprout_core::service::SproutService;

#[derive(Parser)]
#[command(
    name = "sprout",
    version,
    about = "A local-first baby food-introduction tracker CLI",
    long_about = "\n\n  ███████╗██████╗ ██████╗  ██████╗ ██╗   ██╗████████╗
  ██╔════╝██╔══██╗██╔══██╗██╔═══██╗██║   ██║╚══██╔══╝
  ███████╗██████╔╝██████╔╝██║   ██║██║   ██║   ██║
  ╚════██║██╔═══╝ ██╔══██╗██║   ██║██║   ██║   ██║
  ███████║██║     ██║  ██║╚██████╔╝╚██████╔╝   ██║
  ╚══════╝╚═╝     ╚═╝  ╚═╝ ╚═════╝  ╚═════╝    ╚═╝
        first foods, one bite at a time.
"
)]
struct Cli {
    /// Act as this user for one invocation (overrides `sprout user set`)
    #[arg(long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the home dashboard (profile, counts, streak, a tip)
    Home {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Select or show the acting user
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage the baby profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Browse foods and track introductions
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Browse recipes, favorites, and tried recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Recompute and show feeding progress, level, and achievements
    Progress {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a random feeding tip
    Tip {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a JSON catalog of foods, recipes, and tips
    Import {
        /// Path to the catalog file
        file: std::path::PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Set the acting user for future invocations
    Set {
        /// User name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the currently configured user
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Create or replace the baby profile
    Set {
        /// Baby's name
        name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: String,
        /// Current weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Feeding type: breastfed, formula, mixed, solids
        #[arg(long)]
        feeding_type: Option<String>,
        /// Known allergy (repeatable)
        #[arg(long = "allergy")]
        allergies: Vec<String>,
        /// Medical condition (repeatable)
        #[arg(long = "condition")]
        medical_conditions: Vec<String>,
        /// Dietary restriction (repeatable)
        #[arg(long = "restriction")]
        dietary_restrictions: Vec<String>,
        /// Feeding goal (repeatable)
        #[arg(long = "goal")]
        feeding_goals: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the baby profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List the food catalog with introduction status
    List {
        /// Filter by name substring
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by food type (e.g. Fruit, Vegetable, Protein)
        #[arg(short, long)]
        category: Option<String>,
        /// Only show introduced foods
        #[arg(long)]
        introduced: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a food's introduced state (requires a baby profile)
    Introduce {
        /// Food name
        name: String,
        /// Introduction date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Notes on how it went
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// List the recipe catalog with favorite/tried status
    List {
        /// Filter by title substring
        #[arg(short, long)]
        search: Option<String>,
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe's ingredients and method
    Show {
        /// Recipe title
        title: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a recipe as favorite
    Favorite {
        /// Recipe title
        title: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a recipe as tried
    Tried {
        /// Recipe title
        title: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let service = SproutService::open(&config.db_path)?;
    let user = cli.user;

    match cli.command {
        Commands::Home { json } => cmd_home(&service, &config, user.as_deref(), json),
        Commands::User { command } => match command {
            UserCommands::Set { name, json } => cmd_user_set(&service, &config, &name, json),
            UserCommands::Show { json } => cmd_user_show(&config, json),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                name,
                birth_date,
                weight,
                feeding_type,
                allergies,
                medical_conditions,
                dietary_restrictions,
                feeding_goals,
                json,
            } => cmd_profile_set(
                &service,
                &config,
                user.as_deref(),
                commands::ProfileArgs {
                    name,
                    birth_date,
                    weight,
                    feeding_type,
                    allergies,
                    medical_conditions,
                    dietary_restrictions,
                    feeding_goals,
                },
                json,
            ),
            ProfileCommands::Show { json } => {
                cmd_profile_show(&service, &config, user.as_deref(), json)
            }
        },
        Commands::Food { command } => match command {
            FoodCommands::List {
                search,
                category,
                introduced,
                json,
            } => cmd_food_list(
                &service,
                &config,
                user.as_deref(),
                search.as_deref(),
                category.as_deref(),
                introduced,
                json,
            ),
            FoodCommands::Introduce {
                name,
                date,
                notes,
                json,
            } => cmd_food_introduce(
                &service,
                &config,
                user.as_deref(),
                &name,
                date,
                notes.as_deref(),
                json,
            ),
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::List {
                search,
                favorites,
                json,
            } => cmd_recipe_list(
                &service,
                &config,
                user.as_deref(),
                search.as_deref(),
                favorites,
                json,
            ),
            RecipeCommands::Show { title, json } => {
                cmd_recipe_show(&service, &config, user.as_deref(), &title, json)
            }
            RecipeCommands::Favorite { title, json } => {
                cmd_recipe_favorite(&service, &config, user.as_deref(), &title, json)
            }
            RecipeCommands::Tried { title, json } => {
                cmd_recipe_tried(&service, &config, user.as_deref(), &title, json)
            }
        },
        Commands::Progress { json } => cmd_progress(&service, &config, user.as_deref(), json),
        Commands::Tip { json } => cmd_tip(&service, json),
        Commands::Import { file, json } => cmd_import(&service, &file, json),
    }
}
