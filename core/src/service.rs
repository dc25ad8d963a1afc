use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::{Result, SproutError};
use crate::models::{
    ActivityKind, BabyProfile, Food, FoodStatus, NewBabyProfile, Owner, ProgressSnapshot, Recipe,
    RecipeStatus, Tip, ToggleOutcome, UserProgress, validate_profile,
};
use crate::progress::{
    ProgressStats, compute_streaks, count_in_window, evaluate_achievements, map_level,
};

/// Everything the progress screen needs from one recompute pass.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub progress: UserProgress,
    pub foods_introduced: i64,
    pub recipes_tried: i64,
    pub weekly_activity: i64,
    pub monthly_activity: i64,
    /// Achievement ids unlocked by this recompute, for notification.
    pub newly_unlocked: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<BabyProfile>,
    pub total_foods: i64,
    pub introduced_foods: i64,
    pub favorite_recipes: i64,
    pub current_streak: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<Tip>,
}

/// Orchestration layer over the datastore and the progress engine.
///
/// Every owner-scoped method takes the acting [`Owner`] explicitly, and
/// every time-dependent method takes the evaluation instant, so the service
/// itself holds no ambient state beyond the database handle.
pub struct SproutService {
    db: Database,
}

impl SproutService {
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn resolve_owner(&self, name: &str) -> Result<Owner> {
        if name.trim().is_empty() {
            return Err(SproutError::Unauthenticated);
        }
        self.db.get_or_create_owner(name.trim())
    }

    // --- Baby profile ---

    pub fn save_profile(
        &self,
        owner: &Owner,
        profile: &NewBabyProfile,
        today: NaiveDate,
    ) -> Result<BabyProfile> {
        validate_profile(profile, today)?;
        self.db.upsert_profile(owner.id, profile)
    }

    pub fn get_profile(&self, owner: &Owner) -> Result<Option<BabyProfile>> {
        self.db.get_profile(owner.id)
    }

    // --- Catalog browsing ---

    pub fn list_foods(
        &self,
        owner: &Owner,
        search: Option<&str>,
        category: Option<&str>,
        introduced_only: bool,
    ) -> Result<Vec<FoodStatus>> {
        self.db
            .list_foods(owner.id, search, category, introduced_only)
    }

    pub fn list_recipes(
        &self,
        owner: &Owner,
        search: Option<&str>,
        favorites_only: bool,
    ) -> Result<Vec<RecipeStatus>> {
        self.db.list_recipes(owner.id, search, favorites_only)
    }

    // --- Toggles ---

    /// Toggle the introduced state of a food. Requires an existing baby
    /// profile; without one nothing is written and `PreconditionMissing`
    /// is returned. The add arm appends a `food_introduced` activity.
    pub fn toggle_food_introduction(
        &self,
        owner: &Owner,
        food_name: &str,
        introduced_date: NaiveDate,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(Food, ToggleOutcome)> {
        let food = self
            .db
            .get_food_by_name(food_name)?
            .ok_or_else(|| SproutError::not_found("food", food_name))?;
        let profile = self.db.get_profile(owner.id)?.ok_or_else(|| {
            SproutError::precondition(
                "Create a baby profile first (`sprout profile set`) before tracking introductions",
            )
        })?;

        let outcome =
            self.db
                .toggle_introduced_food(owner.id, profile.id, food.id, introduced_date, notes)?;
        if outcome.active {
            self.db
                .record_activity(owner.id, ActivityKind::FoodIntroduced, now)?;
        }
        Ok((food, outcome))
    }

    /// Toggle a recipe favorite. No profile required. The add arm appends a
    /// `recipe_favorited` activity.
    pub fn toggle_recipe_favorite(
        &self,
        owner: &Owner,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<(Recipe, ToggleOutcome)> {
        let recipe = self
            .db
            .get_recipe_by_title(title)?
            .ok_or_else(|| SproutError::not_found("recipe", title))?;

        let outcome = self.db.toggle_recipe_favorite(owner.id, recipe.id)?;
        if outcome.active {
            self.db
                .record_activity(owner.id, ActivityKind::RecipeFavorited, now)?;
        }
        Ok((recipe, outcome))
    }

    /// Mark a recipe as tried. Only the first transition to tried appends a
    /// `recipe_tried` activity; repeating the command is a no-op.
    pub fn mark_recipe_tried(
        &self,
        owner: &Owner,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<(Recipe, bool)> {
        let recipe = self
            .db
            .get_recipe_by_title(title)?
            .ok_or_else(|| SproutError::not_found("recipe", title))?;

        let newly_tried = self.db.set_recipe_tried(owner.id, recipe.id, true)?;
        if newly_tried {
            self.db
                .record_activity(owner.id, ActivityKind::RecipeTried, now)?;
        }
        Ok((recipe, newly_tried))
    }

    // --- Progress ---

    /// Recompute the full progress picture from raw rows and persist the
    /// derived cache. Monotonic fields are merged against the stored row:
    /// the longest streak never decreases and the achievement set never
    /// loses a member.
    pub fn recompute_progress(&self, owner: &Owner, now: DateTime<Utc>) -> Result<ProgressReport> {
        let today = now.date_naive();
        let activities = self.db.list_activities(owner.id)?;
        let foods_introduced = self.db.count_introduced_foods(owner.id)?;
        let recipes_tried = self.db.count_recipes_tried(owner.id)?;
        let stored = self.db.get_progress(owner.id)?;

        let timestamps: Vec<DateTime<Utc>> = activities.iter().map(|a| a.timestamp).collect();
        let dates: Vec<NaiveDate> = timestamps.iter().map(DateTime::date_naive).collect();

        let streaks = compute_streaks(&dates, today);
        let longest_streak = stored
            .as_ref()
            .map_or(streaks.longest, |p| p.longest_streak.max(streaks.longest));

        let total_points: i64 = activities.iter().map(|a| a.kind.points()).sum();
        let level = map_level(total_points);

        let stats = ProgressStats {
            foods_introduced,
            recipes_tried,
            current_streak: streaks.current,
            longest_streak,
        };
        let already = stored.as_ref().map(|p| p.achievements.as_slice()).unwrap_or(&[]);
        let update = evaluate_achievements(&stats, already);

        let snapshot = ProgressSnapshot {
            total_points,
            current_streak: streaks.current,
            longest_streak,
            last_activity_date: dates.iter().max().copied(),
            level_progress: level.progress_percent,
            feeding_level: level.label.to_string(),
            achievements: update.unlocked,
        };
        let progress = self.db.upsert_progress(owner.id, &snapshot)?;

        let weekly_activity = count_in_window(&timestamps, now, 7) as i64;
        let monthly_activity = count_in_window(&timestamps, now, 30) as i64;

        Ok(ProgressReport {
            progress,
            foods_introduced,
            recipes_tried,
            weekly_activity,
            monthly_activity,
            newly_unlocked: update.newly_unlocked,
        })
    }

    // --- Dashboard / tips ---

    pub fn dashboard(&self, owner: &Owner) -> Result<Dashboard> {
        let profile = self.db.get_profile(owner.id)?;
        // Missing progress row means "start from zero", not an error.
        let current_streak = self
            .db
            .get_progress(owner.id)?
            .map_or(0, |p| p.current_streak);
        Ok(Dashboard {
            profile,
            total_foods: self.db.count_foods()?,
            introduced_foods: self.db.count_introduced_foods(owner.id)?,
            favorite_recipes: self.db.count_favorites(owner.id)?,
            current_streak,
            tip: self.db.random_tip()?,
        })
    }

    pub fn random_tip(&self) -> Result<Option<Tip>> {
        self.db.random_tip()
    }
}
